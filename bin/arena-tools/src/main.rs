//! arena-tools binary
//!
//! Logs go to stderr; stdout carries only JSON so an automated caller can
//! parse it line by line.

mod cli;
mod commands;

use std::process::ExitCode;

use anyhow::{Context, Result};
use arena_host::{Config, Envelope};
use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::cli::Cli;

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).with_writer(std::io::stderr).finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to install tracing subscriber")
}

fn run(cli: Cli) -> Result<Envelope> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;
    let config = Config::from_env();
    let envelope = match runtime.block_on(commands::dispatch(cli.command, &config)) {
        Ok(data) => Envelope::success(data),
        Err(e) => Envelope::from(&e),
    };
    Ok(envelope)
}

fn main() -> ExitCode {
    if let Err(e) = init_tracing() {
        eprintln!("{:#}", e);
    }

    let envelope = match Cli::try_parse() {
        Ok(cli) => run(cli).unwrap_or_else(|e| Envelope::failure("RPC_ERROR", format!("{:#}", e))),
        Err(e)
            if matches!(
                e.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ) =>
        {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => Envelope::failure("INVALID_ARGUMENT", e.render().to_string().trim()),
    };

    println!("{}", envelope.to_json());
    ExitCode::from(envelope.exit_code() as u8)
}
