//! One function per subcommand, each returning the `data` of its envelope

mod agent;
mod market;
mod matches;
mod play;
mod tournament;

use std::str::FromStr;
use std::sync::Arc;

use arena_core::units::{format_native, parse_native};
use arena_core::{Address, GameType, U256};
use arena_host::{ArenaClient, ArenaError, Config};
use serde_json::{json, Value};

use crate::cli::Command;

pub(crate) async fn dispatch(command: Command, config: &Config) -> Result<Value, ArenaError> {
    let client = ArenaClient::from_config(config)?;
    match command {
        Command::Status { address } => agent::status(&client, config, address.as_deref()).await,
        Command::Register { games, min_wager, max_wager } => {
            agent::register(&client, &games, &min_wager, &max_wager).await
        }
        Command::FindOpponents { game } => agent::find_opponents(&client, &game).await,
        Command::Recommend { opponent, game } => agent::recommend(&client, &opponent, &game).await,
        Command::Challenge { opponent, wager, game } => matches::challenge(&client, &opponent, &wager, &game).await,
        Command::Accept { match_id } => matches::accept(&client, match_id).await,
        Command::Pending { lookback } => matches::pending(&client, lookback).await,
        Command::FindGame { match_id } => matches::find_game(&client, match_id).await,
        Command::ClaimTimeout { match_id, game_id } => matches::claim_timeout(&client, match_id, game_id).await,
        Command::Play(args) => play::play(Arc::new(client), config, args, false).await,
        Command::Respond(args) => play::play(Arc::new(client), config, args, true).await,
        Command::MarketCreate { match_id, seed } => market::create(&client, match_id, &seed).await,
        Command::MarketStatus { market_id } => market::status(&client, market_id).await,
        Command::MarketBet { market_id, side, amount } => market::bet(&client, market_id, side, &amount).await,
        Command::MarketResolve { market_id } => market::resolve(&client, market_id).await,
        Command::MarketRedeem { market_id } => market::redeem(&client, market_id).await,
        Command::Tournaments { all } => tournament::list(&client, all).await,
        Command::TournamentCreate { format, entry_fee, base_wager, max_players } => {
            tournament::create(&client, &format, &entry_fee, &base_wager, max_players).await
        }
        Command::TournamentJoin { tournament_id } => tournament::join(&client, tournament_id).await,
        Command::TournamentStatus { tournament_id } => tournament::status(&client, tournament_id).await,
    }
}

fn parse_address(s: &str) -> Result<Address, ArenaError> {
    Address::from_str(s.trim()).map_err(|_| ArenaError::InvalidArgument(format!("not an address: {}", s)))
}

fn parse_game(s: &str) -> Result<GameType, ArenaError> {
    Ok(s.parse::<GameType>()?)
}

/// Native-unit amount that must be greater than zero
fn parse_positive(s: &str, what: &str) -> Result<U256, ArenaError> {
    let amount = parse_native(s)?;
    if amount.is_zero() {
        return Err(ArenaError::InvalidAmount(format!("{} must be greater than zero", what)));
    }
    Ok(amount)
}

/// Amounts are reported in native units, as decimal strings
fn amount(wei: U256) -> Value {
    json!(format_native(wei))
}

fn tx(outcome: &arena_host::TxOutcome) -> Value {
    json!(outcome.hash_hex())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_errors_use_stable_codes() {
        assert_eq!(parse_address("0x12").unwrap_err().code(), "INVALID_ARGUMENT");
        assert_eq!(parse_game("chess").unwrap_err().code(), "INVALID_GAME_TYPE");
        assert_eq!(parse_positive("0", "wager").unwrap_err().code(), "INVALID_AMOUNT");
        assert_eq!(parse_positive("abc", "wager").unwrap_err().code(), "INVALID_AMOUNT");
        assert_eq!(parse_positive("0.5", "wager").unwrap(), U256::from(5u64) * U256::from(10u64).pow(U256::from(17u64)));
    }

    #[test]
    fn test_amount_is_native_units() {
        assert_eq!(amount(U256::from(10u64).pow(U256::from(18u64))), json!("1"));
    }
}
