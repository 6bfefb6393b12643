//! Command-line surface

use arena_host::contracts::DEFAULT_PENDING_LOOKBACK;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "arena-tools", author, version, about = "Gaming Arena agent tools")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Wallet balance, registration and ELO
    Status {
        /// Inspect another address instead of the local wallet
        #[arg(long)]
        address: Option<String>,
    },
    /// Register in the AgentRegistry
    Register {
        #[arg(long, value_delimiter = ',', default_value = "rps,poker,auction")]
        games: Vec<String>,
        #[arg(long, default_value = "0.001")]
        min_wager: String,
        #[arg(long, default_value = "1")]
        max_wager: String,
    },
    /// Open agents for a game type
    FindOpponents {
        #[arg(long, default_value = "rps")]
        game: String,
    },
    /// Open an escrowed challenge against another agent
    Challenge {
        opponent: String,
        /// Wager in native units, e.g. 0.01
        wager: String,
        #[arg(long, default_value = "rps")]
        game: String,
    },
    /// Accept a challenge, escrowing the matching wager
    Accept { match_id: u64 },
    /// Accept a challenge if needed, then play it to settlement
    Respond(PlayArgs),
    /// Play an accepted match to settlement
    Play(PlayArgs),
    /// Challenges waiting for the local wallet to accept
    Pending {
        #[arg(long, default_value_t = DEFAULT_PENDING_LOOKBACK)]
        lookback: u64,
    },
    /// Game id linked to a match
    FindGame { match_id: u64 },
    /// Claim a stalled game on timeout
    ClaimTimeout {
        match_id: u64,
        #[arg(long)]
        game_id: Option<u64>,
    },
    /// Half-Kelly wager against an opponent
    Recommend {
        opponent: String,
        #[arg(long, default_value = "rps")]
        game: String,
    },
    /// Open a prediction market on a match
    MarketCreate {
        match_id: u64,
        /// Seed liquidity in native units
        seed: String,
    },
    /// Market reserves, prices and ELO edge
    MarketStatus { market_id: u64 },
    /// Buy YES (player 1 wins) or NO shares
    MarketBet {
        market_id: u64,
        #[arg(value_enum)]
        side: BetSide,
        amount: String,
    },
    MarketResolve { market_id: u64 },
    MarketRedeem { market_id: u64 },
    /// List tournaments
    Tournaments {
        /// Include finished and cancelled tournaments
        #[arg(long)]
        all: bool,
    },
    TournamentCreate {
        #[arg(long, default_value = "round-robin")]
        format: String,
        #[arg(long)]
        entry_fee: String,
        #[arg(long)]
        base_wager: String,
        #[arg(long, default_value_t = 4)]
        max_players: u8,
    },
    /// Register for a tournament, paying its entry fee
    TournamentJoin { tournament_id: u64 },
    /// Tournament details, participants and round-robin standings
    TournamentStatus { tournament_id: u64 },
}

/// Options shared by `play` and `respond`
#[derive(Args, Debug, Clone)]
pub(crate) struct PlayArgs {
    pub(crate) match_id: u64,
    /// RPS move or strategy: rock, paper, scissors, random, frequency,
    /// markov, sequence, adaptive
    #[arg(long = "move", default_value = "adaptive")]
    pub(crate) strategy: String,
    /// Poker hand value, 1-100
    #[arg(long)]
    pub(crate) hand: Option<u8>,
    /// Auction bid in native units, at most the wager
    #[arg(long)]
    pub(crate) bid: Option<String>,
    /// Rounds when this side creates an RPS game
    #[arg(long, default_value_t = 3)]
    pub(crate) rounds: u64,
    /// Seconds before giving up
    #[arg(long, default_value_t = 600)]
    pub(crate) timeout: u64,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BetSide {
    Yes,
    No,
}
