//! Client error taxonomy
//!
//! Every failure a command can report maps to one variant with a stable
//! machine-readable code.

use arena_core::{AbiError, ParseError, UnitsError, U256};
use thiserror::Error;

use crate::rpc::RpcError;

/// Client error
#[derive(Debug, Error)]
pub enum ArenaError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("{0}")]
    InvalidGameType(String),
    #[error("{0}")]
    InvalidMove(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("bid {bid} exceeds wager {wager}")]
    BidExceedsWager { bid: String, wager: String },

    #[error("no private key: set PRIVATE_KEY, DEPLOYER_PRIVATE_KEY or WALLET_PRIVATE_KEY")]
    MissingPrivateKey,
    #[error("contract address not configured: set {0}")]
    MissingContractAddress(&'static str),

    #[error("transaction {hash} reverted")]
    TxReverted { hash: String },
    #[error("call reverted: {0}")]
    CallReverted(String),

    #[error("transaction {hash} not mined within {seconds}s")]
    TxTimeout { hash: String, seconds: u64 },
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("local commitment {key} does not match the on-chain commit")]
    CommitMismatch { key: String },
    #[error("no local commitment for {key}; cannot reveal")]
    MissingCommitment { key: String },
    #[error("{0}")]
    GameNotFound(String),
    #[error("{who} is not a participant of {what}")]
    NotAParticipant { who: String, what: String },
    #[error("{0}")]
    InvalidMatchState(String),
    #[error("game did not settle within {seconds}s")]
    PlayTimeout { seconds: u64 },

    #[error("commitment store: {0}")]
    Store(String),
    #[error("decode: {0}")]
    Decode(String),
}

impl ArenaError {
    /// Stable code printed in the error envelope
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::InvalidGameType(_) => "INVALID_GAME_TYPE",
            Self::InvalidMove(_) => "INVALID_MOVE",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::BidExceedsWager { .. } => "BID_EXCEEDS_WAGER",
            Self::MissingPrivateKey => "MISSING_PRIVATE_KEY",
            Self::MissingContractAddress(_) => "MISSING_CONTRACT_ADDRESS",
            Self::TxReverted { .. } => "TX_REVERTED",
            Self::CallReverted(_) => "CALL_REVERTED",
            Self::TxTimeout { .. } => "TX_TIMEOUT",
            Self::RateLimited(_) => "RATE_LIMITED",
            Self::Rpc(_) => "RPC_ERROR",
            Self::CommitMismatch { .. } => "COMMIT_MISMATCH",
            Self::MissingCommitment { .. } => "MISSING_COMMITMENT",
            Self::GameNotFound(_) => "GAME_NOT_FOUND",
            Self::NotAParticipant { .. } => "NOT_A_PARTICIPANT",
            Self::InvalidMatchState(_) => "INVALID_MATCH_STATE",
            Self::PlayTimeout { .. } => "PLAY_TIMEOUT",
            Self::Store(_) => "STORE_ERROR",
            Self::Decode(_) => "DECODE_ERROR",
        }
    }

    /// Infrastructure failures a polling loop may retry on its next tick
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::TxTimeout { .. } | Self::Rpc(_))
    }

    pub(crate) fn bid_exceeds_wager(bid: U256, wager: U256) -> Self {
        Self::BidExceedsWager {
            bid: arena_core::units::format_native(bid),
            wager: arena_core::units::format_native(wager),
        }
    }
}

impl From<RpcError> for ArenaError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::RateLimited(msg) => Self::RateLimited(msg),
            RpcError::Reverted(reason) => Self::CallReverted(reason),
            RpcError::Transport(msg) => Self::Rpc(msg),
            RpcError::Response { code, message } => Self::Rpc(format!("{} (code {})", message, code)),
            RpcError::Malformed(msg) => Self::Decode(msg),
        }
    }
}

impl From<AbiError> for ArenaError {
    fn from(err: AbiError) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<ParseError> for ArenaError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::GameType(_) => Self::InvalidGameType(err.to_string()),
            ParseError::Move(_) => Self::InvalidMove(err.to_string()),
            ParseError::TournamentFormat(_) => Self::InvalidArgument(err.to_string()),
            ParseError::Discriminant { .. } => Self::Decode(err.to_string()),
        }
    }
}

impl From<UnitsError> for ArenaError {
    fn from(err: UnitsError) -> Self {
        Self::InvalidAmount(err.to_string())
    }
}
