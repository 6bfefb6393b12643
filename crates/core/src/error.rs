//! Error types for the pure domain layer

use thiserror::Error;

/// Failure to interpret a user-supplied name or an on-chain discriminant
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown game type: {0} (expected rps, poker or auction)")]
    GameType(String),
    #[error("unknown move: {0} (expected rock, paper or scissors)")]
    Move(String),
    #[error("unknown tournament format: {0} (expected round-robin or double-elim)")]
    TournamentFormat(String),
    #[error("unknown {kind} value: {value}")]
    Discriminant { kind: &'static str, value: u8 },
}

/// ABI decoding failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("return data too short: need {need} bytes, got {got}")]
    TooShort { need: usize, got: usize },
    #[error("value in word {index} does not fit in {ty}")]
    Overflow { index: usize, ty: &'static str },
    #[error("invalid dynamic offset {offset}")]
    InvalidOffset { offset: usize },
    #[error(transparent)]
    Discriminant(#[from] ParseError),
}

/// Failure to parse a native-unit amount such as `"1.5"`
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnitsError {
    #[error("empty amount")]
    Empty,
    #[error("invalid amount: {0}")]
    Invalid(String),
    #[error("amount has more than {0} decimal places")]
    TooManyDecimals(usize),
    #[error("amount overflows 256 bits")]
    Overflow,
}
