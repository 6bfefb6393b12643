//! arena core domain logic
//!
//! Pure, I/O-free building blocks shared by the contract bindings and the
//! host client:
//! - game and phase enums mirroring the arena contracts
//! - commit-reveal hashing in the contracts' packed wire format
//! - a small ABI word codec
//! - RPS round rules, native unit parsing, ELO and Kelly math

pub mod abi;
pub mod commit;
pub mod error;
pub mod rating;
pub mod rules;
pub mod types;
pub mod units;

pub use commit::{commit_bid_hash, commit_hash, generate_salt, CommittedValue};
pub use error::{AbiError, ParseError, UnitsError};
pub use rules::{round_winner, RoundOutcome, Tally};
pub use types::*;
