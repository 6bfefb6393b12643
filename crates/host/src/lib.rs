//! Host-side client for the arena contracts
//!
//! JSON-RPC transport, transaction submission, the local commitment store
//! and the per-game phase drivers that play a match to settlement.

pub mod cache;
pub mod config;
pub mod contracts;
pub mod error;
pub mod game;
pub mod opponents;
pub mod output;
pub mod rpc;
pub mod signer;
pub mod store;
pub mod strategy;
pub mod submitter;

#[cfg(any(test, feature = "mocks"))]
pub mod mock;

pub use config::Config;
pub use contracts::{ArenaClient, Opponent};
pub use error::ArenaError;
pub use game::{AuctionDriver, PlayConfig, PlaySummary, PokerDriver, RpsDriver};
pub use opponents::{OpponentBook, OpponentProfile};
pub use output::{Envelope, EventSink, ProgressEvent, StdoutSink};
pub use rpc::{ChainRpc, HttpRpc};
pub use store::{CommitmentKey, CommitmentStore};
pub use submitter::{SubmitPolicy, TxOutcome, TxSubmitter};
