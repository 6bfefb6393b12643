//! Game phase state machines
//!
//! One driver per game type. Each poll reads the game from the chain,
//! decides what the local player owes for the current phase and submits it.
//! Phase is never inferred locally; the only local state is the commitment
//! store and a per-run record of actions already taken.

pub mod auction;
pub mod poker;
pub mod rps;
#[cfg(test)]
mod sim;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use arena_core::{Address, CommittedValue, GameType, Hash, Seat};
use async_trait::async_trait;
use serde::Serialize;
use tokio::time::{sleep_until, timeout_at, Instant};
use tracing::{info, warn};

use crate::error::ArenaError;
use crate::output::{EventSink, ProgressEvent, RoundResult};
use crate::store::{CommitmentKey, CommitmentRecord, CommitmentStore};
use crate::submitter::TxOutcome;

pub use auction::{AuctionContract, AuctionDriver};
pub use poker::{PokerContract, PokerDriver};
pub use rps::{RpsContract, RpsDriver};

/// Polling cadence and overall deadline for one play run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayConfig {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for PlayConfig {
    fn default() -> Self {
        Self { poll_interval: Duration::from_secs(3), timeout: Duration::from_secs(600) }
    }
}

/// Chain access shared by every game driver
#[async_trait]
pub trait GameSession: Send + Sync {
    /// Address of the local player
    fn player(&self) -> Result<Address, ArenaError>;

    /// Latest block timestamp
    async fn chain_time(&self) -> Result<u64, ArenaError>;

    async fn claim_timeout(&self, game_type: GameType, game_id: u64) -> Result<TxOutcome, ArenaError>;
}

/// Result of one poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick<S> {
    Done(S),
    Pending,
}

/// One game's per-poll decision logic
#[async_trait]
pub trait PhaseDriver: Send {
    type Summary: Send;

    async fn tick(&mut self) -> Result<Tick<Self::Summary>, ArenaError>;
}

/// Poll `driver` until it settles or `config.timeout` passes
///
/// Infrastructure errors are logged and retried on the next poll. Anything
/// else aborts the run. A poll still running at the deadline is dropped and
/// no new poll starts after it; commitments are saved before broadcast, so
/// a dropped poll loses nothing a later run needs.
pub async fn drive<D: PhaseDriver>(driver: &mut D, config: &PlayConfig) -> Result<D::Summary, ArenaError> {
    let deadline = Instant::now() + config.timeout;
    let timed_out = || ArenaError::PlayTimeout { seconds: config.timeout.as_secs() };
    loop {
        match timeout_at(deadline, driver.tick()).await {
            Ok(Ok(Tick::Done(summary))) => return Ok(summary),
            Ok(Ok(Tick::Pending)) => {}
            Ok(Err(e)) if e.is_retryable() => warn!("Poll failed, retrying: {}", e),
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(timed_out()),
        }

        if Instant::now() >= deadline {
            return Err(timed_out());
        }
        sleep_until((Instant::now() + config.poll_interval).min(deadline)).await;
        if Instant::now() >= deadline {
            return Err(timed_out());
        }
    }
}

/// One revealed RPS round, from the local player's side
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundReport {
    pub round: u64,
    pub my_move: arena_core::Move,
    pub opponent_move: arena_core::Move,
    pub result: RoundResult,
}

/// Final report of a play run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaySummary {
    pub game_type: GameType,
    pub game_id: u64,
    pub match_id: u64,
    pub seat: Seat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_score: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent_score: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rounds: Vec<RoundReport>,
    /// Revealed hand or bid, ours then theirs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent_value: Option<String>,
    pub timeout_claimed: bool,
    pub transactions: Vec<String>,
    /// Escrow winner, filled in by the caller once settled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Address>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Stage {
    Commit,
    Reveal,
    Claim,
}

/// State every driver carries through a run
pub(crate) struct Session<C: ?Sized> {
    pub(crate) contract: Arc<C>,
    pub(crate) store: CommitmentStore,
    pub(crate) events: Arc<dyn EventSink>,
    pub(crate) game_type: GameType,
    pub(crate) game_id: u64,
    pub(crate) player: Address,
    acted: HashSet<(u64, Stage)>,
    last_phase: Option<(String, u64)>,
    pub(crate) transactions: Vec<String>,
    pub(crate) timeout_claimed: bool,
}

impl<C: ?Sized> std::fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("game_type", &self.game_type)
            .field("game_id", &self.game_id)
            .field("player", &self.player)
            .field("transactions", &self.transactions.len())
            .finish_non_exhaustive()
    }
}

impl<C: GameSession + ?Sized> Session<C> {
    pub(crate) fn new(
        contract: Arc<C>,
        store: CommitmentStore,
        events: Arc<dyn EventSink>,
        game_type: GameType,
        game_id: u64,
    ) -> Result<Self, ArenaError> {
        let player = contract.player()?;
        Ok(Self {
            contract,
            store,
            events,
            game_type,
            game_id,
            player,
            acted: HashSet::new(),
            last_phase: None,
            transactions: Vec::new(),
            timeout_claimed: false,
        })
    }

    pub(crate) fn key(&self, round: Option<u64>) -> CommitmentKey {
        let key = CommitmentKey::new(self.game_type, self.game_id, self.player);
        match round {
            Some(round) => key.with_round(round),
            None => key,
        }
    }

    pub(crate) fn seat<F>(&self, seat_of: F) -> Result<Seat, ArenaError>
    where
        F: FnOnce(Address) -> Option<Seat>,
    {
        seat_of(self.player).ok_or_else(|| ArenaError::NotAParticipant {
            who: self.player.to_string(),
            what: format!("{} game {}", self.game_type, self.game_id),
        })
    }

    pub(crate) fn acted(&self, round: u64, stage: Stage) -> bool {
        self.acted.contains(&(round, stage))
    }

    /// Remember a confirmed action so a lagging read cannot trigger it again
    pub(crate) fn mark(&mut self, round: u64, stage: Stage, outcome: &TxOutcome) {
        self.acted.insert((round, stage));
        self.transactions.push(outcome.hash_hex());
    }

    /// Emit `phase_changed` when the observed phase moves
    pub(crate) fn observe_phase(&mut self, phase: &str, round: u64) {
        let current = (phase.to_string(), round);
        if self.last_phase.as_ref() == Some(&current) {
            return;
        }
        info!("{} game {}: phase {} (round {})", self.game_type, self.game_id, phase, round);
        let reported_round = (self.game_type == GameType::Rps).then_some(round);
        self.events.emit(ProgressEvent::PhaseChanged {
            game_type: self.game_type,
            game_id: self.game_id,
            phase: phase.to_string(),
            round: reported_round,
        });
        self.last_phase = Some(current);
    }

    /// Record to commit under `round`, saved before anything is broadcast
    ///
    /// A record left by an earlier run whose commit never landed is reused,
    /// so a commit that confirms late still matches the stored salt.
    pub(crate) fn prepare_commit(
        &self,
        round: Option<u64>,
        value: impl FnOnce() -> CommittedValue,
    ) -> Result<CommitmentRecord, ArenaError> {
        let key = self.key(round);
        if let Some(record) = self.store.peek(&key).into_option() {
            info!("Reusing stored commitment {}", key);
            return Ok(record);
        }
        let record = CommitmentRecord { salt: arena_core::generate_salt(), value: value(), game_type: self.game_type };
        self.store.save(&key, record)?;
        Ok(record)
    }

    /// Stored record for a reveal, checked against the on-chain commit
    pub(crate) fn reveal_record(&self, round: Option<u64>, on_chain: Option<Hash>) -> Result<CommitmentRecord, ArenaError> {
        let key = self.key(round);
        let record = self
            .store
            .peek(&key)
            .into_option()
            .ok_or_else(|| ArenaError::MissingCommitment { key: key.to_string() })?;
        match on_chain {
            Some(hash) if hash != record.hash() => Err(ArenaError::CommitMismatch { key: key.to_string() }),
            _ => Ok(record),
        }
    }

    pub(crate) fn wrong_kind(&self, round: Option<u64>) -> ArenaError {
        ArenaError::Store(format!("commitment {} holds a value of the wrong kind", self.key(round)))
    }

    /// Drop the record once its reveal is confirmed or the game has settled
    pub(crate) fn consume(&self, round: Option<u64>) {
        let _ = self.store.load(&self.key(round));
    }

    pub(crate) fn committed(&mut self, round: u64, stage_round: Option<u64>, outcome: &TxOutcome) {
        self.mark(round, Stage::Commit, outcome);
        self.events.emit(ProgressEvent::Committed {
            game_type: self.game_type,
            game_id: self.game_id,
            round: stage_round,
            tx: outcome.hash_hex(),
        });
    }

    pub(crate) fn revealed(&mut self, round: u64, stage_round: Option<u64>, value: String, outcome: &TxOutcome) {
        self.consume(stage_round);
        self.mark(round, Stage::Reveal, outcome);
        self.events.emit(ProgressEvent::Revealed {
            game_type: self.game_type,
            game_id: self.game_id,
            round: stage_round,
            value,
            tx: outcome.hash_hex(),
        });
    }

    /// Claim the timeout once per round; a reverted claim is logged and skipped
    pub(crate) async fn claim(&mut self, round: u64) -> Result<(), ArenaError> {
        if self.acted(round, Stage::Claim) {
            return Ok(());
        }
        info!("{} game {}: opponent missed the deadline, claiming timeout", self.game_type, self.game_id);
        match self.contract.claim_timeout(self.game_type, self.game_id).await {
            Ok(outcome) => {
                self.mark(round, Stage::Claim, &outcome);
                self.timeout_claimed = true;
                self.events.emit(ProgressEvent::TimeoutClaimed {
                    game_type: self.game_type,
                    game_id: self.game_id,
                    tx: outcome.hash_hex(),
                });
                Ok(())
            }
            Err(ArenaError::TxReverted { hash }) => {
                warn!("Timeout claim {} reverted, opponent may have acted", hash);
                self.acted.insert((round, Stage::Claim));
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub(crate) fn settled(&self) {
        info!("{} game {} settled", self.game_type, self.game_id);
        self.events.emit(ProgressEvent::Settled { game_type: self.game_type, game_id: self.game_id });
    }

    pub(crate) fn summary(&self, match_id: u64, seat: Seat) -> PlaySummary {
        PlaySummary {
            game_type: self.game_type,
            game_id: self.game_id,
            match_id,
            seat,
            my_score: None,
            opponent_score: None,
            rounds: Vec::new(),
            my_value: None,
            opponent_value: None,
            timeout_claimed: self.timeout_claimed,
            transactions: self.transactions.clone(),
            winner: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Countdown(u32);

    #[async_trait]
    impl PhaseDriver for Countdown {
        type Summary = &'static str;

        async fn tick(&mut self) -> Result<Tick<Self::Summary>, ArenaError> {
            self.0 -= 1;
            match self.0 {
                0 => Ok(Tick::Done("done")),
                2 => Err(ArenaError::RateLimited("429".into())),
                _ => Ok(Tick::Pending),
            }
        }
    }

    struct Broken;

    #[async_trait]
    impl PhaseDriver for Broken {
        type Summary = ();

        async fn tick(&mut self) -> Result<Tick<()>, ArenaError> {
            Err(ArenaError::TxReverted { hash: "0x01".into() })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_drive_retries_infrastructure_errors() {
        let start = Instant::now();
        let summary = drive(&mut Countdown(4), &PlayConfig::default()).await.unwrap();
        assert_eq!(summary, "done");
        assert_eq!(start.elapsed(), Duration::from_secs(9));
    }

    /// Stands in for a poll stuck on backoff and a long confirmation wait
    struct SlowSubmit(Duration);

    #[async_trait]
    impl PhaseDriver for SlowSubmit {
        type Summary = ();

        async fn tick(&mut self) -> Result<Tick<()>, ArenaError> {
            tokio::time::sleep(self.0).await;
            Err(ArenaError::TxTimeout { hash: "0x01".into(), seconds: 60 })
        }
    }

    struct Hung;

    #[async_trait]
    impl PhaseDriver for Hung {
        type Summary = ();

        async fn tick(&mut self) -> Result<Tick<()>, ArenaError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_drive_caps_a_slow_poll_at_the_deadline() {
        let config = PlayConfig { poll_interval: Duration::from_secs(3), timeout: Duration::from_secs(10) };
        let start = Instant::now();
        let err = drive(&mut SlowSubmit(Duration::from_secs(74)), &config).await.unwrap_err();
        assert_eq!(err.code(), "PLAY_TIMEOUT");
        assert!(start.elapsed() <= config.timeout + config.poll_interval);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drive_times_out_a_hung_poll() {
        let config = PlayConfig { poll_interval: Duration::from_secs(3), timeout: Duration::from_secs(10) };
        let start = Instant::now();
        let err = drive(&mut Hung, &config).await.unwrap_err();
        assert_eq!(err.code(), "PLAY_TIMEOUT");
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drive_aborts_on_revert() {
        let err = drive(&mut Broken, &PlayConfig::default()).await.unwrap_err();
        assert_eq!(err.code(), "TX_REVERTED");
    }

    #[tokio::test(start_paused = true)]
    async fn test_drive_times_out() {
        let config = PlayConfig { poll_interval: Duration::from_secs(3), timeout: Duration::from_secs(10) };
        let start = Instant::now();
        let err = drive(&mut Countdown(u32::MAX), &config).await.unwrap_err();
        assert_eq!(err.code(), "PLAY_TIMEOUT");
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }
}
