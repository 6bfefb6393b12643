//! Rock-paper-scissors driver
//!
//! Commits and reveals once per round until the game settles. Round
//! outcomes are recomputed locally for reporting only; the score that
//! counts is the contract's.

use std::sync::Arc;

use arena_bindings::rps::{RpsGame, RpsRound};
use arena_core::{round_winner, CommittedValue, GameType, Hash, Move, RoundOutcome, RpsPhase, Salt, Seat, Tally};
use async_trait::async_trait;
use tracing::info;

use super::{GameSession, PhaseDriver, PlayConfig, PlaySummary, RoundReport, Session, Stage, Tick};
use crate::error::ArenaError;
use crate::output::{EventSink, ProgressEvent, RoundResult};
use crate::store::CommitmentStore;
use crate::strategy::{RoundPair, RpsStrategy};
use crate::submitter::TxOutcome;

/// RPSGame reads and writes
#[async_trait]
pub trait RpsContract: GameSession {
    async fn rps_game(&self, game_id: u64) -> Result<RpsGame, ArenaError>;

    async fn rps_round(&self, game_id: u64, round: u64) -> Result<RpsRound, ArenaError>;

    async fn commit_move(&self, game_id: u64, hash: Hash) -> Result<TxOutcome, ArenaError>;

    async fn reveal_move(&self, game_id: u64, mv: Move, salt: Salt) -> Result<TxOutcome, ArenaError>;
}

fn phase_name(phase: RpsPhase) -> &'static str {
    match phase {
        RpsPhase::Commit => "commit",
        RpsPhase::Reveal => "reveal",
        RpsPhase::Complete => "complete",
    }
}

/// Plays one RPS game for the local player
#[derive(Debug)]
pub struct RpsDriver<C: ?Sized> {
    session: Session<C>,
    strategy: RpsStrategy,
    seat: Option<Seat>,
    tally: Tally,
    next_report: u64,
    rounds: Vec<RoundReport>,
    history: Vec<RoundPair>,
    prior: Vec<RoundPair>,
}

impl<C: RpsContract + ?Sized> RpsDriver<C> {
    pub fn new(
        contract: Arc<C>,
        store: CommitmentStore,
        events: Arc<dyn EventSink>,
        game_id: u64,
        strategy: RpsStrategy,
    ) -> Result<Self, ArenaError> {
        Ok(Self {
            session: Session::new(contract, store, events, GameType::Rps, game_id)?,
            strategy,
            seat: None,
            tally: Tally::default(),
            next_report: 0,
            rounds: Vec::new(),
            history: Vec::new(),
            prior: Vec::new(),
        })
    }

    /// Rounds from earlier games against the same opponent, oldest first
    pub fn with_prior_history(mut self, prior: Vec<RoundPair>) -> Self {
        self.prior = prior;
        self
    }

    /// Play until settled or `config.timeout` passes
    pub async fn run(mut self, config: &PlayConfig) -> Result<PlaySummary, ArenaError> {
        super::drive(&mut self, config).await
    }

    /// Report every fully revealed round below `upto` not yet reported
    async fn report_rounds(&mut self, upto: u64, seat: Seat) -> Result<(), ArenaError> {
        while self.next_report < upto {
            let index = self.next_report;
            let round = self.session.contract.rps_round(self.session.game_id, index).await?;
            if let Some((p1, p2)) = round.moves() {
                let outcome = round_winner(p1, p2);
                self.tally.record(outcome);
                let (mine, theirs) = seat.pick((p1, p2), (p2, p1));
                let result = RoundResult::from_outcome(outcome, seat.pick(RoundOutcome::Player1, RoundOutcome::Player2));
                let (my_score, opponent_score) =
                    seat.pick((self.tally.player1, self.tally.player2), (self.tally.player2, self.tally.player1));
                info!("Round {}: {} vs {}, {:?} ({}-{})", index, mine, theirs, result, my_score, opponent_score);

                self.history.push((mine, theirs));
                self.rounds.push(RoundReport { round: index, my_move: mine, opponent_move: theirs, result });
                self.session.events.emit(ProgressEvent::Round {
                    game_id: self.session.game_id,
                    round: index,
                    my_move: mine,
                    opponent_move: theirs,
                    result,
                    my_score,
                    opponent_score,
                });
            }
            self.next_report += 1;
        }
        Ok(())
    }

    async fn commit(&mut self, round: u64) -> Result<(), ArenaError> {
        let pick = self.strategy.choose(&self.history, &self.prior);
        let record = self.session.prepare_commit(Some(round), || {
            info!("Round {}: {} ({}, confidence {:.2})", round, pick.mv, pick.source, pick.confidence);
            CommittedValue::Small(pick.mv.value())
        })?;
        let outcome = self.session.contract.commit_move(self.session.game_id, record.hash()).await?;
        info!("Committed round {} of game {}", round, self.session.game_id);
        self.session.committed(round, Some(round), &outcome);
        Ok(())
    }

    async fn reveal(&mut self, round: u64, on_chain: Option<Hash>) -> Result<(), ArenaError> {
        let record = self.session.reveal_record(Some(round), on_chain)?;
        let mv = record
            .value
            .as_small()
            .and_then(|v| Move::from_value(v).ok().flatten())
            .ok_or_else(|| self.session.wrong_kind(Some(round)))?;
        let outcome = self.session.contract.reveal_move(self.session.game_id, mv, record.salt).await?;
        info!("Revealed {} for round {} of game {}", mv, round, self.session.game_id);
        self.session.revealed(round, Some(round), mv.to_string(), &outcome);
        Ok(())
    }
}

#[async_trait]
impl<C: RpsContract + ?Sized> PhaseDriver for RpsDriver<C> {
    type Summary = PlaySummary;

    async fn tick(&mut self) -> Result<Tick<PlaySummary>, ArenaError> {
        let game_id = self.session.game_id;
        let game = self.session.contract.rps_game(game_id).await?;
        let seat = match self.seat {
            Some(seat) => seat,
            None => {
                let seat = self.session.seat(|p| game.seat_of(p))?;
                self.seat = Some(seat);
                seat
            }
        };

        // 1. Settled: report what is left and stop
        if game.settled || game.phase == RpsPhase::Complete {
            self.report_rounds((game.current_round + 1).min(game.total_rounds), seat).await?;
            self.session.consume(Some(game.current_round));
            self.session.settled();
            let mut summary = self.session.summary(game.escrow_match_id, seat);
            summary.my_score = Some(game.score(seat));
            summary.opponent_score = Some(game.score(seat.other()));
            summary.rounds = self.rounds.clone();
            return Ok(Tick::Done(summary));
        }

        self.report_rounds(game.current_round, seat).await?;
        let index = game.current_round;
        self.session.observe_phase(phase_name(game.phase), index);

        let contract = Arc::clone(&self.session.contract);
        let (round, now) = tokio::try_join!(contract.rps_round(game_id, index), contract.chain_time())?;
        let mine = round.commit_of(seat);

        // 2. Deadline passed with the opponent at fault
        if now > game.phase_deadline {
            let opponent_at_fault = match game.phase {
                RpsPhase::Commit => mine.is_some() && round.commit_of(seat.other()).is_none(),
                RpsPhase::Reveal => round.revealed(seat) && !round.revealed(seat.other()),
                RpsPhase::Complete => false,
            };
            if opponent_at_fault {
                self.session.claim(index).await?;
                return Ok(Tick::Pending);
            }
        }

        // 3. Our move for this phase
        match game.phase {
            RpsPhase::Commit if mine.is_none() && !self.session.acted(index, Stage::Commit) => {
                self.commit(index).await?;
            }
            RpsPhase::Reveal if !round.revealed(seat) && !self.session.acted(index, Stage::Reveal) => {
                self.reveal(index, mine).await?;
            }
            _ => {}
        }
        Ok(Tick::Pending)
    }
}
