//! Poker driver
//!
//! Commit a hand, play both betting rounds when it is our turn, reveal at
//! showdown. A fold settles the game immediately.

use std::sync::Arc;

use arena_bindings::poker::PokerGame;
use arena_core::{units, Address, CommittedValue, GameType, Hash, PokerAction, PokerPhase, Salt, Seat, U256};
use async_trait::async_trait;
use tracing::info;

use super::{GameSession, PhaseDriver, PlayConfig, PlaySummary, Session, Stage, Tick};
use crate::error::ArenaError;
use crate::output::{EventSink, ProgressEvent};
use crate::store::CommitmentStore;
use crate::strategy::{random_hand, PokerPolicy, MAX_HAND, MIN_HAND};
use crate::submitter::TxOutcome;

/// PokerGame reads and writes
#[async_trait]
pub trait PokerContract: GameSession {
    async fn poker_game(&self, game_id: u64) -> Result<PokerGame, ArenaError>;

    async fn commit_hand(&self, game_id: u64, hash: Hash) -> Result<TxOutcome, ArenaError>;

    /// Bets, raises and calls carry `value`
    async fn take_action(&self, game_id: u64, action: PokerAction, value: U256) -> Result<TxOutcome, ArenaError>;

    async fn reveal_hand(&self, game_id: u64, hand: u8, salt: Salt) -> Result<TxOutcome, ArenaError>;
}

fn phase_name(phase: PokerPhase) -> &'static str {
    match phase {
        PokerPhase::Commit => "commit",
        PokerPhase::Betting1 => "betting1",
        PokerPhase::Betting2 => "betting2",
        PokerPhase::Showdown => "showdown",
        PokerPhase::Complete => "complete",
    }
}

/// Plays one poker game for the local player
#[derive(Debug)]
pub struct PokerDriver<C: ?Sized> {
    session: Session<C>,
    hand: u8,
    wager: U256,
    policy: PokerPolicy,
    seat: Option<Seat>,
    /// Betting state we last acted on: phase, outstanding bet, our extra bets
    last_action: Option<(PokerPhase, U256, U256)>,
}

impl<C: PokerContract + ?Sized> PokerDriver<C> {
    /// `hand` defaults to a random value; a stored commitment for this game wins over both
    pub fn new(
        contract: Arc<C>,
        store: CommitmentStore,
        events: Arc<dyn EventSink>,
        game_id: u64,
        hand: Option<u8>,
        wager: U256,
        policy: PokerPolicy,
    ) -> Result<Self, ArenaError> {
        if let Some(hand) = hand {
            if !(MIN_HAND..=MAX_HAND).contains(&hand) {
                return Err(ArenaError::InvalidArgument(format!(
                    "hand value must be {}-{}, got {}",
                    MIN_HAND, MAX_HAND, hand
                )));
            }
        }
        let session = Session::new(contract, store, events, GameType::Poker, game_id)?;
        let stored = session.store.peek(&session.key(None)).into_option().and_then(|r| r.value.as_small());
        let hand = stored.or(hand).unwrap_or_else(random_hand);
        Ok(Self { session, hand, wager, policy, seat: None, last_action: None })
    }

    pub const fn hand(&self) -> u8 {
        self.hand
    }

    pub async fn run(mut self, config: &PlayConfig) -> Result<PlaySummary, ArenaError> {
        super::drive(&mut self, config).await
    }

    async fn commit(&mut self) -> Result<(), ArenaError> {
        let hand = self.hand;
        let record = self.session.prepare_commit(None, || CommittedValue::Small(hand))?;
        if let Some(stored) = record.value.as_small() {
            self.hand = stored;
        }
        let outcome = self.session.contract.commit_hand(self.session.game_id, record.hash()).await?;
        info!("Committed hand for poker game {}", self.session.game_id);
        self.session.committed(0, None, &outcome);
        Ok(())
    }

    async fn act(&mut self, game: &PokerGame, seat: Seat) -> Result<(), ArenaError> {
        let (action, value) = self.policy.decide(self.hand, self.wager, game.current_bet);
        let outcome = self.session.contract.take_action(self.session.game_id, action, value).await?;
        info!("Poker game {}: {:?} {}", self.session.game_id, action, units::format_native(value));

        self.last_action = Some((game.phase, game.current_bet, game.extra_bets(seat)));
        self.session.transactions.push(outcome.hash_hex());
        self.session.events.emit(ProgressEvent::Action {
            game_id: self.session.game_id,
            action,
            value: value.to_string(),
            tx: outcome.hash_hex(),
        });
        Ok(())
    }

    async fn reveal(&mut self, on_chain: Option<Hash>) -> Result<(), ArenaError> {
        let record = self.session.reveal_record(None, on_chain)?;
        let hand = record.value.as_small().ok_or_else(|| self.session.wrong_kind(None))?;
        let outcome = self.session.contract.reveal_hand(self.session.game_id, hand, record.salt).await?;
        info!("Revealed hand {} for poker game {}", hand, self.session.game_id);
        self.session.revealed(0, None, hand.to_string(), &outcome);
        Ok(())
    }
}

fn on_turn(game: &PokerGame, who: Address) -> bool {
    game.phase.is_betting() && game.current_turn == who
}

#[async_trait]
impl<C: PokerContract + ?Sized> PhaseDriver for PokerDriver<C> {
    type Summary = PlaySummary;

    async fn tick(&mut self) -> Result<Tick<PlaySummary>, ArenaError> {
        let game_id = self.session.game_id;
        let contract = Arc::clone(&self.session.contract);
        let (game, now) = tokio::try_join!(contract.poker_game(game_id), contract.chain_time())?;
        let seat = match self.seat {
            Some(seat) => seat,
            None => {
                let seat = self.session.seat(|p| game.seat_of(p))?;
                self.seat = Some(seat);
                seat
            }
        };

        // 1. Settled
        if game.settled || game.phase == PokerPhase::Complete {
            self.session.consume(None);
            self.session.settled();
            let mut summary = self.session.summary(game.escrow_match_id, seat);
            summary.my_value = game.revealed(seat).then(|| game.hand_value(seat).to_string());
            summary.opponent_value = game.revealed(seat.other()).then(|| game.hand_value(seat.other()).to_string());
            return Ok(Tick::Done(summary));
        }
        self.session.observe_phase(phase_name(game.phase), 0);
        let phase_slot = game.phase as u64;

        // 2. Deadline passed with the opponent at fault
        if now > game.phase_deadline {
            let opponent_at_fault = match game.phase {
                PokerPhase::Commit => game.committed(seat) && !game.committed(seat.other()),
                PokerPhase::Betting1 | PokerPhase::Betting2 => on_turn(&game, game.player(seat.other())),
                PokerPhase::Showdown => game.revealed(seat) && !game.revealed(seat.other()),
                PokerPhase::Complete => false,
            };
            if opponent_at_fault {
                self.session.claim(phase_slot).await?;
                return Ok(Tick::Pending);
            }
        }

        // 3. Our move for this phase
        match game.phase {
            PokerPhase::Commit if !game.committed(seat) && !self.session.acted(0, Stage::Commit) => {
                self.commit().await?;
            }
            PokerPhase::Betting1 | PokerPhase::Betting2
                if on_turn(&game, self.session.player)
                    && self.last_action != Some((game.phase, game.current_bet, game.extra_bets(seat))) =>
            {
                self.act(&game, seat).await?;
            }
            PokerPhase::Showdown if !game.revealed(seat) && !self.session.acted(0, Stage::Reveal) => {
                self.reveal(game.commit_of(seat)).await?;
            }
            _ => {}
        }
        Ok(Tick::Pending)
    }
}
