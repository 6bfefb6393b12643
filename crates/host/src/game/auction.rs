//! Sealed-bid auction driver: one commit, one reveal

use std::sync::Arc;

use arena_bindings::auction::AuctionGame;
use arena_core::units::format_native;
use arena_core::{AuctionPhase, CommittedValue, GameType, Hash, Salt, Seat, U256};
use async_trait::async_trait;
use tracing::info;

use super::{GameSession, PhaseDriver, PlayConfig, PlaySummary, Session, Stage, Tick};
use crate::error::ArenaError;
use crate::output::EventSink;
use crate::store::CommitmentStore;
use crate::strategy::AuctionBidPolicy;
use crate::submitter::TxOutcome;

/// AuctionGame reads and writes
#[async_trait]
pub trait AuctionContract: GameSession {
    async fn auction_game(&self, game_id: u64) -> Result<AuctionGame, ArenaError>;

    async fn commit_bid(&self, game_id: u64, hash: Hash) -> Result<TxOutcome, ArenaError>;

    async fn reveal_bid(&self, game_id: u64, bid: U256, salt: Salt) -> Result<TxOutcome, ArenaError>;
}

fn phase_name(phase: AuctionPhase) -> &'static str {
    match phase {
        AuctionPhase::Commit => "commit",
        AuctionPhase::Reveal => "reveal",
        AuctionPhase::Complete => "complete",
    }
}

/// Bid to commit: explicit or from `policy`, never above `wager`
pub fn validate_bid(bid: Option<U256>, wager: U256, policy: AuctionBidPolicy) -> Result<U256, ArenaError> {
    let bid = bid.unwrap_or_else(|| policy.bid(wager));
    if bid.is_zero() {
        return Err(ArenaError::InvalidAmount("bid must be greater than zero".into()));
    }
    if bid > wager {
        return Err(ArenaError::bid_exceeds_wager(bid, wager));
    }
    Ok(bid)
}

/// Plays one auction for the local player
#[derive(Debug)]
pub struct AuctionDriver<C: ?Sized> {
    session: Session<C>,
    bid: U256,
    seat: Option<Seat>,
}

impl<C: AuctionContract + ?Sized> AuctionDriver<C> {
    /// Fails with `BID_EXCEEDS_WAGER` before anything is sent when `bid > wager`
    pub fn new(
        contract: Arc<C>,
        store: CommitmentStore,
        events: Arc<dyn EventSink>,
        game_id: u64,
        bid: Option<U256>,
        wager: U256,
        policy: AuctionBidPolicy,
    ) -> Result<Self, ArenaError> {
        let bid = validate_bid(bid, wager, policy)?;
        let session = Session::new(contract, store, events, GameType::Auction, game_id)?;
        Ok(Self { session, bid, seat: None })
    }

    pub const fn bid(&self) -> U256 {
        self.bid
    }

    pub async fn run(mut self, config: &PlayConfig) -> Result<PlaySummary, ArenaError> {
        super::drive(&mut self, config).await
    }

    async fn commit(&mut self) -> Result<(), ArenaError> {
        let bid = self.bid;
        let record = self.session.prepare_commit(None, || CommittedValue::Bid(bid))?;
        let outcome = self.session.contract.commit_bid(self.session.game_id, record.hash()).await?;
        info!("Committed sealed bid for auction game {}", self.session.game_id);
        self.session.committed(0, None, &outcome);
        Ok(())
    }

    async fn reveal(&mut self, on_chain: Option<Hash>) -> Result<(), ArenaError> {
        let record = self.session.reveal_record(None, on_chain)?;
        let bid = record.value.as_bid().ok_or_else(|| self.session.wrong_kind(None))?;
        let outcome = self.session.contract.reveal_bid(self.session.game_id, bid, record.salt).await?;
        info!("Revealed bid {} for auction game {}", format_native(bid), self.session.game_id);
        self.session.revealed(0, None, format_native(bid), &outcome);
        Ok(())
    }
}

#[async_trait]
impl<C: AuctionContract + ?Sized> PhaseDriver for AuctionDriver<C> {
    type Summary = PlaySummary;

    async fn tick(&mut self) -> Result<Tick<PlaySummary>, ArenaError> {
        let game_id = self.session.game_id;
        let contract = Arc::clone(&self.session.contract);
        let (game, now) = tokio::try_join!(contract.auction_game(game_id), contract.chain_time())?;
        let seat = match self.seat {
            Some(seat) => seat,
            None => {
                let seat = self.session.seat(|p| game.seat_of(p))?;
                self.seat = Some(seat);
                seat
            }
        };

        if game.settled || game.phase == AuctionPhase::Complete {
            self.session.consume(None);
            self.session.settled();
            let mut summary = self.session.summary(game.escrow_match_id, seat);
            summary.my_value = game.revealed(seat).then(|| format_native(game.bid(seat)));
            summary.opponent_value = game.revealed(seat.other()).then(|| format_native(game.bid(seat.other())));
            return Ok(Tick::Done(summary));
        }
        self.session.observe_phase(phase_name(game.phase), 0);

        if now > game.phase_deadline {
            let opponent_at_fault = match game.phase {
                AuctionPhase::Commit => game.committed(seat) && !game.committed(seat.other()),
                AuctionPhase::Reveal => game.revealed(seat) && !game.revealed(seat.other()),
                AuctionPhase::Complete => false,
            };
            if opponent_at_fault {
                self.session.claim(game.phase as u64).await?;
                return Ok(Tick::Pending);
            }
        }

        match game.phase {
            AuctionPhase::Commit if !game.committed(seat) && !self.session.acted(0, Stage::Commit) => {
                self.commit().await?;
            }
            AuctionPhase::Reveal if !game.revealed(seat) && !self.session.acted(0, Stage::Reveal) => {
                self.reveal(game.bid_hash(seat)).await?;
            }
            _ => {}
        }
        Ok(Tick::Pending)
    }
}
