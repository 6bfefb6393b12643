//! `play` and `respond`: get a match to a live game, then drive it to settlement

use std::sync::Arc;
use std::time::Duration;

use arena_bindings::escrow::Match;
use arena_core::units::parse_native;
use arena_core::{Address, GameType, MatchStatus, Seat, U256};
use arena_host::game::auction::validate_bid;
use arena_host::game::{drive, PhaseDriver, Tick};
use arena_host::output::{EventSink, ProgressEvent, StdoutSink};
use arena_host::opponents::OpponentBook;
use arena_host::store::CommitmentStore;
use arena_host::strategy::{AuctionBidPolicy, PokerPolicy, RpsStrategy, MAX_HAND, MIN_HAND};
use arena_host::{
    ArenaClient, ArenaError, AuctionDriver, ChainRpc, Config, PlayConfig, PlaySummary, PokerDriver, RpsDriver,
};
use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cli::PlayArgs;

/// What the local player commits, settled before any transaction is sent
#[derive(Debug, Clone, Copy)]
enum Plan {
    Rps(RpsStrategy),
    Poker(Option<u8>),
    Auction(U256),
}

impl Plan {
    fn new(game_type: GameType, args: &PlayArgs, wager: U256) -> Result<Self, ArenaError> {
        match game_type {
            GameType::Rps => Ok(Self::Rps(args.strategy.parse()?)),
            GameType::Poker => match args.hand {
                Some(hand) if !(MIN_HAND..=MAX_HAND).contains(&hand) => Err(ArenaError::InvalidArgument(format!(
                    "hand value must be {}-{}, got {}",
                    MIN_HAND, MAX_HAND, hand
                ))),
                hand => Ok(Self::Poker(hand)),
            },
            GameType::Auction => {
                let bid = args.bid.as_deref().map(parse_native).transpose()?;
                Ok(Self::Auction(validate_bid(bid, wager, AuctionBidPolicy::default())?))
            }
        }
    }
}

/// Waits for acceptance and for the game to exist, accepting or creating
/// it when that is ours to do
struct MatchSetup<R> {
    client: Arc<ArenaClient<R>>,
    events: Arc<dyn EventSink>,
    match_id: u64,
    game_type: GameType,
    seat: Seat,
    accept: bool,
    rounds: u64,
}

#[async_trait]
impl<R: ChainRpc + 'static> PhaseDriver for MatchSetup<R> {
    type Summary = u64;

    async fn tick(&mut self) -> Result<Tick<u64>, ArenaError> {
        let m = self.client.get_match(self.match_id).await?;
        match m.status {
            MatchStatus::Created if self.accept && self.seat == Seat::Player2 => {
                let outcome = self.client.accept_match(self.match_id, m.wager).await?;
                self.events.emit(ProgressEvent::MatchAccepted { match_id: self.match_id, tx: outcome.hash_hex() });
                Ok(Tick::Pending)
            }
            MatchStatus::Created => {
                debug!("Match {} not accepted yet", self.match_id);
                Ok(Tick::Pending)
            }
            MatchStatus::Cancelled => Err(ArenaError::InvalidMatchState(format!("match {} was cancelled", self.match_id))),
            MatchStatus::Active | MatchStatus::Settled => {
                if let Some(game_id) = self.client.find_game_for_match(self.game_type, self.match_id).await? {
                    self.events.emit(ProgressEvent::GameFound {
                        game_type: self.game_type,
                        game_id,
                        match_id: self.match_id,
                    });
                    return Ok(Tick::Done(game_id));
                }
                if m.status == MatchStatus::Settled {
                    return Err(ArenaError::InvalidMatchState(format!(
                        "match {} settled without a game",
                        self.match_id
                    )));
                }
                if self.seat != Seat::Player1 {
                    debug!("Waiting for the challenger to create the game for match {}", self.match_id);
                    return Ok(Tick::Pending);
                }
                let (game_id, outcome) = self.client.create_game(self.game_type, self.match_id, self.rounds).await?;
                self.events.emit(ProgressEvent::GameCreated {
                    game_type: self.game_type,
                    game_id,
                    match_id: self.match_id,
                    tx: outcome.hash_hex(),
                });
                Ok(Tick::Done(game_id))
            }
        }
    }
}

fn seat_in(m: &Match, who: Address, match_id: u64) -> Result<Seat, ArenaError> {
    Seat::of(who, m.player1, m.player2)
        .ok_or_else(|| ArenaError::NotAParticipant { who: who.to_string(), what: format!("match {}", match_id) })
}

/// Play `args.match_id` to settlement; `accept` also accepts an open challenge
pub(crate) async fn play<R: ChainRpc + 'static>(
    client: Arc<ArenaClient<R>>,
    config: &Config,
    args: PlayArgs,
    accept: bool,
) -> Result<Value, ArenaError> {
    let me = client.address()?;
    let m = client.get_match(args.match_id).await?;
    let seat = seat_in(&m, me, args.match_id)?;
    let opponent = seat.pick(m.player2, m.player1);
    let game_type = client.game_type_of_match(&m)?;
    let plan = Plan::new(game_type, &args, m.wager)?;

    let started = Instant::now();
    let timeout = Duration::from_secs(args.timeout);
    let events: Arc<dyn EventSink> = Arc::new(StdoutSink);

    let mut setup = MatchSetup {
        client: Arc::clone(&client),
        events: Arc::clone(&events),
        match_id: args.match_id,
        game_type,
        seat,
        accept,
        rounds: args.rounds,
    };
    let game_id = drive(&mut setup, &PlayConfig { poll_interval: config.poll_interval(), timeout }).await?;
    info!("Playing {} game {} for match {}", game_type, game_id, args.match_id);

    let play_config = PlayConfig {
        poll_interval: config.poll_interval(),
        timeout: timeout.saturating_sub(started.elapsed()),
    };
    let store = CommitmentStore::new(config.commitments_path());
    let mut summary = match plan {
        Plan::Rps(strategy) => {
            let prior = OpponentBook::new(config.opponents_path()).profile(opponent).rounds;
            debug!("{} earlier rounds against {}", prior.len(), opponent);
            RpsDriver::new(Arc::clone(&client), store, events, game_id, strategy)?
                .with_prior_history(prior)
                .run(&play_config)
                .await?
        }
        Plan::Poker(hand) => {
            PokerDriver::new(Arc::clone(&client), store, events, game_id, hand, m.wager, PokerPolicy::default())?
                .run(&play_config)
                .await?
        }
        Plan::Auction(bid) => {
            AuctionDriver::new(
                Arc::clone(&client),
                store,
                events,
                game_id,
                Some(bid),
                m.wager,
                AuctionBidPolicy::default(),
            )?
            .run(&play_config)
            .await?
        }
    };

    summary.winner = match client.winner(args.match_id).await {
        Ok(winner) => winner,
        Err(e) => {
            warn!("Could not read the winner of match {}: {}", args.match_id, e);
            None
        }
    };
    if game_type == GameType::Rps {
        remember(&OpponentBook::new(config.opponents_path()), opponent, me, &summary);
    }
    serde_json::to_value(&summary).map_err(|e| ArenaError::Decode(e.to_string()))
}

/// Fold a finished RPS game into the opponent's profile
fn remember(book: &OpponentBook, opponent: Address, me: Address, summary: &PlaySummary) {
    let rounds: Vec<_> = summary.rounds.iter().map(|r| (r.my_move, r.opponent_move)).collect();
    let mut profile = book.profile(opponent);
    profile.record_game(
        &rounds,
        summary.winner.map(|w| w == me),
        summary.my_score.unwrap_or_default(),
        summary.opponent_score.unwrap_or_default(),
    );
    if let Err(e) = book.save(opponent, &profile) {
        warn!("Could not update opponent profile for {}: {}", opponent, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(strategy: &str, hand: Option<u8>, bid: Option<&str>) -> PlayArgs {
        PlayArgs {
            match_id: 1,
            strategy: strategy.to_string(),
            hand,
            bid: bid.map(str::to_string),
            rounds: 3,
            timeout: 60,
        }
    }

    fn mon(s: &str) -> U256 {
        parse_native(s).unwrap()
    }

    #[test]
    fn test_plan_validates_before_sending() {
        let wager = mon("2");
        assert!(matches!(Plan::new(GameType::Rps, &args("rock", None, None), wager), Ok(Plan::Rps(_))));
        assert_eq!(Plan::new(GameType::Rps, &args("lizard", None, None), wager).unwrap_err().code(), "INVALID_MOVE");
        assert_eq!(Plan::new(GameType::Poker, &args("random", Some(0), None), wager).unwrap_err().code(), "INVALID_ARGUMENT");
        assert_eq!(
            Plan::new(GameType::Auction, &args("random", None, Some("2.5")), wager).unwrap_err().code(),
            "BID_EXCEEDS_WAGER"
        );
        assert!(matches!(
            Plan::new(GameType::Auction, &args("random", None, Some("1.5")), wager),
            Ok(Plan::Auction(bid)) if bid == mon("1.5")
        ));
    }

    #[test]
    fn test_finished_game_is_remembered_per_opponent() {
        use arena_core::Move::{Paper, Rock, Scissors};
        use arena_host::game::RoundReport;
        use arena_host::output::RoundResult;

        let dir = tempfile::tempdir().unwrap();
        let book = OpponentBook::new(dir.path().join("opponents.json"));
        let (me, opponent) = (Address::repeat_byte(1), Address::repeat_byte(2));
        let summary = PlaySummary {
            game_type: GameType::Rps,
            game_id: 4,
            match_id: 1,
            seat: Seat::Player1,
            my_score: Some(2),
            opponent_score: Some(1),
            rounds: vec![
                RoundReport { round: 0, my_move: Rock, opponent_move: Scissors, result: RoundResult::Won },
                RoundReport { round: 1, my_move: Rock, opponent_move: Paper, result: RoundResult::Lost },
                RoundReport { round: 2, my_move: Scissors, opponent_move: Paper, result: RoundResult::Won },
            ],
            my_value: None,
            opponent_value: None,
            timeout_claimed: false,
            transactions: Vec::new(),
            winner: Some(me),
        };

        remember(&book, opponent, me, &summary);
        remember(&book, opponent, me, &PlaySummary { winner: Some(opponent), ..summary });

        let profile = book.profile(opponent);
        assert_eq!(profile.rounds.len(), 6);
        assert_eq!(profile.rounds[2], (Scissors, Paper));
        assert_eq!(profile.games.len(), 2);
        assert_eq!(profile.win_rate(), 0.5);
        assert!(book.profile(me).rounds.is_empty());
    }
}
