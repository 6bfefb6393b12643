//! In-memory game contracts for driver tests
//!
//! Enforces the rules the drivers depend on (phase order, turn order,
//! commit verification, deadlines) and nothing else.

use std::sync::{Arc, Mutex};

use arena_bindings::auction::AuctionGame;
use arena_bindings::poker::PokerGame;
use arena_bindings::rps::{RpsGame, RpsRound};
use arena_core::abi::keccak256;
use arena_core::{
    commit_bid_hash, commit_hash, round_winner, Address, AuctionPhase, GameType, Hash, Move, PokerAction,
    PokerPhase, RoundOutcome, RpsPhase, Salt, Seat, U256,
};
use async_trait::async_trait;
use tokio::time::Instant;

use super::{AuctionContract, GameSession, PokerContract, RpsContract};
use crate::error::ArenaError;
use crate::submitter::TxOutcome;

pub(crate) const GAME_ID: u64 = 7;
pub(crate) const MATCH_ID: u64 = 3;
/// Seconds each phase stays open
pub(crate) const WINDOW: u64 = 120;
const GENESIS: u64 = 1_700_000_000;

const EMPTY_ROUND: RpsRound = RpsRound {
    p1_commit: [0u8; 32],
    p2_commit: [0u8; 32],
    p1_move: None,
    p2_move: None,
    p1_revealed: false,
    p2_revealed: false,
};

#[derive(Default)]
struct State {
    rps: Option<(RpsGame, Vec<RpsRound>)>,
    poker: Option<PokerGame>,
    auction: Option<AuctionGame>,
    sent: Vec<(Address, &'static str)>,
    lag_rounds: bool,
    stale_round: Option<RpsRound>,
}

pub(crate) struct SimChain {
    start: Instant,
    state: Mutex<State>,
}

fn revert(what: &str) -> ArenaError {
    ArenaError::TxReverted { hash: format!("0xsim ({})", what) }
}

fn put<T>(seat: Seat, p1: &mut T, p2: &mut T, value: T) {
    match seat {
        Seat::Player1 => *p1 = value,
        Seat::Player2 => *p2 = value,
    }
}

impl SimChain {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self { start: Instant::now(), state: Mutex::new(State::default()) })
    }

    pub(crate) fn player(self: &Arc<Self>, address: Address) -> Arc<SimPlayer> {
        Arc::new(SimPlayer { chain: Arc::clone(self), address })
    }

    fn now(&self) -> u64 {
        GENESIS + self.start.elapsed().as_secs()
    }

    pub(crate) fn add_rps(&self, p1: Address, p2: Address, total_rounds: u64) {
        let game = RpsGame {
            escrow_match_id: MATCH_ID,
            player1: p1,
            player2: p2,
            total_rounds,
            current_round: 0,
            p1_score: 0,
            p2_score: 0,
            phase: RpsPhase::Commit,
            phase_deadline: self.now() + WINDOW,
            settled: false,
        };
        self.state.lock().unwrap().rps = Some((game, vec![EMPTY_ROUND]));
    }

    pub(crate) fn add_poker(&self, p1: Address, p2: Address) {
        let game = PokerGame {
            escrow_match_id: MATCH_ID,
            player1: p1,
            player2: p2,
            p1_commit: [0u8; 32],
            p2_commit: [0u8; 32],
            p1_hand_value: 0,
            p2_hand_value: 0,
            p1_committed: false,
            p2_committed: false,
            p1_revealed: false,
            p2_revealed: false,
            phase: PokerPhase::Commit,
            phase_deadline: self.now() + WINDOW,
            settled: false,
            current_bet: U256::ZERO,
            current_turn: Address::ZERO,
            p1_extra_bets: U256::ZERO,
            p2_extra_bets: U256::ZERO,
        };
        self.state.lock().unwrap().poker = Some(game);
    }

    pub(crate) fn add_auction(&self, p1: Address, p2: Address, prize: U256) {
        let game = AuctionGame {
            escrow_match_id: MATCH_ID,
            player1: p1,
            player2: p2,
            prize,
            p1_bid_hash: [0u8; 32],
            p2_bid_hash: [0u8; 32],
            p1_bid: U256::ZERO,
            p2_bid: U256::ZERO,
            p1_committed: false,
            p2_committed: false,
            p1_revealed: false,
            p2_revealed: false,
            phase: AuctionPhase::Commit,
            phase_deadline: self.now() + WINDOW,
            settled: false,
        };
        self.state.lock().unwrap().auction = Some(game);
    }

    /// Put the RPS game into its reveal phase with `p1_commit` already on chain
    pub(crate) fn force_rps_reveal(&self, p1_commit: Hash) {
        let mut state = self.state.lock().unwrap();
        let (game, rounds) = state.rps.as_mut().unwrap();
        game.phase = RpsPhase::Reveal;
        rounds[0].p1_commit = p1_commit;
        rounds[0].p2_commit = [0x99; 32];
    }

    /// Serve the pre-commit round once after each commit, like a node behind the head
    pub(crate) fn lag_round_reads(&self) {
        self.state.lock().unwrap().lag_rounds = true;
    }

    pub(crate) fn sent_by(&self, who: Address) -> Vec<&'static str> {
        self.state.lock().unwrap().sent.iter().filter(|(a, _)| *a == who).map(|(_, m)| *m).collect()
    }

    pub(crate) fn rps_game(&self) -> RpsGame {
        self.state.lock().unwrap().rps.as_ref().unwrap().0.clone()
    }

    pub(crate) fn poker_game(&self) -> PokerGame {
        self.state.lock().unwrap().poker.clone().unwrap()
    }

    pub(crate) fn auction_game(&self) -> AuctionGame {
        self.state.lock().unwrap().auction.clone().unwrap()
    }
}

/// One player's connection to the simulated chain
pub(crate) struct SimPlayer {
    chain: Arc<SimChain>,
    address: Address,
}

impl std::fmt::Debug for SimPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimPlayer").field("address", &self.address).finish_non_exhaustive()
    }
}

impl SimPlayer {
    fn tx(&self, state: &mut State, method: &'static str) -> TxOutcome {
        state.sent.push((self.address, method));
        let n = state.sent.len() as u64;
        TxOutcome { hash: keccak256(&n.to_be_bytes()), gas_used: 21_000, block_number: n, logs: Vec::new() }
    }

    fn check_game_id(game_id: u64) -> Result<(), ArenaError> {
        if game_id == GAME_ID {
            Ok(())
        } else {
            Err(ArenaError::CallReverted("game not found".into()))
        }
    }
}

#[async_trait]
impl GameSession for SimPlayer {
    fn player(&self) -> Result<Address, ArenaError> {
        Ok(self.address)
    }

    async fn chain_time(&self) -> Result<u64, ArenaError> {
        Ok(self.chain.now())
    }

    async fn claim_timeout(&self, game_type: GameType, game_id: u64) -> Result<TxOutcome, ArenaError> {
        Self::check_game_id(game_id)?;
        let now = self.chain.now();
        let mut state = self.chain.state.lock().unwrap();
        let outcome = self.tx(&mut state, "claimTimeout");
        let expired = match game_type {
            GameType::Rps => state.rps.as_mut().map(|(g, _)| {
                let open = now > g.phase_deadline && !g.settled;
                if open {
                    g.settled = true;
                    g.phase = RpsPhase::Complete;
                }
                open
            }),
            GameType::Poker => state.poker.as_mut().map(|g| {
                let open = now > g.phase_deadline && !g.settled;
                if open {
                    g.settled = true;
                    g.phase = PokerPhase::Complete;
                }
                open
            }),
            GameType::Auction => state.auction.as_mut().map(|g| {
                let open = now > g.phase_deadline && !g.settled;
                if open {
                    g.settled = true;
                    g.phase = AuctionPhase::Complete;
                }
                open
            }),
        };
        match expired {
            Some(true) => Ok(outcome),
            _ => Err(revert("deadline not passed")),
        }
    }
}

#[async_trait]
impl RpsContract for SimPlayer {
    async fn rps_game(&self, game_id: u64) -> Result<RpsGame, ArenaError> {
        Self::check_game_id(game_id)?;
        Ok(self.chain.rps_game())
    }

    async fn rps_round(&self, game_id: u64, round: u64) -> Result<RpsRound, ArenaError> {
        Self::check_game_id(game_id)?;
        let mut state = self.chain.state.lock().unwrap();
        if let Some(stale) = state.stale_round.take() {
            return Ok(stale);
        }
        let (_, rounds) = state.rps.as_ref().unwrap();
        Ok(rounds.get(round as usize).cloned().unwrap_or(EMPTY_ROUND))
    }

    async fn commit_move(&self, game_id: u64, hash: Hash) -> Result<TxOutcome, ArenaError> {
        Self::check_game_id(game_id)?;
        let now = self.chain.now();
        let mut state = self.chain.state.lock().unwrap();
        let outcome = self.tx(&mut state, "commit");
        let lag = state.lag_rounds;
        let (game, rounds) = state.rps.as_mut().unwrap();
        let seat = game.seat_of(self.address).ok_or_else(|| revert("not a player"))?;
        let round = &mut rounds[game.current_round as usize];
        if game.phase != RpsPhase::Commit || round.commit_of(seat).is_some() {
            return Err(revert("not in commit phase"));
        }
        let before = round.clone();
        put(seat, &mut round.p1_commit, &mut round.p2_commit, hash);
        if round.commit_of(Seat::Player1).is_some() && round.commit_of(Seat::Player2).is_some() {
            game.phase = RpsPhase::Reveal;
            game.phase_deadline = now + WINDOW;
        }
        if lag {
            state.stale_round = Some(before);
        }
        Ok(outcome)
    }

    async fn reveal_move(&self, game_id: u64, mv: Move, salt: Salt) -> Result<TxOutcome, ArenaError> {
        Self::check_game_id(game_id)?;
        let now = self.chain.now();
        let mut state = self.chain.state.lock().unwrap();
        let outcome = self.tx(&mut state, "reveal");
        let (game, rounds) = state.rps.as_mut().unwrap();
        let seat = game.seat_of(self.address).ok_or_else(|| revert("not a player"))?;
        let index = game.current_round as usize;
        let round = &mut rounds[index];
        if game.phase != RpsPhase::Reveal || round.revealed(seat) {
            return Err(revert("not in reveal phase"));
        }
        if round.commit_of(seat) != Some(commit_hash(mv.value(), &salt)) {
            return Err(revert("hash mismatch"));
        }
        put(seat, &mut round.p1_move, &mut round.p2_move, Some(mv));
        put(seat, &mut round.p1_revealed, &mut round.p2_revealed, true);

        if let Some((m1, m2)) = round.moves() {
            match round_winner(m1, m2) {
                RoundOutcome::Player1 => game.p1_score += 1,
                RoundOutcome::Player2 => game.p2_score += 1,
                RoundOutcome::Draw => {}
            }
            let majority = game.total_rounds / 2 + 1;
            if game.p1_score >= majority || game.p2_score >= majority || game.current_round + 1 >= game.total_rounds {
                game.settled = true;
                game.phase = RpsPhase::Complete;
            } else {
                game.current_round += 1;
                game.phase = RpsPhase::Commit;
                game.phase_deadline = now + WINDOW;
                rounds.push(EMPTY_ROUND);
            }
        }
        Ok(outcome)
    }
}

#[async_trait]
impl PokerContract for SimPlayer {
    async fn poker_game(&self, game_id: u64) -> Result<PokerGame, ArenaError> {
        Self::check_game_id(game_id)?;
        Ok(self.chain.poker_game())
    }

    async fn commit_hand(&self, game_id: u64, hash: Hash) -> Result<TxOutcome, ArenaError> {
        Self::check_game_id(game_id)?;
        let now = self.chain.now();
        let mut state = self.chain.state.lock().unwrap();
        let outcome = self.tx(&mut state, "commitHand");
        let game = state.poker.as_mut().unwrap();
        let seat = game.seat_of(self.address).ok_or_else(|| revert("not a player"))?;
        if game.phase != PokerPhase::Commit || game.committed(seat) {
            return Err(revert("not in commit phase"));
        }
        put(seat, &mut game.p1_commit, &mut game.p2_commit, hash);
        put(seat, &mut game.p1_committed, &mut game.p2_committed, true);
        if game.p1_committed && game.p2_committed {
            game.phase = PokerPhase::Betting1;
            game.current_turn = game.player1;
            game.phase_deadline = now + WINDOW;
        }
        Ok(outcome)
    }

    async fn take_action(&self, game_id: u64, action: PokerAction, value: U256) -> Result<TxOutcome, ArenaError> {
        Self::check_game_id(game_id)?;
        let now = self.chain.now();
        let mut state = self.chain.state.lock().unwrap();
        let outcome = self.tx(&mut state, "takeAction");
        let game = state.poker.as_mut().unwrap();
        let seat = game.seat_of(self.address).ok_or_else(|| revert("not a player"))?;
        if !game.phase.is_betting() || game.current_turn != self.address {
            return Err(revert("not your turn"));
        }
        let other = game.player(seat.other());
        let mut advance = false;
        match action {
            PokerAction::Check if game.current_bet.is_zero() => {
                if seat == Seat::Player1 {
                    game.current_turn = other;
                } else {
                    advance = true;
                }
            }
            PokerAction::Bet if game.current_bet.is_zero() && !value.is_zero() => {
                game.current_bet = value;
                let extra = game.extra_bets(seat) + value;
                put(seat, &mut game.p1_extra_bets, &mut game.p2_extra_bets, extra);
                game.current_turn = other;
            }
            PokerAction::Raise if value > game.current_bet && !game.current_bet.is_zero() => {
                game.current_bet = value;
                let extra = game.extra_bets(seat) + value;
                put(seat, &mut game.p1_extra_bets, &mut game.p2_extra_bets, extra);
                game.current_turn = other;
            }
            PokerAction::Call if !game.current_bet.is_zero() && value >= game.current_bet => {
                let extra = game.extra_bets(seat) + value;
                put(seat, &mut game.p1_extra_bets, &mut game.p2_extra_bets, extra);
                advance = true;
            }
            PokerAction::Fold => {
                game.settled = true;
                game.phase = PokerPhase::Complete;
                return Ok(outcome);
            }
            _ => return Err(revert("invalid action")),
        }
        if advance {
            game.phase = if game.phase == PokerPhase::Betting1 { PokerPhase::Betting2 } else { PokerPhase::Showdown };
            game.current_bet = U256::ZERO;
            game.current_turn = game.player1;
        }
        game.phase_deadline = now + WINDOW;
        Ok(outcome)
    }

    async fn reveal_hand(&self, game_id: u64, hand: u8, salt: Salt) -> Result<TxOutcome, ArenaError> {
        Self::check_game_id(game_id)?;
        let mut state = self.chain.state.lock().unwrap();
        let outcome = self.tx(&mut state, "revealHand");
        let game = state.poker.as_mut().unwrap();
        let seat = game.seat_of(self.address).ok_or_else(|| revert("not a player"))?;
        if game.phase != PokerPhase::Showdown || game.revealed(seat) {
            return Err(revert("not in showdown"));
        }
        if game.commit_of(seat) != Some(commit_hash(hand, &salt)) {
            return Err(revert("hash mismatch"));
        }
        put(seat, &mut game.p1_hand_value, &mut game.p2_hand_value, hand);
        put(seat, &mut game.p1_revealed, &mut game.p2_revealed, true);
        if game.p1_revealed && game.p2_revealed {
            game.settled = true;
            game.phase = PokerPhase::Complete;
        }
        Ok(outcome)
    }
}

#[async_trait]
impl AuctionContract for SimPlayer {
    async fn auction_game(&self, game_id: u64) -> Result<AuctionGame, ArenaError> {
        Self::check_game_id(game_id)?;
        Ok(self.chain.auction_game())
    }

    async fn commit_bid(&self, game_id: u64, hash: Hash) -> Result<TxOutcome, ArenaError> {
        Self::check_game_id(game_id)?;
        let now = self.chain.now();
        let mut state = self.chain.state.lock().unwrap();
        let outcome = self.tx(&mut state, "commitBid");
        let game = state.auction.as_mut().unwrap();
        let seat = game.seat_of(self.address).ok_or_else(|| revert("not a player"))?;
        if game.phase != AuctionPhase::Commit || game.committed(seat) {
            return Err(revert("not in commit phase"));
        }
        put(seat, &mut game.p1_bid_hash, &mut game.p2_bid_hash, hash);
        put(seat, &mut game.p1_committed, &mut game.p2_committed, true);
        if game.p1_committed && game.p2_committed {
            game.phase = AuctionPhase::Reveal;
            game.phase_deadline = now + WINDOW;
        }
        Ok(outcome)
    }

    async fn reveal_bid(&self, game_id: u64, bid: U256, salt: Salt) -> Result<TxOutcome, ArenaError> {
        Self::check_game_id(game_id)?;
        let mut state = self.chain.state.lock().unwrap();
        let outcome = self.tx(&mut state, "revealBid");
        let game = state.auction.as_mut().unwrap();
        let seat = game.seat_of(self.address).ok_or_else(|| revert("not a player"))?;
        if game.phase != AuctionPhase::Reveal || game.revealed(seat) {
            return Err(revert("not in reveal phase"));
        }
        if game.bid_hash(seat) != Some(commit_bid_hash(bid, &salt)) {
            return Err(revert("hash mismatch"));
        }
        put(seat, &mut game.p1_bid, &mut game.p2_bid, bid);
        put(seat, &mut game.p1_revealed, &mut game.p2_revealed, true);
        if game.p1_revealed && game.p2_revealed {
            game.settled = true;
            game.phase = AuctionPhase::Complete;
        }
        Ok(outcome)
    }
}
