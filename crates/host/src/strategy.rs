//! Move, hand and bid selection when the operator does not pin a value

use std::str::FromStr;

use arena_core::rules::counter;
use arena_core::{Move, PokerAction, U256};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::ArenaError;

/// One revealed round as `(my_move, opponent_move)`
pub type RoundPair = (Move, Move);

/// Below this a prediction is noise and the move is random
pub const MIN_CONFIDENCE: f64 = 0.4;

/// Recent win rate under which adaptive play stops predicting
pub const EXPLOITED_WIN_RATE: f64 = 0.35;

/// Rounds looked at by [`recent_win_rate`]
pub const RECENT_WINDOW: usize = 5;

/// A predicted opponent move, answered with the move that beats it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub reply: Move,
    pub confidence: f64,
}

impl Prediction {
    fn countering(predicted: Move, confidence: f64) -> Self {
        Self { reply: counter(predicted), confidence }
    }
}

/// The move to commit and what picked it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pick {
    pub mv: Move,
    pub source: &'static str,
    pub confidence: f64,
}

impl Pick {
    fn random(source: &'static str) -> Self {
        Self { mv: random_move(), source, confidence: 0.0 }
    }

    fn predicted(prediction: Option<Prediction>, source: &'static str) -> Self {
        match prediction {
            Some(p) if p.confidence >= MIN_CONFIDENCE => Self { mv: p.reply, source, confidence: p.confidence },
            _ => Self::random("random"),
        }
    }
}

/// How RPS moves are chosen each round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RpsStrategy {
    /// Same move every round
    Fixed(Move),
    /// Uniform over rock, paper, scissors
    Random,
    /// Counter the opponent's most frequent move
    Frequency,
    /// Counter the likeliest follow-up to the opponent's last move
    Markov,
    /// Counter repeating cycles and win-stay/lose-shift habits
    Sequence,
    /// Most confident of the three predictors, random when being exploited
    #[default]
    Adaptive,
}

impl FromStr for RpsStrategy {
    type Err = ArenaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "frequency" => Ok(Self::Frequency),
            "markov" => Ok(Self::Markov),
            "sequence" => Ok(Self::Sequence),
            "adaptive" => Ok(Self::Adaptive),
            other => Ok(Self::Fixed(other.parse()?)),
        }
    }
}

fn random_move() -> Move {
    Move::ALL.choose(&mut rand::thread_rng()).copied().unwrap_or(Move::Rock)
}

/// Most frequent move, ties going to the one seen first
fn most_common(moves: impl IntoIterator<Item = Move>) -> Option<(Move, usize)> {
    let mut counts: Vec<(Move, usize)> = Vec::with_capacity(3);
    for m in moves {
        match counts.iter_mut().find(|(seen, _)| *seen == m) {
            Some((_, n)) => *n += 1,
            None => counts.push((m, 1)),
        }
    }
    counts.into_iter().fold(None, |best, (m, n)| match best {
        Some((_, top)) if top >= n => best,
        _ => Some((m, n)),
    })
}

/// Counter the opponent's most common move; confidence is its share
pub fn frequency_predict(history: &[RoundPair]) -> Option<Prediction> {
    let (m, n) = most_common(history.iter().map(|(_, theirs)| *theirs))?;
    Some(Prediction::countering(m, n as f64 / history.len() as f64))
}

/// First-order transitions out of the opponent's last move; needs 5 rounds
pub fn markov_predict(history: &[RoundPair]) -> Option<Prediction> {
    if history.len() < 5 {
        return None;
    }
    let theirs: Vec<Move> = history.iter().map(|(_, t)| *t).collect();
    let last = *theirs.last()?;
    let followers: Vec<Move> = theirs.windows(2).filter(|w| w[0] == last).map(|w| w[1]).collect();
    let (m, n) = most_common(followers.iter().copied())?;
    Some(Prediction::countering(m, n as f64 / followers.len() as f64))
}

/// Whether `a` beat `b`
fn won(a: Move, b: Move) -> bool {
    arena_core::rules::beats(a, b)
}

/// A repeated cycle of 2-4 moves at the end of the opponent's history
fn cycle_predict(theirs: &[Move]) -> Option<Prediction> {
    let mut best: Option<Prediction> = None;
    for window in 2..=4usize {
        if theirs.len() < window * 2 {
            continue;
        }
        let recent = &theirs[theirs.len() - window..];
        let prior = &theirs[theirs.len() - window * 2..theirs.len() - window];
        if recent != prior {
            continue;
        }
        let repeats = (0..theirs.len() - window)
            .step_by(window)
            .filter(|offset| &theirs[*offset..*offset + window] == recent)
            .count();
        let confidence = (0.5 + repeats as f64 * 0.1).min(0.9);
        if best.map_or(true, |b| confidence > b.confidence) {
            best = Some(Prediction::countering(recent[0], confidence));
        }
    }
    best
}

/// Win-stay/lose-shift: repeat after a win, switch after a loss
fn win_stay_lose_shift(history: &[RoundPair]) -> Option<Prediction> {
    let mut consistent = 0usize;
    let mut checked = 0usize;
    let mut shifted_to = Vec::new();
    for pair in history.windows(2) {
        let ((mine_prev, theirs_prev), (_, theirs_now)) = (pair[0], pair[1]);
        if won(theirs_prev, mine_prev) {
            checked += 1;
            consistent += usize::from(theirs_now == theirs_prev);
        } else if won(mine_prev, theirs_prev) {
            checked += 1;
            if theirs_now != theirs_prev {
                consistent += 1;
                shifted_to.push(theirs_now);
            }
        }
    }
    if checked < 3 || consistent == 0 {
        return None;
    }
    let confidence = consistent as f64 / checked as f64;
    let (mine_last, theirs_last) = *history.last()?;
    if won(theirs_last, mine_last) {
        Some(Prediction::countering(theirs_last, confidence))
    } else {
        let (target, _) = most_common(shifted_to)?;
        Some(Prediction::countering(target, confidence))
    }
}

/// Cycles or win-stay/lose-shift, whichever is more confident; needs 4 rounds
pub fn sequence_predict(history: &[RoundPair]) -> Option<Prediction> {
    if history.len() < 4 {
        return None;
    }
    let theirs: Vec<Move> = history.iter().map(|(_, t)| *t).collect();
    let cycle = cycle_predict(&theirs);
    let habit = win_stay_lose_shift(history);
    match (cycle, habit) {
        (Some(c), Some(h)) if c.confidence > h.confidence => Some(c),
        (_, Some(h)) => Some(h),
        (c, None) => c,
    }
}

/// Share of the last `window` rounds we won, 0.5 with no rounds
pub fn recent_win_rate(history: &[RoundPair], window: usize) -> f64 {
    let recent = &history[history.len().saturating_sub(window)..];
    if recent.is_empty() {
        return 0.5;
    }
    let wins = recent.iter().filter(|(mine, theirs)| won(*mine, *theirs)).count();
    wins as f64 / recent.len() as f64
}

impl RpsStrategy {
    /// Pick a move from this game's rounds and earlier games against the
    /// same opponent
    ///
    /// Predictors see `prior` followed by `game`. The exploitation check
    /// looks at `game` alone.
    pub fn choose(&self, game: &[RoundPair], prior: &[RoundPair]) -> Pick {
        let all: Vec<RoundPair> = prior.iter().chain(game).copied().collect();
        match self {
            Self::Fixed(m) => Pick { mv: *m, source: "fixed", confidence: 1.0 },
            Self::Random => Pick::random("random"),
            Self::Frequency => Pick::predicted(frequency_predict(&all), "frequency"),
            Self::Markov => Pick::predicted(markov_predict(&all), "markov"),
            Self::Sequence => Pick::predicted(sequence_predict(&all), "sequence"),
            Self::Adaptive => {
                if game.len() > RECENT_WINDOW && recent_win_rate(game, RECENT_WINDOW) < EXPLOITED_WIN_RATE {
                    return Pick::random("anti-exploit");
                }
                let candidates = [
                    (sequence_predict(&all), "sequence"),
                    (markov_predict(&all), "markov"),
                    (frequency_predict(&all), "frequency"),
                ];
                let best = candidates
                    .into_iter()
                    .filter_map(|(p, source)| p.map(|p| (p, source)))
                    .fold(None::<(Prediction, &'static str)>, |best, (p, source)| match best {
                        Some((top, _)) if top.confidence >= p.confidence => best,
                        _ => Some((p, source)),
                    });
                match best {
                    Some((p, source)) => Pick::predicted(Some(p), source),
                    None => Pick::random("random"),
                }
            }
        }
    }
}

/// Hand strength committed in poker, 1..=100
pub const MIN_HAND: u8 = 1;
pub const MAX_HAND: u8 = 100;

pub fn random_hand() -> u8 {
    rand::thread_rng().gen_range(MIN_HAND..=MAX_HAND)
}

/// Betting decisions for poker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PokerPolicy {
    /// Hands at or above this bet when checked to, or raise when bet into
    pub strong_hand: u8,
    /// Hands at or above this call a bet, weaker ones fold
    pub call_threshold: u8,
    /// Bet size as percent of the wager
    pub bet_percent: u64,
}

impl Default for PokerPolicy {
    fn default() -> Self {
        Self { strong_hand: 70, call_threshold: 30, bet_percent: 20 }
    }
}

impl PokerPolicy {
    /// Action for our turn and the value it carries
    ///
    /// `facing_bet` is the outstanding bet we must match, zero when checked to.
    pub fn decide(&self, hand: u8, wager: U256, facing_bet: U256) -> (PokerAction, U256) {
        let bet = wager * U256::from(self.bet_percent) / U256::from(100u64);
        if facing_bet.is_zero() {
            if hand >= self.strong_hand && !bet.is_zero() {
                (PokerAction::Bet, bet)
            } else {
                (PokerAction::Check, U256::ZERO)
            }
        } else if hand >= self.strong_hand {
            (PokerAction::Raise, facing_bet + bet)
        } else if hand >= self.call_threshold {
            (PokerAction::Call, facing_bet)
        } else {
            (PokerAction::Fold, U256::ZERO)
        }
    }
}

/// Auction bid as a fraction of the wager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuctionBidPolicy {
    pub percent: u64,
}

impl Default for AuctionBidPolicy {
    fn default() -> Self {
        Self { percent: 50 }
    }
}

impl AuctionBidPolicy {
    pub fn bid(&self, wager: U256) -> U256 {
        wager * U256::from(self.percent.min(100)) / U256::from(100u64)
    }
}
