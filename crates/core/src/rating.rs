//! ELO win probabilities, Kelly wager sizing and market edge detection

use serde::Serialize;

use crate::types::U256;

/// Bankroll share never exceeded by a recommendation
pub const MAX_BANKROLL_FRACTION: f64 = 0.05;

/// Minimum balance, in multiples of the minimum wager, before sizing kicks in
pub const MIN_VIABLE_MULTIPLE: u64 = 10;

/// Edge required before recommending a market position
pub const DEFAULT_MIN_EDGE: f64 = 0.05;

/// `P(A wins) = 1 / (1 + 10^((elo_b - elo_a) / 400))`
pub fn win_probability(elo_a: u64, elo_b: u64) -> f64 {
    let exponent = (elo_b as f64 - elo_a as f64) / 400.0;
    1.0 / (1.0 + 10f64.powf(exponent))
}

/// Half-Kelly wager for an even-money game, clamped to `[min, max]`
///
/// With no edge, or a bankroll below ten minimum wagers, the minimum is
/// returned.
pub fn recommend_wager(balance: U256, win_prob: f64, min_wager: U256, max_wager: U256) -> U256 {
    let edge = 2.0 * win_prob - 1.0;
    if edge <= 0.0 {
        return min_wager;
    }
    if balance < min_wager.saturating_mul(U256::from(MIN_VIABLE_MULTIPLE)) {
        return min_wager;
    }

    let fraction = (edge / 2.0).min(MAX_BANKROLL_FRACTION);
    let bps = (fraction * 10_000.0).floor() as u64;
    let wager = balance.saturating_mul(U256::from(bps)) / U256::from(10_000u64);

    wager.min(max_wager).max(min_wager)
}

/// Prediction market side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Player 1 wins
    Yes,
    /// Player 2 wins
    No,
}

/// Comparison of the ELO estimate against market pricing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketEdge {
    pub recommend: bool,
    pub side: Option<Side>,
    pub elo_prob: f64,
    pub market_prob: f64,
    pub edge: f64,
}

/// Recommend a side when the ELO probability beats the YES/NO price split by `min_edge`
pub fn market_edge(elo_p1: u64, elo_p2: u64, yes_price: U256, no_price: U256, min_edge: f64) -> MarketEdge {
    let elo_prob = win_probability(elo_p1, elo_p2);
    let yes = crate::units::to_f64(yes_price);
    let total = yes + crate::units::to_f64(no_price);
    if total <= 0.0 {
        return MarketEdge { recommend: false, side: None, elo_prob, market_prob: 0.5, edge: 0.0 };
    }

    let market_prob = yes / total;
    let yes_edge = elo_prob - market_prob;
    let (recommend, side) = if yes_edge >= min_edge {
        (true, Some(Side::Yes))
    } else if -yes_edge >= min_edge {
        (true, Some(Side::No))
    } else {
        (false, None)
    };

    MarketEdge { recommend, side, elo_prob, market_prob, edge: yes_edge.abs() }
}
