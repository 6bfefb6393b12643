//! Rock-paper-scissors round resolution, mirroring `RPSGame._resolveRound`

use serde::Serialize;

use crate::types::Move;

/// Which seat took a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundOutcome {
    Player1,
    Player2,
    Draw,
}

/// Rock beats scissors, paper beats rock, scissors beats paper.
pub const fn beats(a: Move, b: Move) -> bool {
    matches!(
        (a, b),
        (Move::Rock, Move::Scissors) | (Move::Paper, Move::Rock) | (Move::Scissors, Move::Paper)
    )
}

pub fn round_winner(p1: Move, p2: Move) -> RoundOutcome {
    if p1 == p2 {
        RoundOutcome::Draw
    } else if beats(p1, p2) {
        RoundOutcome::Player1
    } else {
        RoundOutcome::Player2
    }
}

/// Running score over revealed rounds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub player1: u32,
    pub player2: u32,
    pub draws: u32,
}

impl Tally {
    pub fn record(&mut self, outcome: RoundOutcome) {
        match outcome {
            RoundOutcome::Player1 => self.player1 += 1,
            RoundOutcome::Player2 => self.player2 += 1,
            RoundOutcome::Draw => self.draws += 1,
        }
    }

    /// Leader so far, `Draw` when level
    pub const fn leader(&self) -> RoundOutcome {
        if self.player1 > self.player2 {
            RoundOutcome::Player1
        } else if self.player2 > self.player1 {
            RoundOutcome::Player2
        } else {
            RoundOutcome::Draw
        }
    }
}

/// Move that beats `m`
pub const fn counter(m: Move) -> Move {
    match m {
        Move::Rock => Move::Paper,
        Move::Paper => Move::Scissors,
        Move::Scissors => Move::Rock,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_pairings() {
        for a in Move::ALL {
            for b in Move::ALL {
                let outcome = round_winner(a, b);
                if a == b {
                    assert_eq!(outcome, RoundOutcome::Draw);
                } else {
                    // exactly one side wins a non-draw
                    assert_ne!(beats(a, b), beats(b, a));
                    assert_eq!(outcome == RoundOutcome::Player1, beats(a, b));
                }
            }
        }
        assert_eq!(round_winner(Move::Rock, Move::Scissors), RoundOutcome::Player1);
        assert_eq!(round_winner(Move::Rock, Move::Paper), RoundOutcome::Player2);
        assert_eq!(round_winner(Move::Scissors, Move::Paper), RoundOutcome::Player1);
    }

    #[test]
    fn test_counter_beats() {
        for m in Move::ALL {
            assert!(beats(counter(m), m));
        }
    }

    #[test]
    fn test_tally() {
        let mut tally = Tally::default();
        tally.record(RoundOutcome::Player1);
        tally.record(RoundOutcome::Draw);
        assert_eq!(tally.leader(), RoundOutcome::Player1);
        tally.record(RoundOutcome::Player2);
        assert_eq!(tally.leader(), RoundOutcome::Draw);
        assert_eq!(tally.draws, 1);
    }
}
