//! Common types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

pub use alloy_primitives::{Address, U256};

/// 32-byte hash type
pub type Hash = [u8; 32];

/// 32-byte commitment salt
pub type Salt = [u8; 32];

/// Game type, matching the `GameType` enum in AgentRegistry.sol
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum GameType {
    Rps = 0,
    Poker = 1,
    Auction = 2,
}

impl GameType {
    /// All game types, in registry order
    pub const ALL: [Self; 3] = [Self::Rps, Self::Poker, Self::Auction];

    /// On-chain discriminant
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Lowercase name used in keys and JSON output
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rps => "rps",
            Self::Poker => "poker",
            Self::Auction => "auction",
        }
    }

    /// Map an on-chain discriminant back to a game type
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Rps),
            1 => Some(Self::Poker),
            2 => Some(Self::Auction),
            _ => None,
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rps" | "rock-paper-scissors" | "0" => Ok(Self::Rps),
            "poker" | "1" => Ok(Self::Poker),
            "auction" | "2" => Ok(Self::Auction),
            other => Err(ParseError::GameType(other.to_string())),
        }
    }
}

/// Which side of a two-player game an address occupies
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seat {
    Player1,
    Player2,
}

impl Seat {
    /// Seat of `me` given both players, `None` for an outsider
    pub fn of(me: Address, player1: Address, player2: Address) -> Option<Self> {
        if me == player1 {
            Some(Self::Player1)
        } else if me == player2 {
            Some(Self::Player2)
        } else {
            None
        }
    }

    pub const fn other(self) -> Self {
        match self {
            Self::Player1 => Self::Player2,
            Self::Player2 => Self::Player1,
        }
    }

    /// Select this seat's half of a `(player1, player2)` pair
    pub fn pick<T>(self, p1: T, p2: T) -> T {
        match self {
            Self::Player1 => p1,
            Self::Player2 => p2,
        }
    }
}

/// Escrow match status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum MatchStatus {
    Created = 0,
    Active = 1,
    Settled = 2,
    Cancelled = 3,
}

impl TryFrom<u8> for MatchStatus {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Created),
            1 => Ok(Self::Active),
            2 => Ok(Self::Settled),
            3 => Ok(Self::Cancelled),
            value => Err(ParseError::Discriminant { kind: "match status", value }),
        }
    }
}

/// Rock-paper-scissors move, matching `RPSGame.Move`
///
/// `0` is the contract's "no move" marker and has no variant here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Move {
    Rock = 1,
    Paper = 2,
    Scissors = 3,
}

impl Move {
    /// Every playable move
    pub const ALL: [Self; 3] = [Self::Rock, Self::Paper, Self::Scissors];

    /// Value committed and revealed on-chain
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Decode a revealed move; `0` (not revealed) maps to `None`
    pub fn from_value(value: u8) -> Result<Option<Self>, ParseError> {
        match value {
            0 => Ok(None),
            1 => Ok(Some(Self::Rock)),
            2 => Ok(Some(Self::Paper)),
            3 => Ok(Some(Self::Scissors)),
            value => Err(ParseError::Discriminant { kind: "move", value }),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Rock => "rock",
            Self::Paper => "paper",
            Self::Scissors => "scissors",
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Move {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rock" | "r" | "1" => Ok(Self::Rock),
            "paper" | "p" | "2" => Ok(Self::Paper),
            "scissors" | "s" | "3" => Ok(Self::Scissors),
            other => Err(ParseError::Move(other.to_string())),
        }
    }
}

/// Defines a `u8`-backed phase enum with a checked `TryFrom<u8>`.
macro_rules! phase_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident = $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        #[repr(u8)]
        pub enum $name {
            $($variant = $value),+
        }

        impl TryFrom<u8> for $name {
            type Error = ParseError;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok(Self::$variant),)+
                    value => Err(ParseError::Discriminant { kind: $kind, value }),
                }
            }
        }
    };
}

phase_enum!(
    /// RPS game phase
    RpsPhase, "rps phase" { Commit = 0, Reveal = 1, Complete = 2 }
);

phase_enum!(
    /// Poker game phase, walked strictly in declaration order
    PokerPhase, "poker phase" { Commit = 0, Betting1 = 1, Betting2 = 2, Showdown = 3, Complete = 4 }
);

phase_enum!(
    /// Sealed-bid auction phase
    AuctionPhase, "auction phase" { Commit = 0, Reveal = 1, Complete = 2 }
);

phase_enum!(
    /// Poker betting action
    PokerAction, "poker action" { None = 0, Check = 1, Bet = 2, Raise = 3, Call = 4, Fold = 5 }
);

phase_enum!(
    /// TournamentV2 format
    TournamentFormat, "tournament format" { RoundRobin = 0, DoubleElimination = 1 }
);

phase_enum!(
    /// TournamentV2 status
    TournamentStatus, "tournament status" { Registration = 0, Active = 1, Complete = 2, Cancelled = 3 }
);

impl PokerPhase {
    /// Whether this is one of the two betting rounds
    pub const fn is_betting(self) -> bool {
        matches!(self, Self::Betting1 | Self::Betting2)
    }
}

impl FromStr for TournamentFormat {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "round-robin" | "rr" | "0" => Ok(Self::RoundRobin),
            "double-elim" | "double-elimination" | "de" | "1" => Ok(Self::DoubleElimination),
            other => Err(ParseError::TournamentFormat(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_type_parse() {
        assert_eq!("RPS".parse::<GameType>().unwrap(), GameType::Rps);
        assert_eq!("auction".parse::<GameType>().unwrap(), GameType::Auction);
        assert_eq!("1".parse::<GameType>().unwrap(), GameType::Poker);
        assert!("chess".parse::<GameType>().is_err());
        assert_eq!(GameType::from_id(2), Some(GameType::Auction));
        assert_eq!(GameType::from_id(7), None);
    }

    #[test]
    fn test_move_values_match_contract() {
        assert_eq!(Move::Rock.value(), 1);
        assert_eq!(Move::Paper.value(), 2);
        assert_eq!(Move::Scissors.value(), 3);
        assert_eq!(Move::from_value(0).unwrap(), None);
        assert_eq!(Move::from_value(3).unwrap(), Some(Move::Scissors));
        assert!(Move::from_value(4).is_err());
        assert_eq!("s".parse::<Move>().unwrap(), Move::Scissors);
    }

    #[test]
    fn test_phase_discriminants() {
        assert_eq!(PokerPhase::try_from(3).unwrap(), PokerPhase::Showdown);
        assert!(PokerPhase::Betting2.is_betting());
        assert!(!PokerPhase::Showdown.is_betting());
        assert!(RpsPhase::try_from(3).is_err());
        assert_eq!(MatchStatus::try_from(1).unwrap(), MatchStatus::Active);
    }

    #[test]
    fn test_seat_of() {
        let a = Address::repeat_byte(0xaa);
        let b = Address::repeat_byte(0xbb);
        assert_eq!(Seat::of(a, a, b), Some(Seat::Player1));
        assert_eq!(Seat::of(b, a, b), Some(Seat::Player2));
        assert_eq!(Seat::of(Address::ZERO, a, b), None);
        assert_eq!(Seat::Player2.other(), Seat::Player1);
        assert_eq!(Seat::Player2.pick(1, 2), 2);
    }
}
