//! RPSGame contract

use arena_core::abi::{encode_call, Token, Words};
use arena_core::{AbiError, Address, Hash, Move, RpsPhase, Salt, Seat};
use serde::Serialize;

use crate::nonzero;

pub const GAME_CREATED: &str = "GameCreated(uint256,uint256,uint256)";

/// `createGame(uint256 matchId, uint256 totalRounds)`
pub fn create_game(match_id: u64, total_rounds: u64) -> Vec<u8> {
    encode_call("createGame(uint256,uint256)", &[match_id.into(), total_rounds.into()])
}

pub fn commit(game_id: u64, hash: Hash) -> Vec<u8> {
    encode_call("commit(uint256,bytes32)", &[game_id.into(), Token::FixedBytes(hash)])
}

pub fn reveal(game_id: u64, mv: Move, salt: Salt) -> Vec<u8> {
    encode_call(
        "reveal(uint256,uint8,bytes32)",
        &[game_id.into(), mv.value().into(), Token::FixedBytes(salt)],
    )
}

pub fn get_round(game_id: u64, round: u64) -> Vec<u8> {
    encode_call("getRound(uint256,uint256)", &[game_id.into(), round.into()])
}

/// RPS game state
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RpsGame {
    pub escrow_match_id: u64,
    pub player1: Address,
    pub player2: Address,
    pub total_rounds: u64,
    pub current_round: u64,
    pub p1_score: u64,
    pub p2_score: u64,
    pub phase: RpsPhase,
    pub phase_deadline: u64,
    pub settled: bool,
}

impl RpsGame {
    pub fn decode(data: &[u8]) -> Result<Self, AbiError> {
        let w = Words::new(data);
        w.require(10)?;
        Ok(Self {
            escrow_match_id: w.u64(0)?,
            player1: w.address(1)?,
            player2: w.address(2)?,
            total_rounds: w.u64(3)?,
            current_round: w.u64(4)?,
            p1_score: w.u64(5)?,
            p2_score: w.u64(6)?,
            phase: RpsPhase::try_from(w.u8(7)?)?,
            phase_deadline: w.u64(8)?,
            settled: w.bool(9)?,
        })
    }

    pub fn seat_of(&self, who: Address) -> Option<Seat> {
        Seat::of(who, self.player1, self.player2)
    }

    pub fn score(&self, seat: Seat) -> u64 {
        seat.pick(self.p1_score, self.p2_score)
    }
}

/// One RPS round
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RpsRound {
    pub p1_commit: Hash,
    pub p2_commit: Hash,
    pub p1_move: Option<Move>,
    pub p2_move: Option<Move>,
    pub p1_revealed: bool,
    pub p2_revealed: bool,
}

impl RpsRound {
    pub fn decode(data: &[u8]) -> Result<Self, AbiError> {
        let w = Words::new(data);
        w.require(6)?;
        Ok(Self {
            p1_commit: w.bytes32(0)?,
            p2_commit: w.bytes32(1)?,
            p1_move: Move::from_value(w.u8(2)?)?,
            p2_move: Move::from_value(w.u8(3)?)?,
            p1_revealed: w.bool(4)?,
            p2_revealed: w.bool(5)?,
        })
    }

    /// On-chain commit for `seat`, `None` until one is made
    pub fn commit_of(&self, seat: Seat) -> Option<Hash> {
        nonzero(seat.pick(self.p1_commit, self.p2_commit))
    }

    pub fn revealed(&self, seat: Seat) -> bool {
        seat.pick(self.p1_revealed, self.p2_revealed)
    }

    /// Both moves, once both players have revealed
    pub fn moves(&self) -> Option<(Move, Move)> {
        if !(self.p1_revealed && self.p2_revealed) {
            return None;
        }
        Some((self.p1_move?, self.p2_move?))
    }
}
