//! PokerGame contract

use arena_core::abi::{encode_call, Token, Words};
use arena_core::{AbiError, Address, Hash, PokerAction, PokerPhase, Salt, Seat, U256};
use serde::Serialize;

use crate::nonzero;

pub const GAME_CREATED: &str = "GameCreated(uint256,uint256)";

pub fn create_game(match_id: u64) -> Vec<u8> {
    encode_call("createGame(uint256)", &[match_id.into()])
}

pub fn commit_hand(game_id: u64, hash: Hash) -> Vec<u8> {
    encode_call("commitHand(uint256,bytes32)", &[game_id.into(), Token::FixedBytes(hash)])
}

/// `takeAction(uint256,uint8)`; bets and raises carry value
pub fn take_action(game_id: u64, action: PokerAction) -> Vec<u8> {
    encode_call("takeAction(uint256,uint8)", &[game_id.into(), (action as u8).into()])
}

pub fn reveal_hand(game_id: u64, hand_value: u8, salt: Salt) -> Vec<u8> {
    encode_call(
        "revealHand(uint256,uint8,bytes32)",
        &[game_id.into(), hand_value.into(), Token::FixedBytes(salt)],
    )
}

/// Poker game state
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PokerGame {
    pub escrow_match_id: u64,
    pub player1: Address,
    pub player2: Address,
    pub p1_commit: Hash,
    pub p2_commit: Hash,
    pub p1_hand_value: u8,
    pub p2_hand_value: u8,
    pub p1_committed: bool,
    pub p2_committed: bool,
    pub p1_revealed: bool,
    pub p2_revealed: bool,
    pub phase: PokerPhase,
    pub phase_deadline: u64,
    pub settled: bool,
    pub current_bet: U256,
    pub current_turn: Address,
    pub p1_extra_bets: U256,
    pub p2_extra_bets: U256,
}

impl PokerGame {
    pub fn decode(data: &[u8]) -> Result<Self, AbiError> {
        let w = Words::new(data);
        w.require(18)?;
        Ok(Self {
            escrow_match_id: w.u64(0)?,
            player1: w.address(1)?,
            player2: w.address(2)?,
            p1_commit: w.bytes32(3)?,
            p2_commit: w.bytes32(4)?,
            p1_hand_value: w.u8(5)?,
            p2_hand_value: w.u8(6)?,
            p1_committed: w.bool(7)?,
            p2_committed: w.bool(8)?,
            p1_revealed: w.bool(9)?,
            p2_revealed: w.bool(10)?,
            phase: PokerPhase::try_from(w.u8(11)?)?,
            phase_deadline: w.u64(12)?,
            settled: w.bool(13)?,
            current_bet: w.u256(14)?,
            current_turn: w.address(15)?,
            p1_extra_bets: w.u256(16)?,
            p2_extra_bets: w.u256(17)?,
        })
    }

    pub fn seat_of(&self, who: Address) -> Option<Seat> {
        Seat::of(who, self.player1, self.player2)
    }

    pub fn committed(&self, seat: Seat) -> bool {
        seat.pick(self.p1_committed, self.p2_committed)
    }

    pub fn commit_of(&self, seat: Seat) -> Option<Hash> {
        nonzero(seat.pick(self.p1_commit, self.p2_commit))
    }

    pub fn revealed(&self, seat: Seat) -> bool {
        seat.pick(self.p1_revealed, self.p2_revealed)
    }

    pub fn player(&self, seat: Seat) -> Address {
        seat.pick(self.player1, self.player2)
    }

    pub fn extra_bets(&self, seat: Seat) -> U256 {
        seat.pick(self.p1_extra_bets, self.p2_extra_bets)
    }

    pub fn hand_value(&self, seat: Seat) -> u8 {
        seat.pick(self.p1_hand_value, self.p2_hand_value)
    }
}
