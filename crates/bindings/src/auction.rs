//! AuctionGame contract (sealed-bid, single commit/reveal pass)

use arena_core::abi::{encode_call, Token, Words};
use arena_core::{AbiError, Address, AuctionPhase, Hash, Salt, Seat, U256};
use serde::Serialize;

use crate::nonzero;

pub const GAME_CREATED: &str = "GameCreated(uint256,uint256,uint256)";

pub fn create_game(match_id: u64) -> Vec<u8> {
    encode_call("createGame(uint256)", &[match_id.into()])
}

pub fn commit_bid(game_id: u64, hash: Hash) -> Vec<u8> {
    encode_call("commitBid(uint256,bytes32)", &[game_id.into(), Token::FixedBytes(hash)])
}

pub fn reveal_bid(game_id: u64, bid: U256, salt: Salt) -> Vec<u8> {
    encode_call(
        "revealBid(uint256,uint256,bytes32)",
        &[game_id.into(), bid.into(), Token::FixedBytes(salt)],
    )
}

/// Auction game state
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionGame {
    pub escrow_match_id: u64,
    pub player1: Address,
    pub player2: Address,
    pub prize: U256,
    pub p1_bid_hash: Hash,
    pub p2_bid_hash: Hash,
    pub p1_bid: U256,
    pub p2_bid: U256,
    pub p1_committed: bool,
    pub p2_committed: bool,
    pub p1_revealed: bool,
    pub p2_revealed: bool,
    pub phase: AuctionPhase,
    pub phase_deadline: u64,
    pub settled: bool,
}

impl AuctionGame {
    pub fn decode(data: &[u8]) -> Result<Self, AbiError> {
        let w = Words::new(data);
        w.require(15)?;
        Ok(Self {
            escrow_match_id: w.u64(0)?,
            player1: w.address(1)?,
            player2: w.address(2)?,
            prize: w.u256(3)?,
            p1_bid_hash: w.bytes32(4)?,
            p2_bid_hash: w.bytes32(5)?,
            p1_bid: w.u256(6)?,
            p2_bid: w.u256(7)?,
            p1_committed: w.bool(8)?,
            p2_committed: w.bool(9)?,
            p1_revealed: w.bool(10)?,
            p2_revealed: w.bool(11)?,
            phase: AuctionPhase::try_from(w.u8(12)?)?,
            phase_deadline: w.u64(13)?,
            settled: w.bool(14)?,
        })
    }

    pub fn seat_of(&self, who: Address) -> Option<Seat> {
        Seat::of(who, self.player1, self.player2)
    }

    pub fn committed(&self, seat: Seat) -> bool {
        seat.pick(self.p1_committed, self.p2_committed)
    }

    pub fn bid_hash(&self, seat: Seat) -> Option<Hash> {
        nonzero(seat.pick(self.p1_bid_hash, self.p2_bid_hash))
    }

    pub fn revealed(&self, seat: Seat) -> bool {
        seat.pick(self.p1_revealed, self.p2_revealed)
    }

    pub fn bid(&self, seat: Seat) -> U256 {
        seat.pick(self.p1_bid, self.p2_bid)
    }
}
