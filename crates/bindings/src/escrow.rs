//! Escrow contract

use arena_core::abi::{encode_call, Words};
use arena_core::{AbiError, Address, MatchStatus, U256};
use serde::Serialize;

pub const MATCH_CREATED: &str = "MatchCreated(uint256,address,address,uint256,address)";

/// `createMatch(address opponent, address gameContract)`, payable with the wager
pub fn create_match(opponent: Address, game_contract: Address) -> Vec<u8> {
    encode_call("createMatch(address,address)", &[opponent.into(), game_contract.into()])
}

/// `acceptMatch(uint256)`, payable with the matching wager
pub fn accept_match(match_id: u64) -> Vec<u8> {
    encode_call("acceptMatch(uint256)", &[match_id.into()])
}

pub fn get_match(match_id: u64) -> Vec<u8> {
    encode_call("getMatch(uint256)", &[match_id.into()])
}

pub fn next_match_id() -> Vec<u8> {
    encode_call("nextMatchId()", &[])
}

pub fn winners(match_id: u64) -> Vec<u8> {
    encode_call("winners(uint256)", &[match_id.into()])
}

/// Escrow match
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub player1: Address,
    pub player2: Address,
    pub wager: U256,
    pub game_contract: Address,
    pub status: MatchStatus,
    pub created_at: u64,
}

impl Match {
    /// Decode `getMatch` return data
    pub fn decode(data: &[u8]) -> Result<Self, AbiError> {
        let w = Words::new(data);
        w.require(6)?;
        Ok(Self {
            player1: w.address(0)?,
            player2: w.address(1)?,
            wager: w.u256(2)?,
            game_contract: w.address(3)?,
            status: MatchStatus::try_from(w.u8(4)?)?,
            created_at: w.u64(5)?,
        })
    }

    pub fn involves(&self, who: Address) -> bool {
        self.player1 == who || self.player2 == who
    }

    /// The other player, when `who` is one of them
    pub fn opponent_of(&self, who: Address) -> Option<Address> {
        if who == self.player1 {
            Some(self.player2)
        } else if who == self.player2 {
            Some(self.player1)
        } else {
            None
        }
    }
}
