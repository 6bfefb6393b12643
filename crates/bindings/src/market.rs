//! PredictionMarket contract (constant-product YES/NO market per match)

use arena_core::abi::{encode_call, Words};
use arena_core::{AbiError, Address, U256};
use serde::Serialize;

pub const MARKET_CREATED: &str = "MarketCreated(uint256,uint256,uint256)";

/// `createMarket(uint256 matchId)`, payable with seed liquidity
pub fn create_market(match_id: u64) -> Vec<u8> {
    encode_call("createMarket(uint256)", &[match_id.into()])
}

pub fn buy_yes(market_id: u64) -> Vec<u8> {
    encode_call("buyYES(uint256)", &[market_id.into()])
}

pub fn buy_no(market_id: u64) -> Vec<u8> {
    encode_call("buyNO(uint256)", &[market_id.into()])
}

pub fn resolve(market_id: u64) -> Vec<u8> {
    encode_call("resolve(uint256)", &[market_id.into()])
}

pub fn redeem(market_id: u64) -> Vec<u8> {
    encode_call("redeem(uint256)", &[market_id.into()])
}

pub fn get_market(market_id: u64) -> Vec<u8> {
    encode_call("getMarket(uint256)", &[market_id.into()])
}

pub fn get_price(market_id: u64) -> Vec<u8> {
    encode_call("getPrice(uint256)", &[market_id.into()])
}

pub fn get_user_balances(market_id: u64, user: Address) -> Vec<u8> {
    encode_call("getUserBalances(uint256,address)", &[market_id.into(), user.into()])
}

pub fn next_market_id() -> Vec<u8> {
    encode_call("nextMarketId()", &[])
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    pub match_id: u64,
    pub reserve_yes: U256,
    pub reserve_no: U256,
    pub seed_liquidity: U256,
    pub player1: Address,
    pub player2: Address,
    pub resolved: bool,
    pub winner: Address,
}

impl Market {
    pub fn decode(data: &[u8]) -> Result<Self, AbiError> {
        let w = Words::new(data);
        w.require(8)?;
        Ok(Self {
            match_id: w.u64(0)?,
            reserve_yes: w.u256(1)?,
            reserve_no: w.u256(2)?,
            seed_liquidity: w.u256(3)?,
            player1: w.address(4)?,
            player2: w.address(5)?,
            resolved: w.bool(6)?,
            winner: w.address(7)?,
        })
    }
}

/// Outcome token prices, scaled to 1e18
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Prices {
    pub yes: U256,
    pub no: U256,
}

impl Prices {
    pub fn decode(data: &[u8]) -> Result<Self, AbiError> {
        let w = Words::new(data);
        Ok(Self { yes: w.u256(0)?, no: w.u256(1)? })
    }
}

/// A user's outcome token holdings
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Balances {
    pub yes: U256,
    pub no: U256,
}

impl Balances {
    pub fn decode(data: &[u8]) -> Result<Self, AbiError> {
        let w = Words::new(data);
        Ok(Self { yes: w.u256(0)?, no: w.u256(1)? })
    }
}
