//! TournamentV2 contract

use arena_core::abi::{encode_call, Words};
use arena_core::{AbiError, Address, TournamentFormat, TournamentStatus, U256};
use serde::Serialize;

pub const TOURNAMENT_CREATED: &str = "TournamentCreated(uint256,uint8,uint256,uint256,uint8)";

/// `createTournament(uint8 format, uint256 entryFee, uint256 baseWager, uint8 maxPlayers)`
pub fn create_tournament(format: TournamentFormat, entry_fee: U256, base_wager: U256, max_players: u8) -> Vec<u8> {
    encode_call(
        "createTournament(uint8,uint256,uint256,uint8)",
        &[(format as u8).into(), entry_fee.into(), base_wager.into(), max_players.into()],
    )
}

/// `register(uint256)`, payable with the entry fee
pub fn register(tournament_id: u64) -> Vec<u8> {
    encode_call("register(uint256)", &[tournament_id.into()])
}

pub fn generate_schedule(tournament_id: u64) -> Vec<u8> {
    encode_call("generateSchedule(uint256)", &[tournament_id.into()])
}

pub fn get_tournament(tournament_id: u64) -> Vec<u8> {
    encode_call("getTournament(uint256)", &[tournament_id.into()])
}

pub fn get_participants(tournament_id: u64) -> Vec<u8> {
    encode_call("getParticipants(uint256)", &[tournament_id.into()])
}

pub fn rr_total_matches(tournament_id: u64) -> Vec<u8> {
    encode_call("rrTotalMatches(uint256)", &[tournament_id.into()])
}

pub fn get_rr_match(tournament_id: u64, index: u64) -> Vec<u8> {
    encode_call("getRRMatch(uint256,uint256)", &[tournament_id.into(), index.into()])
}

pub fn next_tournament_id() -> Vec<u8> {
    encode_call("nextTournamentId()", &[])
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub format: TournamentFormat,
    pub entry_fee: U256,
    pub base_wager: U256,
    pub max_players: u8,
    pub player_count: u8,
    pub prize_pool: U256,
    pub status: TournamentStatus,
    pub creator: Address,
}

impl Tournament {
    pub fn decode(data: &[u8]) -> Result<Self, AbiError> {
        let w = Words::new(data);
        w.require(8)?;
        Ok(Self {
            format: TournamentFormat::try_from(w.u8(0)?)?,
            entry_fee: w.u256(1)?,
            base_wager: w.u256(2)?,
            max_players: w.u8(3)?,
            player_count: w.u8(4)?,
            prize_pool: w.u256(5)?,
            status: TournamentStatus::try_from(w.u8(6)?)?,
            creator: w.address(7)?,
        })
    }

    pub const fn is_full(&self) -> bool {
        self.player_count >= self.max_players
    }
}

/// One scheduled round-robin pairing
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoundRobinMatch {
    pub player1: Address,
    pub player2: Address,
    pub winner: Address,
    pub reported: bool,
}

impl RoundRobinMatch {
    pub fn decode(data: &[u8]) -> Result<Self, AbiError> {
        let w = Words::new(data);
        w.require(4)?;
        Ok(Self {
            player1: w.address(0)?,
            player2: w.address(1)?,
            winner: w.address(2)?,
            reported: w.bool(3)?,
        })
    }
}

pub fn decode_participants(data: &[u8]) -> Result<Vec<Address>, AbiError> {
    Words::new(data).address_array(0)
}
