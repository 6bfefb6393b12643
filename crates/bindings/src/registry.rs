//! AgentRegistry contract

use arena_core::abi::{encode_call, Token, Words};
use arena_core::{AbiError, Address, GameType, ParseError, U256};
use serde::Serialize;

/// `register(uint8[] gameTypes, uint256 minWager, uint256 maxWager)`
pub fn register(game_types: &[GameType], min_wager: U256, max_wager: U256) -> Vec<u8> {
    encode_call(
        "register(uint8[],uint256,uint256)",
        &[
            Token::Uint8Array(game_types.iter().map(|g| g.id()).collect()),
            min_wager.into(),
            max_wager.into(),
        ],
    )
}

pub fn get_agent(agent: Address) -> Vec<u8> {
    encode_call("getAgent(address)", &[agent.into()])
}

pub fn elo(agent: Address, game_type: GameType) -> Vec<u8> {
    encode_call("elo(address,uint8)", &[agent.into(), game_type.id().into()])
}

pub fn get_open_agents(game_type: GameType) -> Vec<u8> {
    encode_call("getOpenAgents(uint8)", &[game_type.id().into()])
}

/// Registered agent profile
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentInfo {
    pub wallet: Address,
    pub game_types: Vec<GameType>,
    pub min_wager: U256,
    pub max_wager: U256,
    pub is_open: bool,
    pub exists: bool,
}

impl AgentInfo {
    /// Decode `getAgent`, which returns a single dynamic struct
    pub fn decode(data: &[u8]) -> Result<Self, AbiError> {
        let agent = Words::new(data).tuple_at(0)?;
        agent.require(6)?;
        let game_types = agent
            .u8_array(1)?
            .into_iter()
            .map(|id| GameType::from_id(id).ok_or(ParseError::Discriminant { kind: "game type", value: id }))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            wallet: agent.address(0)?,
            game_types,
            min_wager: agent.u256(2)?,
            max_wager: agent.u256(3)?,
            is_open: agent.bool(4)?,
            exists: agent.bool(5)?,
        })
    }

    pub fn plays(&self, game_type: GameType) -> bool {
        self.game_types.contains(&game_type)
    }

    /// Whether `wager` lies in the agent's accepted range
    pub fn accepts_wager(&self, wager: U256) -> bool {
        wager >= self.min_wager && wager <= self.max_wager
    }
}

pub fn decode_open_agents(data: &[u8]) -> Result<Vec<Address>, AbiError> {
    Words::new(data).address_array(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::abi::{encode_args, u64_word};

    /// `getAgent` return data as the contract lays it out
    fn agent_return(wallet: Address, games: Vec<u8>, min: u64, max: u64) -> Vec<u8> {
        let body = encode_args(&[
            wallet.into(),
            Token::Uint8Array(games),
            min.into(),
            max.into(),
            Token::Bool(true),
            Token::Bool(true),
        ]);
        let mut data = u64_word(32).to_vec();
        data.extend_from_slice(&body);
        data
    }

    #[test]
    fn test_decode_agent() {
        let wallet = Address::repeat_byte(0x42);
        let info = AgentInfo::decode(&agent_return(wallet, vec![0, 2], 10, 1000)).unwrap();
        assert_eq!(info.wallet, wallet);
        assert_eq!(info.game_types, vec![GameType::Rps, GameType::Auction]);
        assert!(info.plays(GameType::Auction));
        assert!(!info.plays(GameType::Poker));
        assert!(info.accepts_wager(U256::from(10u64)));
        assert!(!info.accepts_wager(U256::from(1001u64)));
        assert!(info.exists);
    }

    #[test]
    fn test_decode_agent_bad_game_type() {
        let data = agent_return(Address::ZERO, vec![7], 1, 2);
        assert!(AgentInfo::decode(&data).is_err());
    }

    #[test]
    fn test_register_calldata_roundtrips_game_types() {
        let data = register(&[GameType::Poker], U256::from(1u64), U256::from(2u64));
        let args = Words::new(&data[4..]);
        assert_eq!(args.u8_array(0).unwrap(), vec![1]);
        assert_eq!(args.u64(2).unwrap(), 2);
    }
}
