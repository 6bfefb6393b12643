//! Configuration

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use arena_core::{Address, GameType};
use tracing::warn;

use crate::error::ArenaError;
use crate::submitter::{GasPolicy, SubmitPolicy};

pub const DEFAULT_RPC_URL: &str = "https://testnet-rpc.monad.xyz";
pub const DEFAULT_CHAIN_ID: u64 = 10143;
pub const DEFAULT_POLL_INTERVAL: u64 = 3;
pub const COMMITMENTS_FILE: &str = "commitments.json";
pub const OPPONENTS_FILE: &str = "opponents.json";

/// Private key variables, first set wins
const PRIVATE_KEY_VARS: [&str; 3] = ["PRIVATE_KEY", "DEPLOYER_PRIVATE_KEY", "WALLET_PRIVATE_KEY"];

/// Deployed contract addresses
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContractAddresses {
    pub escrow: Option<Address>,
    pub registry: Option<Address>,
    pub rps: Option<Address>,
    pub poker: Option<Address>,
    pub auction: Option<Address>,
    pub market: Option<Address>,
    pub tournament: Option<Address>,
}

fn require(address: Option<Address>, var: &'static str) -> Result<Address, ArenaError> {
    address.ok_or(ArenaError::MissingContractAddress(var))
}

impl ContractAddresses {
    pub fn escrow(&self) -> Result<Address, ArenaError> {
        require(self.escrow, "ESCROW_ADDRESS")
    }

    pub fn registry(&self) -> Result<Address, ArenaError> {
        require(self.registry, "AGENT_REGISTRY_ADDRESS")
    }

    pub fn market(&self) -> Result<Address, ArenaError> {
        require(self.market, "PREDICTION_MARKET_ADDRESS")
    }

    pub fn tournament(&self) -> Result<Address, ArenaError> {
        require(self.tournament, "TOURNAMENT_V2_ADDRESS")
    }

    /// Game contract for `game_type`
    pub fn game(&self, game_type: GameType) -> Result<Address, ArenaError> {
        match game_type {
            GameType::Rps => require(self.rps, "RPS_GAME_ADDRESS"),
            GameType::Poker => require(self.poker, "POKER_GAME_ADDRESS"),
            GameType::Auction => require(self.auction, "AUCTION_GAME_ADDRESS"),
        }
    }

    /// Which configured game contract `address` is, if any
    pub fn game_type_of(&self, address: Address) -> Option<GameType> {
        GameType::ALL.into_iter().find(|g| self.game(*g).ok() == Some(address))
    }
}

/// Client configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// HTTP JSON-RPC endpoint
    pub rpc_url: String,
    /// WebSocket endpoint; recorded, requests use HTTP
    pub ws_rpc_url: Option<String>,
    pub chain_id: u64,
    /// Hex private key for write commands
    pub private_key: Option<String>,
    pub contracts: ContractAddresses,
    /// Use `eth_estimateGas` x1.5 instead of the fixed limit
    pub estimate_gas: bool,
    /// Seconds between game state polls
    pub poll_interval: u64,
    /// Directory holding local state
    pub home: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            ws_rpc_url: None,
            chain_id: DEFAULT_CHAIN_ID,
            private_key: None,
            contracts: ContractAddresses::default(),
            estimate_gas: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
            home: PathBuf::from(".arena-tools"),
        }
    }
}

impl Config {
    /// Load from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load from any variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let address = |var: &str| {
            get(var).and_then(|v| match v.parse::<Address>() {
                Ok(address) => Some(address),
                Err(e) => {
                    warn!("Ignoring {}: {}", var, e);
                    None
                }
            })
        };

        let home = get("ARENA_HOME").map(PathBuf::from).unwrap_or_else(|| {
            get("HOME")
                .map(|h| PathBuf::from(h).join(".arena-tools"))
                .unwrap_or_else(|| PathBuf::from(".arena-tools"))
        });

        Self {
            rpc_url: get("MONAD_RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            ws_rpc_url: get("MONAD_WS_RPC_URL"),
            chain_id: get("MONAD_CHAIN_ID")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CHAIN_ID),
            private_key: PRIVATE_KEY_VARS.iter().find_map(|var| get(*var)),
            contracts: ContractAddresses {
                escrow: address("ESCROW_ADDRESS"),
                registry: address("AGENT_REGISTRY_ADDRESS"),
                rps: address("RPS_GAME_ADDRESS"),
                poker: address("POKER_GAME_ADDRESS"),
                auction: address("AUCTION_GAME_ADDRESS"),
                market: address("PREDICTION_MARKET_ADDRESS"),
                tournament: address("TOURNAMENT_V2_ADDRESS"),
            },
            estimate_gas: get("ARENA_ESTIMATE_GAS")
                .map(|s| !matches!(s.to_lowercase().as_str(), "0" | "false" | "no"))
                .unwrap_or(false),
            poll_interval: get("ARENA_POLL_INTERVAL")
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_POLL_INTERVAL),
            home,
        }
    }

    pub fn private_key(&self) -> Result<&str, ArenaError> {
        self.private_key.as_deref().ok_or(ArenaError::MissingPrivateKey)
    }

    pub fn commitments_path(&self) -> PathBuf {
        self.home.join(COMMITMENTS_FILE)
    }

    pub fn opponents_path(&self) -> PathBuf {
        self.home.join(OPPONENTS_FILE)
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    pub fn submit_policy(&self) -> SubmitPolicy {
        let gas = if self.estimate_gas { GasPolicy::estimate() } else { GasPolicy::default() };
        SubmitPolicy { gas, ..SubmitPolicy::default() }
    }
}
