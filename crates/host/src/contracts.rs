//! Typed contract client
//!
//! Reads go straight to `eth_call`; writes go through the [`TxSubmitter`].
//! An `eth_call` revert surfaces as `CALL_REVERTED`, a transport failure as
//! `RPC_ERROR`/`RATE_LIMITED`, so callers can tell "not there" from "could
//! not ask".

use std::sync::Arc;
use std::time::Duration;

use arena_bindings::auction::{self, AuctionGame};
use arena_bindings::escrow::{self, Match};
use arena_bindings::market::{self, Balances, Market, Prices};
use arena_bindings::poker::{self, PokerGame};
use arena_bindings::registry::{self, AgentInfo};
use arena_bindings::rps::{self, RpsGame, RpsRound};
use arena_bindings::tournament::{self, RoundRobinMatch, Tournament};
use arena_bindings::{decode_address, decode_escrow_match_id, decode_u64, events};
use arena_core::rating::Side;
use arena_core::{
    AbiError, Address, GameType, Hash, MatchStatus, Move, PokerAction, Salt, TournamentFormat, U256,
};
use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::cache::TtlCache;
use crate::config::{Config, ContractAddresses};
use crate::error::ArenaError;
use crate::game::{AuctionContract, GameSession, PokerContract, RpsContract};
use crate::rpc::{ChainRpc, HttpRpc};
use crate::signer::TxSigner;
use crate::submitter::{TxOutcome, TxSubmitter};

/// How long `getAgent` answers are reused within one invocation
pub const AGENT_CACHE_TTL: Duration = Duration::from_secs(30);

/// Matches scanned by [`ArenaClient::pending_challenges`] by default
pub const DEFAULT_PENDING_LOOKBACK: u64 = 50;

/// An open agent as seen by `find-opponents`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opponent {
    pub address: Address,
    pub elo: u64,
    pub info: AgentInfo,
}

/// Client for the escrow, registry, market, tournament and game contracts
#[derive(Debug)]
pub struct ArenaClient<R> {
    rpc: Arc<R>,
    submitter: Option<TxSubmitter<R>>,
    contracts: ContractAddresses,
    agents: TtlCache<Address, Option<AgentInfo>>,
}

impl ArenaClient<HttpRpc> {
    /// HTTP client for `config`; writes are enabled when a private key is set
    pub fn from_config(config: &Config) -> Result<Self, ArenaError> {
        let rpc = Arc::new(HttpRpc::new(config.rpc_url.clone())?);
        let client = Self::new(Arc::clone(&rpc), config.contracts.clone());
        match config.private_key.as_deref() {
            Some(key) => {
                let signer = TxSigner::from_private_key(key, config.chain_id)?;
                Ok(client.with_submitter(TxSubmitter::new(rpc, signer, config.submit_policy())))
            }
            None => Ok(client),
        }
    }
}

impl<R: ChainRpc> ArenaClient<R> {
    pub fn new(rpc: Arc<R>, contracts: ContractAddresses) -> Self {
        Self { rpc, submitter: None, contracts, agents: TtlCache::new(AGENT_CACHE_TTL) }
    }

    pub fn with_submitter(mut self, submitter: TxSubmitter<R>) -> Self {
        self.submitter = Some(submitter);
        self
    }

    /// Replace the agent cache, e.g. with a zero TTL to always read through
    pub fn with_agent_cache(mut self, cache: TtlCache<Address, Option<AgentInfo>>) -> Self {
        self.agents = cache;
        self
    }

    pub const fn contracts(&self) -> &ContractAddresses {
        &self.contracts
    }

    /// Local wallet address; `MISSING_PRIVATE_KEY` for read-only clients
    pub fn address(&self) -> Result<Address, ArenaError> {
        self.submitter().map(TxSubmitter::address)
    }

    fn submitter(&self) -> Result<&TxSubmitter<R>, ArenaError> {
        self.submitter.as_ref().ok_or(ArenaError::MissingPrivateKey)
    }

    async fn read<T>(
        &self,
        to: Address,
        data: Vec<u8>,
        decode: fn(&[u8]) -> Result<T, AbiError>,
    ) -> Result<T, ArenaError> {
        let raw = self.rpc.call(to, &data).await?;
        Ok(decode(&raw)?)
    }

    async fn send(&self, to: Address, data: Vec<u8>, value: U256) -> Result<TxOutcome, ArenaError> {
        self.submitter()?.submit(to, data, value).await
    }

    /// Id from a `*Created` log, or `next - 1` when the receipt carries none
    async fn created_id(
        &self,
        outcome: &TxOutcome,
        emitter: Address,
        signature: &str,
        next_id: Vec<u8>,
    ) -> Result<u64, ArenaError> {
        if let Some(id) = events::created_id(&outcome.logs, emitter, signature) {
            return Ok(id);
        }
        warn!("No {} log in {}, reading the id counter", signature, outcome.hash_hex());
        let next = self.read(emitter, next_id, decode_u64).await?;
        next.checked_sub(1).ok_or_else(|| ArenaError::Decode(format!("{} emitted no id", signature)))
    }

    pub async fn balance(&self, who: Address) -> Result<U256, ArenaError> {
        Ok(self.rpc.balance(who).await?)
    }

    // Escrow

    pub async fn get_match(&self, match_id: u64) -> Result<Match, ArenaError> {
        self.read(self.contracts.escrow()?, escrow::get_match(match_id), Match::decode).await
    }

    pub async fn next_match_id(&self) -> Result<u64, ArenaError> {
        self.read(self.contracts.escrow()?, escrow::next_match_id(), decode_u64).await
    }

    /// Escrow winner; `None` while unsettled or after a draw
    pub async fn winner(&self, match_id: u64) -> Result<Option<Address>, ArenaError> {
        let winner = self.read(self.contracts.escrow()?, escrow::winners(match_id), decode_address).await?;
        Ok((winner != Address::ZERO).then_some(winner))
    }

    pub async fn match_with_winner(&self, match_id: u64) -> Result<(Match, Option<Address>), ArenaError> {
        tokio::try_join!(self.get_match(match_id), self.winner(match_id))
    }

    /// Open a challenge against `opponent`, escrowing `wager`
    pub async fn create_match(
        &self,
        opponent: Address,
        game_type: GameType,
        wager: U256,
    ) -> Result<(u64, TxOutcome), ArenaError> {
        let escrow_address = self.contracts.escrow()?;
        let game_contract = self.contracts.game(game_type)?;
        let outcome = self.send(escrow_address, escrow::create_match(opponent, game_contract), wager).await?;
        let match_id =
            self.created_id(&outcome, escrow_address, escrow::MATCH_CREATED, escrow::next_match_id()).await?;
        info!("Created match {} against {}", match_id, opponent);
        Ok((match_id, outcome))
    }

    pub async fn accept_match(&self, match_id: u64, wager: U256) -> Result<TxOutcome, ArenaError> {
        let outcome = self.send(self.contracts.escrow()?, escrow::accept_match(match_id), wager).await?;
        info!("Accepted match {}", match_id);
        Ok(outcome)
    }

    /// Which game contract a match was opened on
    pub fn game_type_of_match(&self, m: &Match) -> Result<GameType, ArenaError> {
        self.contracts.game_type_of(m.game_contract).ok_or_else(|| {
            ArenaError::GameNotFound(format!("match game contract {} is not a configured game", m.game_contract))
        })
    }

    /// Challenges addressed to `who` still waiting for acceptance, among the
    /// newest `lookback` matches
    pub async fn pending_challenges(&self, who: Address, lookback: u64) -> Result<Vec<(u64, Match)>, ArenaError> {
        let next = self.next_match_id().await?;
        let ids: Vec<u64> = (next.saturating_sub(lookback)..next).collect();
        let matches = join_all(ids.iter().map(|id| self.get_match(*id))).await;

        let mut pending = Vec::new();
        for (id, result) in ids.into_iter().zip(matches) {
            let m = result?;
            if m.player2 == who && m.status == MatchStatus::Created {
                pending.push((id, m));
            }
        }
        Ok(pending)
    }

    // Games

    pub async fn next_game_id(&self, game_type: GameType) -> Result<u64, ArenaError> {
        self.read(self.contracts.game(game_type)?, arena_bindings::next_game_id(), decode_u64).await
    }

    /// Create the game for an accepted match; `rounds` only applies to RPS
    pub async fn create_game(
        &self,
        game_type: GameType,
        match_id: u64,
        rounds: u64,
    ) -> Result<(u64, TxOutcome), ArenaError> {
        let contract = self.contracts.game(game_type)?;
        let (data, signature) = match game_type {
            GameType::Rps => (rps::create_game(match_id, rounds), rps::GAME_CREATED),
            GameType::Poker => (poker::create_game(match_id), poker::GAME_CREATED),
            GameType::Auction => (auction::create_game(match_id), auction::GAME_CREATED),
        };
        let outcome = self.send(contract, data, U256::ZERO).await?;
        let game_id = self.created_id(&outcome, contract, signature, arena_bindings::next_game_id()).await?;
        info!("Created {} game {} for match {}", game_type, game_id, match_id);
        Ok((game_id, outcome))
    }

    /// Newest game on `game_type`'s contract linked to `match_id`
    ///
    /// Scans backward from `nextGameId - 1`; recent matches are found in a
    /// read or two.
    pub async fn find_game_for_match(&self, game_type: GameType, match_id: u64) -> Result<Option<u64>, ArenaError> {
        let contract = self.contracts.game(game_type)?;
        let next = self.read(contract, arena_bindings::next_game_id(), decode_u64).await?;
        for game_id in (0..next).rev() {
            let linked = match self.read(contract, arena_bindings::get_game(game_id), decode_escrow_match_id).await {
                Ok(linked) => linked,
                // An unreadable slot cannot be ours; transport failures still abort
                Err(e @ (ArenaError::CallReverted(_) | ArenaError::Decode(_))) => {
                    debug!("Skipping {} game {}: {}", game_type, game_id, e);
                    continue;
                }
                Err(e) => return Err(e),
            };
            if linked == match_id {
                debug!("Match {} is {} game {}", match_id, game_type, game_id);
                return Ok(Some(game_id));
            }
        }
        Ok(None)
    }

    pub async fn claim_game_timeout(&self, game_type: GameType, game_id: u64) -> Result<TxOutcome, ArenaError> {
        let outcome =
            self.send(self.contracts.game(game_type)?, arena_bindings::claim_timeout(game_id), U256::ZERO).await?;
        info!("Claimed timeout on {} game {}", game_type, game_id);
        Ok(outcome)
    }

    // Registry

    /// Registration of `who`; `None` when the registry does not know it
    pub async fn get_agent(&self, who: Address) -> Result<Option<AgentInfo>, ArenaError> {
        if let Some(cached) = self.agents.get(&who) {
            return Ok(cached);
        }
        let agent = match self.read(self.contracts.registry()?, registry::get_agent(who), AgentInfo::decode).await {
            Ok(info) => info.exists.then_some(info),
            Err(ArenaError::CallReverted(reason)) => {
                debug!("getAgent({}) reverted: {}", who, reason);
                None
            }
            Err(e) => return Err(e),
        };
        self.agents.insert(who, agent.clone());
        Ok(agent)
    }

    pub async fn elo(&self, who: Address, game_type: GameType) -> Result<u64, ArenaError> {
        self.read(self.contracts.registry()?, registry::elo(who, game_type), decode_u64).await
    }

    pub async fn open_agents(&self, game_type: GameType) -> Result<Vec<Address>, ArenaError> {
        self.read(self.contracts.registry()?, registry::get_open_agents(game_type), registry::decode_open_agents)
            .await
    }

    pub async fn register(
        &self,
        game_types: &[GameType],
        min_wager: U256,
        max_wager: U256,
    ) -> Result<TxOutcome, ArenaError> {
        let me = self.address()?;
        let data = registry::register(game_types, min_wager, max_wager);
        let outcome = self.send(self.contracts.registry()?, data, U256::ZERO).await?;
        self.agents.invalidate(&me);
        info!("Registered for {:?}", game_types);
        Ok(outcome)
    }

    /// Open agents for `game_type` other than `me`, with their ELO
    pub async fn opponents(&self, game_type: GameType, me: Option<Address>) -> Result<Vec<Opponent>, ArenaError> {
        let candidates: Vec<Address> =
            self.open_agents(game_type).await?.into_iter().filter(|a| Some(*a) != me).collect();

        let lookups = join_all(candidates.iter().map(|address| async move {
            let (info, elo) = tokio::try_join!(self.get_agent(*address), self.elo(*address, game_type))?;
            Ok::<_, ArenaError>(info.map(|info| Opponent { address: *address, elo, info }))
        }))
        .await;

        let mut opponents = Vec::new();
        for lookup in lookups {
            if let Some(opponent) = lookup? {
                opponents.push(opponent);
            }
        }
        Ok(opponents)
    }

    // Prediction market

    /// Open a YES/NO market on `match_id`, seeding both reserves with `seed`
    pub async fn create_market(&self, match_id: u64, seed: U256) -> Result<(u64, TxOutcome), ArenaError> {
        let contract = self.contracts.market()?;
        let outcome = self.send(contract, market::create_market(match_id), seed).await?;
        let market_id = self.created_id(&outcome, contract, market::MARKET_CREATED, market::next_market_id()).await?;
        info!("Created market {} on match {}", market_id, match_id);
        Ok((market_id, outcome))
    }

    pub async fn buy(&self, market_id: u64, side: Side, amount: U256) -> Result<TxOutcome, ArenaError> {
        let data = match side {
            Side::Yes => market::buy_yes(market_id),
            Side::No => market::buy_no(market_id),
        };
        self.send(self.contracts.market()?, data, amount).await
    }

    pub async fn resolve_market(&self, market_id: u64) -> Result<TxOutcome, ArenaError> {
        self.send(self.contracts.market()?, market::resolve(market_id), U256::ZERO).await
    }

    pub async fn redeem(&self, market_id: u64) -> Result<TxOutcome, ArenaError> {
        self.send(self.contracts.market()?, market::redeem(market_id), U256::ZERO).await
    }

    pub async fn get_market(&self, market_id: u64) -> Result<Market, ArenaError> {
        self.read(self.contracts.market()?, market::get_market(market_id), Market::decode).await
    }

    pub async fn prices(&self, market_id: u64) -> Result<Prices, ArenaError> {
        self.read(self.contracts.market()?, market::get_price(market_id), Prices::decode).await
    }

    pub async fn balances(&self, market_id: u64, who: Address) -> Result<Balances, ArenaError> {
        self.read(self.contracts.market()?, market::get_user_balances(market_id, who), Balances::decode).await
    }

    // Tournaments

    pub async fn create_tournament(
        &self,
        format: TournamentFormat,
        entry_fee: U256,
        base_wager: U256,
        max_players: u8,
    ) -> Result<(u64, TxOutcome), ArenaError> {
        let contract = self.contracts.tournament()?;
        let data = tournament::create_tournament(format, entry_fee, base_wager, max_players);
        let outcome = self.send(contract, data, U256::ZERO).await?;
        let id = self
            .created_id(&outcome, contract, tournament::TOURNAMENT_CREATED, tournament::next_tournament_id())
            .await?;
        info!("Created tournament {}", id);
        Ok((id, outcome))
    }

    /// Register for a tournament, paying `entry_fee`
    pub async fn join_tournament(&self, tournament_id: u64, entry_fee: U256) -> Result<TxOutcome, ArenaError> {
        self.send(self.contracts.tournament()?, tournament::register(tournament_id), entry_fee).await
    }

    pub async fn generate_schedule(&self, tournament_id: u64) -> Result<TxOutcome, ArenaError> {
        self.send(self.contracts.tournament()?, tournament::generate_schedule(tournament_id), U256::ZERO).await
    }

    pub async fn get_tournament(&self, tournament_id: u64) -> Result<Tournament, ArenaError> {
        self.read(self.contracts.tournament()?, tournament::get_tournament(tournament_id), Tournament::decode).await
    }

    pub async fn participants(&self, tournament_id: u64) -> Result<Vec<Address>, ArenaError> {
        let data = tournament::get_participants(tournament_id);
        self.read(self.contracts.tournament()?, data, tournament::decode_participants).await
    }

    pub async fn next_tournament_id(&self) -> Result<u64, ArenaError> {
        self.read(self.contracts.tournament()?, tournament::next_tournament_id(), decode_u64).await
    }

    /// Every tournament created so far
    pub async fn tournaments(&self) -> Result<Vec<(u64, Tournament)>, ArenaError> {
        let next = self.next_tournament_id().await?;
        let results = join_all((0..next).map(|id| self.get_tournament(id))).await;
        (0..next).zip(results).map(|(id, t)| t.map(|t| (id, t))).collect()
    }

    /// Round-robin schedule, empty until `generateSchedule` has run
    pub async fn round_robin_matches(&self, tournament_id: u64) -> Result<Vec<RoundRobinMatch>, ArenaError> {
        let contract = self.contracts.tournament()?;
        let total = self.read(contract, tournament::rr_total_matches(tournament_id), decode_u64).await?;
        join_all((0..total).map(|i| self.read(contract, tournament::get_rr_match(tournament_id, i), RoundRobinMatch::decode)))
            .await
            .into_iter()
            .collect()
    }
}

#[async_trait]
impl<R: ChainRpc + 'static> GameSession for ArenaClient<R> {
    fn player(&self) -> Result<Address, ArenaError> {
        self.address()
    }

    async fn chain_time(&self) -> Result<u64, ArenaError> {
        Ok(self.rpc.latest_timestamp().await?)
    }

    async fn claim_timeout(&self, game_type: GameType, game_id: u64) -> Result<TxOutcome, ArenaError> {
        self.claim_game_timeout(game_type, game_id).await
    }
}

#[async_trait]
impl<R: ChainRpc + 'static> RpsContract for ArenaClient<R> {
    async fn rps_game(&self, game_id: u64) -> Result<RpsGame, ArenaError> {
        self.read(self.contracts.game(GameType::Rps)?, arena_bindings::get_game(game_id), RpsGame::decode).await
    }

    async fn rps_round(&self, game_id: u64, round: u64) -> Result<RpsRound, ArenaError> {
        self.read(self.contracts.game(GameType::Rps)?, rps::get_round(game_id, round), RpsRound::decode).await
    }

    async fn commit_move(&self, game_id: u64, hash: Hash) -> Result<TxOutcome, ArenaError> {
        self.send(self.contracts.game(GameType::Rps)?, rps::commit(game_id, hash), U256::ZERO).await
    }

    async fn reveal_move(&self, game_id: u64, mv: Move, salt: Salt) -> Result<TxOutcome, ArenaError> {
        self.send(self.contracts.game(GameType::Rps)?, rps::reveal(game_id, mv, salt), U256::ZERO).await
    }
}

#[async_trait]
impl<R: ChainRpc + 'static> PokerContract for ArenaClient<R> {
    async fn poker_game(&self, game_id: u64) -> Result<PokerGame, ArenaError> {
        self.read(self.contracts.game(GameType::Poker)?, arena_bindings::get_game(game_id), PokerGame::decode).await
    }

    async fn commit_hand(&self, game_id: u64, hash: Hash) -> Result<TxOutcome, ArenaError> {
        self.send(self.contracts.game(GameType::Poker)?, poker::commit_hand(game_id, hash), U256::ZERO).await
    }

    async fn take_action(&self, game_id: u64, action: PokerAction, value: U256) -> Result<TxOutcome, ArenaError> {
        self.send(self.contracts.game(GameType::Poker)?, poker::take_action(game_id, action), value).await
    }

    async fn reveal_hand(&self, game_id: u64, hand: u8, salt: Salt) -> Result<TxOutcome, ArenaError> {
        self.send(self.contracts.game(GameType::Poker)?, poker::reveal_hand(game_id, hand, salt), U256::ZERO).await
    }
}

#[async_trait]
impl<R: ChainRpc + 'static> AuctionContract for ArenaClient<R> {
    async fn auction_game(&self, game_id: u64) -> Result<AuctionGame, ArenaError> {
        let contract = self.contracts.game(GameType::Auction)?;
        self.read(contract, arena_bindings::get_game(game_id), AuctionGame::decode).await
    }

    async fn commit_bid(&self, game_id: u64, hash: Hash) -> Result<TxOutcome, ArenaError> {
        self.send(self.contracts.game(GameType::Auction)?, auction::commit_bid(game_id, hash), U256::ZERO).await
    }

    async fn reveal_bid(&self, game_id: u64, bid: U256, salt: Salt) -> Result<TxOutcome, ArenaError> {
        self.send(self.contracts.game(GameType::Auction)?, auction::reveal_bid(game_id, bid, salt), U256::ZERO).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRpc;
    use crate::rpc::RpcError;
    use crate::submitter::SubmitPolicy;
    use arena_bindings::Log;
    use arena_core::abi::{event_topic, selector, u64_word, Words};

    const KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn contracts() -> ContractAddresses {
        ContractAddresses {
            escrow: Some(Address::repeat_byte(0xe0)),
            registry: Some(Address::repeat_byte(0xa0)),
            rps: Some(Address::repeat_byte(0x01)),
            poker: Some(Address::repeat_byte(0x02)),
            auction: Some(Address::repeat_byte(0x03)),
            market: None,
            tournament: None,
        }
    }

    fn writer(rpc: &Arc<MockRpc>) -> ArenaClient<MockRpc> {
        let signer = TxSigner::from_private_key(KEY, 10143).unwrap();
        ArenaClient::new(Arc::clone(rpc), contracts())
            .with_submitter(TxSubmitter::new(Arc::clone(rpc), signer, SubmitPolicy::default()))
    }

    fn is_call(data: &[u8], signature: &str) -> bool {
        data[..4] == selector(signature)
    }

    #[tokio::test]
    async fn test_find_game_scans_backward_from_newest() {
        let rpc = Arc::new(MockRpc::new());
        rpc.on_call(|_, data| {
            if is_call(data, "nextGameId()") {
                return Ok(u64_word(5).to_vec());
            }
            let game_id = Words::new(&data[4..]).u64(0).unwrap();
            let match_id = if game_id == 3 { 9 } else { 100 + game_id };
            Ok(u64_word(match_id).to_vec())
        });
        let client = ArenaClient::new(Arc::clone(&rpc), contracts());

        assert_eq!(client.find_game_for_match(GameType::Auction, 9).await.unwrap(), Some(3));

        let calls = rpc.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|(to, _)| *to == Address::repeat_byte(0x03)));
        assert_eq!(calls[1].1, arena_bindings::get_game(4));
        assert_eq!(calls[2].1, arena_bindings::get_game(3));
    }

    #[tokio::test]
    async fn test_find_game_skips_unreadable_games() {
        let rpc = Arc::new(MockRpc::new());
        rpc.on_call(|_, data| {
            if is_call(data, "nextGameId()") {
                return Ok(u64_word(4).to_vec());
            }
            match Words::new(&data[4..]).u64(0).unwrap() {
                3 => Err(RpcError::Reverted("Game does not exist".to_string())),
                2 => Ok(vec![0u8; 7]),
                1 => Ok(u64_word(9).to_vec()),
                _ => Ok(u64_word(100).to_vec()),
            }
        });
        let client = ArenaClient::new(Arc::clone(&rpc), contracts());

        assert_eq!(client.find_game_for_match(GameType::Poker, 9).await.unwrap(), Some(1));
        assert_eq!(rpc.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_find_game_aborts_on_transport_failure() {
        let rpc = Arc::new(MockRpc::new());
        rpc.on_call(|_, data| {
            if is_call(data, "nextGameId()") {
                return Ok(u64_word(4).to_vec());
            }
            Err(RpcError::Transport("connection reset".to_string()))
        });
        let client = ArenaClient::new(Arc::clone(&rpc), contracts());

        let err = client.find_game_for_match(GameType::Poker, 9).await.unwrap_err();
        assert_eq!(err.code(), "RPC_ERROR");
    }

    #[tokio::test]
    async fn test_find_game_without_match_returns_none() {
        let rpc = Arc::new(MockRpc::new());
        rpc.on_call(|_, data| {
            if is_call(data, "nextGameId()") {
                return Ok(u64_word(2).to_vec());
            }
            Ok(u64_word(77).to_vec())
        });
        let client = ArenaClient::new(Arc::clone(&rpc), contracts());

        assert_eq!(client.find_game_for_match(GameType::Rps, 9).await.unwrap(), None);
        assert_eq!(rpc.calls().len(), 3);
    }

    #[test]
    fn test_game_type_of_match() {
        let client = ArenaClient::new(Arc::new(MockRpc::new()), contracts());
        let mut m = Match {
            player1: Address::repeat_byte(1),
            player2: Address::repeat_byte(2),
            wager: U256::from(1u64),
            game_contract: Address::repeat_byte(0x03),
            status: MatchStatus::Active,
            created_at: 0,
        };
        assert_eq!(client.game_type_of_match(&m).unwrap(), GameType::Auction);

        m.game_contract = Address::repeat_byte(0x99);
        assert_eq!(client.game_type_of_match(&m).unwrap_err().code(), "GAME_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_unregistered_agent_is_none_and_cached() {
        let rpc = Arc::new(MockRpc::new());
        rpc.on_call(|_, _| Err(RpcError::Reverted("Agent not found".to_string())));
        let client = ArenaClient::new(Arc::clone(&rpc), contracts());

        assert_eq!(client.get_agent(Address::repeat_byte(7)).await.unwrap(), None);
        assert_eq!(client.get_agent(Address::repeat_byte(7)).await.unwrap(), None);
        assert_eq!(rpc.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_ttl_cache_reads_through() {
        let rpc = Arc::new(MockRpc::new());
        rpc.on_call(|_, _| Err(RpcError::Reverted("Agent not found".to_string())));
        let client =
            ArenaClient::new(Arc::clone(&rpc), contracts()).with_agent_cache(TtlCache::new(Duration::ZERO));

        client.get_agent(Address::repeat_byte(7)).await.unwrap();
        client.get_agent(Address::repeat_byte(7)).await.unwrap();
        assert_eq!(rpc.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_an_empty_state() {
        let rpc = Arc::new(MockRpc::new());
        rpc.on_call(|_, _| Err(RpcError::Transport("connection refused".to_string())));
        let client = ArenaClient::new(Arc::clone(&rpc), contracts());

        assert_eq!(client.get_agent(Address::repeat_byte(7)).await.unwrap_err().code(), "RPC_ERROR");
    }

    #[tokio::test]
    async fn test_short_return_data_is_a_decode_error() {
        let rpc = Arc::new(MockRpc::new());
        rpc.on_call(|_, _| Ok(vec![0u8; 3]));
        let client = ArenaClient::new(Arc::clone(&rpc), contracts());

        assert_eq!(client.next_match_id().await.unwrap_err().code(), "DECODE_ERROR");
    }

    #[tokio::test]
    async fn test_writes_need_a_key() {
        let client = ArenaClient::new(Arc::new(MockRpc::new()), contracts());
        let err = client.accept_match(1, U256::from(5u64)).await.unwrap_err();
        assert_eq!(err.code(), "MISSING_PRIVATE_KEY");
    }

    #[tokio::test]
    async fn test_unconfigured_contract_is_reported() {
        let client = ArenaClient::new(Arc::new(MockRpc::new()), contracts());
        let err = client.get_market(0).await.unwrap_err();
        assert_eq!(err.code(), "MISSING_CONTRACT_ADDRESS");
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_match_reads_id_from_event() {
        let rpc = Arc::new(MockRpc::new());
        rpc.set_logs(vec![Log {
            address: Address::repeat_byte(0xe0),
            topics: vec![event_topic(escrow::MATCH_CREATED), u64_word(12)],
            data: vec![],
        }]);
        let client = writer(&rpc);
        let wager = U256::from(10u64).pow(U256::from(17u64));

        let (match_id, _) = client.create_match(Address::repeat_byte(0x22), GameType::Rps, wager).await.unwrap();

        assert_eq!(match_id, 12);
        let sent = rpc.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].value.to_string(), wager.to_string());
    }

    #[tokio::test(start_paused = true)]
    async fn test_created_id_falls_back_to_counter() {
        let rpc = Arc::new(MockRpc::new());
        rpc.on_call(|_, data| {
            assert!(is_call(data, "nextGameId()"));
            Ok(u64_word(8).to_vec())
        });
        let client = writer(&rpc);

        let (game_id, _) = client.create_game(GameType::Poker, 4, 1).await.unwrap();
        assert_eq!(game_id, 7);
    }

    #[tokio::test]
    async fn test_pending_challenges_filters_incoming_created() {
        let me = Address::repeat_byte(0x22);
        let rpc = Arc::new(MockRpc::new());
        rpc.on_call(move |_, data| {
            if is_call(data, "nextMatchId()") {
                return Ok(u64_word(3).to_vec());
            }
            let id = Words::new(&data[4..]).u64(0).unwrap();
            let (player2, status) = match id {
                0 => (me, 1u64),
                1 => (Address::repeat_byte(0x33), 0),
                _ => (me, 0),
            };
            let mut out = Vec::new();
            out.extend_from_slice(&Address::repeat_byte(0x11).into_word().0);
            out.extend_from_slice(&player2.into_word().0);
            out.extend_from_slice(&u64_word(1000));
            out.extend_from_slice(&Address::repeat_byte(0x01).into_word().0);
            out.extend_from_slice(&u64_word(status));
            out.extend_from_slice(&u64_word(1_700_000_000));
            Ok(out)
        });
        let client = ArenaClient::new(Arc::clone(&rpc), contracts());

        let pending = client.pending_challenges(me, DEFAULT_PENDING_LOOKBACK).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].0, 2);
        assert_eq!(pending[0].1.wager, U256::from(1000u64));
    }
}
