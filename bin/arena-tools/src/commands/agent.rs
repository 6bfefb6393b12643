//! Wallet, registry and wager sizing commands

use arena_core::rating::{recommend_wager, win_probability};
use arena_core::units::parse_native;
use arena_host::store::CommitmentStore;
use arena_host::{ArenaClient, ArenaError, ChainRpc, Config};
use futures::future::join_all;
use serde_json::{json, Map, Value};

use super::{amount, parse_address, parse_game, tx};

pub(crate) async fn status<R: ChainRpc>(
    client: &ArenaClient<R>,
    config: &Config,
    address: Option<&str>,
) -> Result<Value, ArenaError> {
    let who = match address {
        Some(address) => parse_address(address)?,
        None => client.address()?,
    };
    let (balance, agent) = tokio::try_join!(client.balance(who), client.get_agent(who))?;
    let pending = CommitmentStore::new(config.commitments_path()).pending();

    let mut data = json!({
        "address": who,
        "balance": amount(balance),
        "registered": agent.is_some(),
        "pendingCommitments": pending,
    });
    if let Some(info) = agent {
        let elos = join_all(info.game_types.iter().map(|g| client.elo(who, *g))).await;
        let mut elo = Map::new();
        for (game_type, rating) in info.game_types.iter().zip(elos) {
            elo.insert(game_type.as_str().to_string(), json!(rating?));
        }
        data["gameTypes"] = json!(info.game_types);
        data["minWager"] = amount(info.min_wager);
        data["maxWager"] = amount(info.max_wager);
        data["isOpen"] = json!(info.is_open);
        data["elo"] = Value::Object(elo);
    }
    Ok(data)
}

pub(crate) async fn register<R: ChainRpc>(
    client: &ArenaClient<R>,
    games: &[String],
    min_wager: &str,
    max_wager: &str,
) -> Result<Value, ArenaError> {
    let mut game_types = games.iter().map(|g| parse_game(g)).collect::<Result<Vec<_>, _>>()?;
    game_types.sort();
    game_types.dedup();
    if game_types.is_empty() {
        return Err(ArenaError::InvalidArgument("at least one game type is required".into()));
    }
    let (min, max) = (parse_native(min_wager)?, parse_native(max_wager)?);
    if min > max {
        return Err(ArenaError::InvalidAmount(format!("min wager {} is above max wager {}", min_wager, max_wager)));
    }

    let outcome = client.register(&game_types, min, max).await?;
    Ok(json!({
        "address": client.address()?,
        "gameTypes": game_types,
        "minWager": amount(min),
        "maxWager": amount(max),
        "tx": tx(&outcome),
    }))
}

pub(crate) async fn find_opponents<R: ChainRpc>(client: &ArenaClient<R>, game: &str) -> Result<Value, ArenaError> {
    let game_type = parse_game(game)?;
    let me = client.address().ok();
    let my_elo = match me {
        Some(me) if client.get_agent(me).await?.is_some() => Some(client.elo(me, game_type).await?),
        _ => None,
    };

    let opponents: Vec<Value> = client
        .opponents(game_type, me)
        .await?
        .into_iter()
        .map(|o| {
            let mut entry = json!({
                "address": o.address,
                "elo": o.elo,
                "minWager": amount(o.info.min_wager),
                "maxWager": amount(o.info.max_wager),
            });
            if let Some(mine) = my_elo {
                entry["winProbability"] = json!(win_probability(mine, o.elo));
            }
            entry
        })
        .collect();

    Ok(json!({ "gameType": game_type, "myElo": my_elo, "opponents": opponents }))
}

pub(crate) async fn recommend<R: ChainRpc>(
    client: &ArenaClient<R>,
    opponent: &str,
    game: &str,
) -> Result<Value, ArenaError> {
    let opponent = parse_address(opponent)?;
    let game_type = parse_game(game)?;
    let me = client.address()?;

    let (balance, my_elo, their_elo, info) = tokio::try_join!(
        client.balance(me),
        client.elo(me, game_type),
        client.elo(opponent, game_type),
        client.get_agent(opponent),
    )?;
    let info = info.ok_or_else(|| ArenaError::InvalidArgument(format!("{} is not a registered agent", opponent)))?;
    if !info.plays(game_type) {
        return Err(ArenaError::InvalidArgument(format!("{} does not play {}", opponent, game_type)));
    }

    let probability = win_probability(my_elo, their_elo);
    let wager = recommend_wager(balance, probability, info.min_wager, info.max_wager);
    Ok(json!({
        "opponent": opponent,
        "gameType": game_type,
        "myElo": my_elo,
        "opponentElo": their_elo,
        "winProbability": probability,
        "balance": amount(balance),
        "minWager": amount(info.min_wager),
        "maxWager": amount(info.max_wager),
        "recommendedWager": amount(wager),
    }))
}
