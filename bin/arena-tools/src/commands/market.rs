//! Prediction market commands

use arena_core::rating::{market_edge, Side, DEFAULT_MIN_EDGE};
use arena_host::{ArenaClient, ArenaError, ChainRpc};
use serde_json::{json, Value};
use tracing::debug;

use super::{amount, parse_positive, tx};
use crate::cli::BetSide;

pub(crate) async fn create<R: ChainRpc>(client: &ArenaClient<R>, match_id: u64, seed: &str) -> Result<Value, ArenaError> {
    let seed = parse_positive(seed, "seed liquidity")?;
    let (market_id, outcome) = client.create_market(match_id, seed).await?;
    Ok(json!({ "marketId": market_id, "matchId": match_id, "seed": amount(seed), "tx": tx(&outcome) }))
}

pub(crate) async fn status<R: ChainRpc>(client: &ArenaClient<R>, market_id: u64) -> Result<Value, ArenaError> {
    let (market, prices) = tokio::try_join!(client.get_market(market_id), client.prices(market_id))?;

    let mut data = json!({
        "marketId": market_id,
        "matchId": market.match_id,
        "player1": market.player1,
        "player2": market.player2,
        "reserveYes": amount(market.reserve_yes),
        "reserveNo": amount(market.reserve_no),
        "seedLiquidity": amount(market.seed_liquidity),
        "yesPrice": amount(prices.yes),
        "noPrice": amount(prices.no),
        "resolved": market.resolved,
    });
    if market.resolved {
        data["winner"] = json!(market.winner);
    } else {
        let m = client.get_match(market.match_id).await?;
        let game_type = client.game_type_of_match(&m)?;
        let (elo_p1, elo_p2) =
            tokio::try_join!(client.elo(market.player1, game_type), client.elo(market.player2, game_type))?;
        let edge = market_edge(elo_p1, elo_p2, prices.yes, prices.no, DEFAULT_MIN_EDGE);
        data["gameType"] = json!(game_type);
        data["elo"] = json!({ "player1": elo_p1, "player2": elo_p2 });
        data["edge"] = json!(edge);
    }

    match client.address() {
        Ok(me) => {
            let balances = client.balances(market_id, me).await?;
            data["myBalances"] = json!({ "yes": amount(balances.yes), "no": amount(balances.no) });
        }
        Err(e) => debug!("Skipping balances: {}", e),
    }
    Ok(data)
}

pub(crate) async fn bet<R: ChainRpc>(
    client: &ArenaClient<R>,
    market_id: u64,
    side: BetSide,
    amount_str: &str,
) -> Result<Value, ArenaError> {
    let value = parse_positive(amount_str, "bet")?;
    let side = match side {
        BetSide::Yes => Side::Yes,
        BetSide::No => Side::No,
    };
    let outcome = client.buy(market_id, side, value).await?;
    Ok(json!({ "marketId": market_id, "side": side, "amount": amount(value), "tx": tx(&outcome) }))
}

pub(crate) async fn resolve<R: ChainRpc>(client: &ArenaClient<R>, market_id: u64) -> Result<Value, ArenaError> {
    let outcome = client.resolve_market(market_id).await?;
    let market = client.get_market(market_id).await?;
    Ok(json!({ "marketId": market_id, "winner": market.winner, "tx": tx(&outcome) }))
}

pub(crate) async fn redeem<R: ChainRpc>(client: &ArenaClient<R>, market_id: u64) -> Result<Value, ArenaError> {
    let me = client.address()?;
    let before = client.balance(me).await?;
    let outcome = client.redeem(market_id).await?;
    let after = client.balance(me).await?;
    Ok(json!({
        "marketId": market_id,
        "balanceChange": amount(after.saturating_sub(before)),
        "tx": tx(&outcome),
    }))
}
