//! Escrow commands: challenge, accept, pending, find-game, claim-timeout

use arena_core::MatchStatus;
use arena_host::{ArenaClient, ArenaError, ChainRpc};
use serde_json::{json, Value};

use super::{amount, parse_address, parse_game, parse_positive, tx};

pub(crate) async fn challenge<R: ChainRpc>(
    client: &ArenaClient<R>,
    opponent: &str,
    wager: &str,
    game: &str,
) -> Result<Value, ArenaError> {
    let opponent = parse_address(opponent)?;
    let wager = parse_positive(wager, "wager")?;
    let game_type = parse_game(game)?;
    let me = client.address()?;
    if opponent == me {
        return Err(ArenaError::InvalidArgument("cannot challenge yourself".into()));
    }
    if client.contracts().registry.is_some() {
        if let Some(info) = client.get_agent(opponent).await? {
            if !info.accepts_wager(wager) {
                return Err(ArenaError::InvalidAmount(format!(
                    "{} accepts wagers between {} and {}",
                    opponent,
                    arena_core::units::format_native(info.min_wager),
                    arena_core::units::format_native(info.max_wager)
                )));
            }
        }
    }

    let (match_id, outcome) = client.create_match(opponent, game_type, wager).await?;
    Ok(json!({
        "matchId": match_id,
        "gameType": game_type,
        "opponent": opponent,
        "wager": amount(wager),
        "tx": tx(&outcome),
    }))
}

pub(crate) async fn accept<R: ChainRpc>(client: &ArenaClient<R>, match_id: u64) -> Result<Value, ArenaError> {
    let me = client.address()?;
    let m = client.get_match(match_id).await?;
    if m.player2 != me {
        return Err(ArenaError::NotAParticipant { who: me.to_string(), what: format!("match {} as challenged player", match_id) });
    }
    if m.status != MatchStatus::Created {
        return Err(ArenaError::InvalidMatchState(format!("match {} is {:?}, not open for acceptance", match_id, m.status)));
    }
    let game_type = client.game_type_of_match(&m)?;

    let outcome = client.accept_match(match_id, m.wager).await?;
    Ok(json!({
        "matchId": match_id,
        "gameType": game_type,
        "challenger": m.player1,
        "wager": amount(m.wager),
        "tx": tx(&outcome),
    }))
}

pub(crate) async fn pending<R: ChainRpc>(client: &ArenaClient<R>, lookback: u64) -> Result<Value, ArenaError> {
    let me = client.address()?;
    let challenges: Vec<Value> = client
        .pending_challenges(me, lookback)
        .await?
        .into_iter()
        .map(|(match_id, m)| {
            json!({
                "matchId": match_id,
                "challenger": m.player1,
                "wager": amount(m.wager),
                "gameType": client.contracts().game_type_of(m.game_contract),
                "gameContract": m.game_contract,
                "createdAt": m.created_at,
            })
        })
        .collect();
    Ok(json!({ "address": me, "challenges": challenges }))
}

pub(crate) async fn find_game<R: ChainRpc>(client: &ArenaClient<R>, match_id: u64) -> Result<Value, ArenaError> {
    let m = client.get_match(match_id).await?;
    let game_type = client.game_type_of_match(&m)?;
    let game_id = client
        .find_game_for_match(game_type, match_id)
        .await?
        .ok_or_else(|| ArenaError::GameNotFound(format!("no {} game for match {}", game_type, match_id)))?;
    Ok(json!({ "matchId": match_id, "gameType": game_type, "gameId": game_id, "status": m.status }))
}

pub(crate) async fn claim_timeout<R: ChainRpc>(
    client: &ArenaClient<R>,
    match_id: u64,
    game_id: Option<u64>,
) -> Result<Value, ArenaError> {
    let m = client.get_match(match_id).await?;
    let game_type = client.game_type_of_match(&m)?;
    let game_id = match game_id {
        Some(id) => id,
        None => client
            .find_game_for_match(game_type, match_id)
            .await?
            .ok_or_else(|| ArenaError::GameNotFound(format!("no {} game for match {}", game_type, match_id)))?,
    };

    let outcome = client.claim_game_timeout(game_type, game_id).await?;
    Ok(json!({ "matchId": match_id, "gameType": game_type, "gameId": game_id, "tx": tx(&outcome) }))
}
