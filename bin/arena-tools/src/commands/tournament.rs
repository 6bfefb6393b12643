//! TournamentV2 commands

use std::collections::BTreeMap;

use arena_bindings::tournament::{RoundRobinMatch, Tournament};
use arena_core::{Address, TournamentFormat, TournamentStatus};
use arena_host::{ArenaClient, ArenaError, ChainRpc};
use serde_json::{json, Value};

use super::{amount, parse_positive, tx};

fn summary(id: u64, t: &Tournament) -> Value {
    json!({
        "tournamentId": id,
        "format": t.format,
        "status": t.status,
        "entryFee": amount(t.entry_fee),
        "baseWager": amount(t.base_wager),
        "players": t.player_count,
        "maxPlayers": t.max_players,
        "prizePool": amount(t.prize_pool),
        "creator": t.creator,
    })
}

/// Round-robin points: one per reported win
fn standings(participants: &[Address], schedule: &[RoundRobinMatch]) -> Vec<(Address, u64)> {
    let mut points: BTreeMap<Address, u64> = participants.iter().map(|p| (*p, 0)).collect();
    for m in schedule.iter().filter(|m| m.reported && m.winner != Address::ZERO) {
        *points.entry(m.winner).or_default() += 1;
    }
    let mut table: Vec<(Address, u64)> = points.into_iter().collect();
    table.sort_by(|a, b| b.1.cmp(&a.1));
    table
}

pub(crate) async fn list<R: ChainRpc>(client: &ArenaClient<R>, all: bool) -> Result<Value, ArenaError> {
    let tournaments: Vec<Value> = client
        .tournaments()
        .await?
        .iter()
        .filter(|(_, t)| all || matches!(t.status, TournamentStatus::Registration | TournamentStatus::Active))
        .map(|(id, t)| summary(*id, t))
        .collect();
    Ok(json!({ "tournaments": tournaments }))
}

pub(crate) async fn create<R: ChainRpc>(
    client: &ArenaClient<R>,
    format: &str,
    entry_fee: &str,
    base_wager: &str,
    max_players: u8,
) -> Result<Value, ArenaError> {
    let format: TournamentFormat = format.parse()?;
    let entry_fee = parse_positive(entry_fee, "entry fee")?;
    let base_wager = parse_positive(base_wager, "base wager")?;
    if max_players < 2 {
        return Err(ArenaError::InvalidArgument(format!("a tournament needs at least 2 players, got {}", max_players)));
    }

    let (id, outcome) = client.create_tournament(format, entry_fee, base_wager, max_players).await?;
    Ok(json!({
        "tournamentId": id,
        "format": format,
        "entryFee": amount(entry_fee),
        "baseWager": amount(base_wager),
        "maxPlayers": max_players,
        "tx": tx(&outcome),
    }))
}

pub(crate) async fn join<R: ChainRpc>(client: &ArenaClient<R>, tournament_id: u64) -> Result<Value, ArenaError> {
    let me = client.address()?;
    let (t, participants) = tokio::try_join!(client.get_tournament(tournament_id), client.participants(tournament_id))?;
    if t.status != TournamentStatus::Registration || t.is_full() {
        return Err(ArenaError::InvalidMatchState(format!(
            "tournament {} is not open for registration ({:?}, {}/{} players)",
            tournament_id, t.status, t.player_count, t.max_players
        )));
    }
    if participants.contains(&me) {
        return Err(ArenaError::InvalidMatchState(format!("already registered for tournament {}", tournament_id)));
    }

    let outcome = client.join_tournament(tournament_id, t.entry_fee).await?;
    Ok(json!({ "tournamentId": tournament_id, "entryFee": amount(t.entry_fee), "tx": tx(&outcome) }))
}

pub(crate) async fn status<R: ChainRpc>(client: &ArenaClient<R>, tournament_id: u64) -> Result<Value, ArenaError> {
    let (t, participants) = tokio::try_join!(client.get_tournament(tournament_id), client.participants(tournament_id))?;
    let mut data = summary(tournament_id, &t);
    data["participants"] = json!(participants);

    if t.format == TournamentFormat::RoundRobin && t.status != TournamentStatus::Registration {
        let schedule = client.round_robin_matches(tournament_id).await?;
        data["matches"] = schedule
            .iter()
            .enumerate()
            .map(|(index, m)| {
                json!({
                    "index": index,
                    "player1": m.player1,
                    "player2": m.player2,
                    "reported": m.reported,
                    "winner": (m.winner != Address::ZERO).then_some(m.winner),
                })
            })
            .collect();
        data["standings"] = standings(&participants, &schedule)
            .into_iter()
            .map(|(player, points)| json!({ "player": player, "points": points }))
            .collect();
    }
    Ok(data)
}
