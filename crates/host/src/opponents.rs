//! Per-opponent RPS history kept across games
//!
//! One JSON object keyed by lowercase opponent address. Reads are fail-safe
//! like the commitment store; a lost profile only weakens move prediction.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use arena_core::abi::to_hex;
use arena_core::{Address, Move};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ArenaError;
use crate::store::write_json_atomic;
use crate::strategy::RoundPair;

/// Outcome of one finished game against an opponent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub won: Option<bool>,
    pub my_score: u64,
    pub opponent_score: u64,
    pub timestamp: u64,
}

/// Everything remembered about one opponent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpponentProfile {
    /// `(my_move, opponent_move)` across all games, oldest first
    pub rounds: Vec<RoundPair>,
    pub games: Vec<GameRecord>,
    pub last_updated: u64,
}

impl OpponentProfile {
    /// Append a finished game
    pub fn record_game(&mut self, rounds: &[RoundPair], won: Option<bool>, my_score: u64, opponent_score: u64) {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs());
        self.rounds.extend_from_slice(rounds);
        self.games.push(GameRecord { won, my_score, opponent_score, timestamp: now });
        self.last_updated = now;
    }

    /// Share of decided games we won, 0.5 with none
    pub fn win_rate(&self) -> f64 {
        let decided: Vec<bool> = self.games.iter().filter_map(|g| g.won).collect();
        if decided.is_empty() {
            return 0.5;
        }
        decided.iter().filter(|won| **won).count() as f64 / decided.len() as f64
    }

    /// How often the opponent played each move
    pub fn move_counts(&self) -> [(Move, usize); 3] {
        Move::ALL.map(|m| (m, self.rounds.iter().filter(|(_, theirs)| *theirs == m).count()))
    }
}

type Profiles = BTreeMap<String, OpponentProfile>;

/// Opponent profiles backed by a single JSON file
#[derive(Debug, Clone)]
pub struct OpponentBook {
    path: PathBuf,
}

impl OpponentBook {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Profile for `opponent`, empty when unknown or unreadable
    pub fn profile(&self, opponent: Address) -> OpponentProfile {
        match self.read() {
            Ok(mut profiles) => profiles.remove(&key(opponent)).unwrap_or_default(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => OpponentProfile::default(),
            Err(e) => {
                warn!("Opponent book {} unreadable, starting fresh: {}", self.path.display(), e);
                OpponentProfile::default()
            }
        }
    }

    /// Replace the profile for `opponent`
    ///
    /// A book that exists but cannot be parsed is replaced rather than
    /// blocking play; profiles are advisory.
    pub fn save(&self, opponent: Address, profile: &OpponentProfile) -> Result<(), ArenaError> {
        let mut profiles = self.read().unwrap_or_default();
        profiles.insert(key(opponent), profile.clone());
        write_json_atomic(&self.path, &profiles)
            .map_err(|e| ArenaError::Store(format!("failed to write {}: {}", self.path.display(), e)))?;
        debug!("Saved opponent profile {} ({} rounds)", key(opponent), profile.rounds.len());
        Ok(())
    }

    fn read(&self) -> io::Result<Profiles> {
        let data = fs::read(&self.path)?;
        serde_json::from_slice(&data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

fn key(opponent: Address) -> String {
    to_hex(opponent.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::Move::{Paper, Rock, Scissors};

    fn opponent() -> Address {
        "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".parse().unwrap()
    }

    #[test]
    fn test_unknown_opponent_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let book = OpponentBook::new(dir.path().join("opponents.json"));
        let profile = book.profile(opponent());
        assert!(profile.rounds.is_empty());
        assert_eq!(profile.win_rate(), 0.5);
    }

    #[test]
    fn test_history_accumulates_across_games() {
        let dir = tempfile::tempdir().unwrap();
        let book = OpponentBook::new(dir.path().join("opponents.json"));

        let mut profile = book.profile(opponent());
        profile.record_game(&[(Rock, Scissors), (Paper, Scissors)], Some(true), 2, 0);
        book.save(opponent(), &profile).unwrap();

        let mut profile = book.profile(opponent());
        profile.record_game(&[(Rock, Paper)], Some(false), 0, 1);
        book.save(opponent(), &profile).unwrap();

        let stored = book.profile(opponent());
        assert_eq!(stored.rounds, vec![(Rock, Scissors), (Paper, Scissors), (Rock, Paper)]);
        assert_eq!(stored.games.len(), 2);
        assert_eq!(stored.win_rate(), 0.5);
        assert_eq!(stored.move_counts(), [(Rock, 0), (Paper, 1), (Scissors, 2)]);

        let raw = fs::read_to_string(book.path()).unwrap();
        assert!(raw.contains("0x70997970c51812dc3a010c7d01b50e0d17dc79c8"));
    }

    #[test]
    fn test_corrupt_book_reads_empty_and_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opponents.json");
        fs::write(&path, b"{not json").unwrap();
        let book = OpponentBook::new(&path);

        let mut profile = book.profile(opponent());
        assert!(profile.rounds.is_empty());
        profile.record_game(&[(Rock, Rock)], None, 0, 0);
        book.save(opponent(), &profile).unwrap();

        assert_eq!(book.profile(opponent()).rounds, vec![(Rock, Rock)]);
    }
}
