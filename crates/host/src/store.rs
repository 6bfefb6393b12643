//! File-backed commitment store
//!
//! One JSON object maps commitment keys to `{salt, value, gameType}`. Writes
//! go to `<file>.tmp` and are renamed over the target, so an interrupted
//! write never truncates the store. Reads are fail-safe: a missing or
//! unreadable file looks like an empty store. Saves are strict: a store that
//! cannot be parsed is never overwritten.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use arena_core::abi::to_hex;
use arena_core::{Address, CommittedValue, GameType, Hash, Salt};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ArenaError;

/// Identifies one pending commitment
///
/// Scoped by game, game id and submitting address so concurrent matches
/// and identities never collide. RPS commits once per round and adds the
/// round to the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommitmentKey {
    pub game_type: GameType,
    pub game_id: u64,
    pub round: Option<u64>,
    pub player: Address,
}

impl CommitmentKey {
    pub const fn new(game_type: GameType, game_id: u64, player: Address) -> Self {
        Self { game_type, game_id, round: None, player }
    }

    pub const fn with_round(mut self, round: u64) -> Self {
        self.round = Some(round);
        self
    }
}

impl fmt::Display for CommitmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.game_type, self.game_id)?;
        if let Some(round) = self.round {
            write!(f, ":r{}", round)?;
        }
        write!(f, ":{}", to_hex(self.player.as_slice()))
    }
}

/// Secret half of a commitment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitmentRecord {
    #[serde(with = "salt_hex")]
    pub salt: Salt,
    pub value: CommittedValue,
    pub game_type: GameType,
}

impl CommitmentRecord {
    /// Hash the contract will recompute on reveal
    pub fn hash(&self) -> Hash {
        self.value.hash(&self.salt)
    }
}

mod salt_hex {
    use arena_core::abi::{hash_from_hex, to_hex};
    use arena_core::Salt;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(salt: &Salt, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&to_hex(salt))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Salt, D::Error> {
        let s = String::deserialize(d)?;
        hash_from_hex(&s).map_err(D::Error::custom)
    }
}

/// Result of a store lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitmentLookup {
    Found(CommitmentRecord),
    NotFound,
}

impl CommitmentLookup {
    pub fn into_option(self) -> Option<CommitmentRecord> {
        match self {
            Self::Found(record) => Some(record),
            Self::NotFound => None,
        }
    }
}

type Records = BTreeMap<String, CommitmentRecord>;

/// Commitment store backed by a single JSON file
#[derive(Debug, Clone)]
pub struct CommitmentStore {
    path: PathBuf,
}

impl CommitmentStore {
    /// Create a store at `path`; the file is created on first save
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist `record` under `key`, replacing any previous record
    pub fn save(&self, key: &CommitmentKey, record: CommitmentRecord) -> Result<(), ArenaError> {
        let mut records = match self.read() {
            Ok(records) => records,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Records::new(),
            Err(e) => {
                return Err(ArenaError::Store(format!(
                    "refusing to overwrite unreadable store {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        records.insert(key.to_string(), record);
        self.write(&records)
            .map_err(|e| ArenaError::Store(format!("failed to write {}: {}", self.path.display(), e)))?;
        debug!("Saved commitment {}", key);
        Ok(())
    }

    /// Return the record for `key` and remove it from the store
    pub fn load(&self, key: &CommitmentKey) -> CommitmentLookup {
        let Some(mut records) = self.read_lenient() else {
            return CommitmentLookup::NotFound;
        };
        let Some(record) = records.remove(&key.to_string()) else {
            return CommitmentLookup::NotFound;
        };
        if let Err(e) = self.write(&records) {
            warn!("Commitment {} loaded but could not be removed: {}", key, e);
        }
        debug!("Consumed commitment {}", key);
        CommitmentLookup::Found(record)
    }

    /// Return the record for `key` without removing it
    pub fn peek(&self, key: &CommitmentKey) -> CommitmentLookup {
        self.read_lenient()
            .and_then(|mut records| records.remove(&key.to_string()))
            .map_or(CommitmentLookup::NotFound, CommitmentLookup::Found)
    }

    /// Number of pending commitments, zero for an unreadable store
    pub fn pending(&self) -> usize {
        self.read_lenient().map_or(0, |records| records.len())
    }

    fn read(&self) -> io::Result<Records> {
        let data = fs::read(&self.path)?;
        serde_json::from_slice(&data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn read_lenient(&self) -> Option<Records> {
        match self.read() {
            Ok(records) => Some(records),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Commitment store {} unreadable, treating as empty: {}", self.path.display(), e);
                None
            }
        }
    }

    fn write(&self, records: &Records) -> io::Result<()> {
        write_json_atomic(&self.path, records)
    }
}

/// Write `value` as pretty JSON to `<path>.tmp`, then rename it over `path`
pub(crate) fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let data = serde_json::to_vec_pretty(value)?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, data)?;
    fs::rename(tmp_path, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::{commit_hash, generate_salt, U256};

    fn player() -> Address {
        "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap()
    }

    fn rock(salt: Salt) -> CommitmentRecord {
        CommitmentRecord { salt, value: CommittedValue::Small(1), game_type: GameType::Rps }
    }

    #[test]
    fn test_key_format() {
        let key = CommitmentKey::new(GameType::Auction, 3, player());
        assert_eq!(key.to_string(), "auction:3:0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");
        assert_eq!(
            CommitmentKey::new(GameType::Rps, 3, player()).with_round(2).to_string(),
            "rps:3:r2:0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_round_trip_is_single_use() {
        let dir = tempfile::tempdir().unwrap();
        let store = CommitmentStore::new(dir.path().join("commitments.json"));
        let key = CommitmentKey::new(GameType::Rps, 1, player()).with_round(0);
        let record = rock(generate_salt());

        store.save(&key, record).unwrap();
        assert_eq!(store.peek(&key), CommitmentLookup::Found(record));
        assert_eq!(store.load(&key), CommitmentLookup::Found(record));
        assert_eq!(store.load(&key), CommitmentLookup::NotFound);
        assert_eq!(store.pending(), 0);
    }

    #[test]
    fn test_survives_reopen_and_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("commitments.json");
        let a = CommitmentKey::new(GameType::Rps, 1, player()).with_round(0);
        let b = CommitmentKey::new(GameType::Auction, 1, player());
        let bid = CommitmentRecord {
            salt: generate_salt(),
            value: CommittedValue::Bid(U256::from(1_500_000_000_000_000_000u64)),
            game_type: GameType::Auction,
        };

        let store = CommitmentStore::new(&path);
        store.save(&a, rock([7u8; 32])).unwrap();
        store.save(&b, bid).unwrap();

        let reopened = CommitmentStore::new(&path);
        assert_eq!(reopened.load(&b), CommitmentLookup::Found(bid));
        assert_eq!(reopened.peek(&a).into_option().unwrap().salt, [7u8; 32]);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_save_overwrites_silently() {
        let dir = tempfile::tempdir().unwrap();
        let store = CommitmentStore::new(dir.path().join("c.json"));
        let key = CommitmentKey::new(GameType::Poker, 4, player());
        store.save(&key, rock([1u8; 32])).unwrap();
        store.save(&key, rock([2u8; 32])).unwrap();
        assert_eq!(store.load(&key).into_option().unwrap().salt, [2u8; 32]);
    }

    #[test]
    fn test_corrupt_store_fails_safe() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.json");
        fs::write(&path, b"{not json").unwrap();
        let store = CommitmentStore::new(&path);
        let key = CommitmentKey::new(GameType::Rps, 1, player());

        assert_eq!(store.load(&key), CommitmentLookup::NotFound);
        assert_eq!(store.peek(&key), CommitmentLookup::NotFound);
        let err = store.save(&key, rock([1u8; 32])).unwrap_err();
        assert_eq!(err.code(), "STORE_ERROR");
        // the corrupt file is left for the operator
        assert_eq!(fs::read(&path).unwrap(), b"{not json");
    }

    #[test]
    fn test_missing_store_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = CommitmentStore::new(dir.path().join("absent.json"));
        assert_eq!(store.load(&CommitmentKey::new(GameType::Rps, 0, player())), CommitmentLookup::NotFound);
    }

    #[test]
    fn test_record_hash_matches_contract_scheme() {
        let salt = generate_salt();
        assert_eq!(rock(salt).hash(), commit_hash(1, &salt));
    }
}
