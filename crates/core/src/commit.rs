//! Commit-reveal hashing
//!
//! The arena contracts verify reveals with
//! `keccak256(abi.encodePacked(value, salt))`, so the packed layouts here are
//! a wire format: `uint8 || bytes32` for moves and hands, `uint256 || bytes32`
//! for bids.

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::abi::keccak256;
use crate::types::{Hash, Salt, U256};

/// Fresh 32-byte salt from the operating system CSPRNG
pub fn generate_salt() -> Salt {
    let mut salt = [0u8; 32];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// `keccak256(uint8 value || bytes32 salt)`
pub fn commit_hash(value: u8, salt: &Salt) -> Hash {
    let mut packed = [0u8; 33];
    packed[0] = value;
    packed[1..].copy_from_slice(salt);
    keccak256(&packed)
}

/// `keccak256(uint256 bid || bytes32 salt)`
pub fn commit_bid_hash(bid: U256, salt: &Salt) -> Hash {
    let mut packed = [0u8; 64];
    packed[..32].copy_from_slice(&bid.to_be_bytes::<32>());
    packed[32..].copy_from_slice(salt);
    keccak256(&packed)
}

/// The hidden value behind a commitment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum CommittedValue {
    /// RPS move or poker hand value
    Small(u8),
    /// Auction bid in wei
    Bid(U256),
}

impl CommittedValue {
    /// Hash as the contract would recompute it on reveal
    pub fn hash(&self, salt: &Salt) -> Hash {
        match self {
            Self::Small(v) => commit_hash(*v, salt),
            Self::Bid(b) => commit_bid_hash(*b, salt),
        }
    }

    pub const fn as_small(&self) -> Option<u8> {
        match self {
            Self::Small(v) => Some(*v),
            Self::Bid(_) => None,
        }
    }

    pub const fn as_bid(&self) -> Option<U256> {
        match self {
            Self::Bid(b) => Some(*b),
            Self::Small(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: Salt = [0x11; 32];

    #[test]
    fn test_commit_hash_vectors() {
        assert_eq!(
            hex::encode(commit_hash(1, &SALT)),
            "797d2d2c2c2b0f820ed98bee1c33fd6d17efaca9b4de83ae4ad04d4a5ece79c2"
        );
        assert_eq!(
            hex::encode(commit_hash(3, &SALT)),
            "e3efb90987002b8caded62ccdb59b7a55c2fd04edb6774ef14b07f24a6d3acb6"
        );

        let mut counting = [0u8; 32];
        for (i, b) in counting.iter_mut().enumerate() {
            *b = i as u8;
        }
        assert_eq!(
            hex::encode(commit_hash(1, &counting)),
            "e46e20db49e842154b399b4b5f7200464f9370a5bee4d92a971d96b24d802cfc"
        );
    }

    #[test]
    fn test_commit_bid_hash_vector() {
        let bid = U256::from(1_500_000_000_000_000_000u64);
        assert_eq!(
            hex::encode(commit_bid_hash(bid, &SALT)),
            "8967d66f25c48bdc93ce83a4adbb0bc714c3ad4c274e1ecc7d4d92088acc2601"
        );
    }

    #[test]
    fn test_commit_hash_deterministic_and_sensitive() {
        let salt = generate_salt();
        assert_eq!(commit_hash(2, &salt), commit_hash(2, &salt));
        assert_ne!(commit_hash(2, &salt), commit_hash(3, &salt));

        let mut flipped = salt;
        flipped[31] ^= 0x01;
        assert_ne!(commit_hash(2, &salt), commit_hash(2, &flipped));
    }

    #[test]
    fn test_bid_width_differs_from_small() {
        // A bid of 1 is 32 bytes wide, not one byte
        assert_ne!(commit_hash(1, &SALT), commit_bid_hash(U256::from(1u64), &SALT));
    }

    #[test]
    fn test_salts_are_distinct() {
        assert_ne!(generate_salt(), generate_salt());
    }

    #[test]
    fn test_committed_value_dispatch() {
        assert_eq!(CommittedValue::Small(3).hash(&SALT), commit_hash(3, &SALT));
        let bid = U256::from(42u64);
        assert_eq!(CommittedValue::Bid(bid).hash(&SALT), commit_bid_hash(bid, &SALT));
        assert_eq!(CommittedValue::Bid(bid).as_small(), None);
    }
}
