//! Contract bindings
//!
//! Hand-written calldata builders, return decoders and event topics for the
//! arena contracts. Every getter returns a named struct so callers never
//! index raw tuples.

pub mod auction;
pub mod escrow;
pub mod events;
pub mod market;
pub mod poker;
pub mod registry;
pub mod rps;
pub mod tournament;

use arena_core::abi::{encode_call, Words};
use arena_core::{AbiError, Address, Hash, U256};

pub use events::Log;

/// Decode a single `uint256` return that must fit in a `u64` (ids, counters)
pub fn decode_u64(data: &[u8]) -> Result<u64, AbiError> {
    Words::new(data).u64(0)
}

/// Decode a single `uint256` return
pub fn decode_u256(data: &[u8]) -> Result<U256, AbiError> {
    Words::new(data).u256(0)
}

/// Decode a single `address` return
pub fn decode_address(data: &[u8]) -> Result<Address, AbiError> {
    Words::new(data).address(0)
}

/// `escrowMatchId` is the first field of every game's `getGame` tuple
pub fn decode_escrow_match_id(data: &[u8]) -> Result<u64, AbiError> {
    Words::new(data).u64(0)
}

/// `nextGameId()`, shared by all three game contracts
pub fn next_game_id() -> Vec<u8> {
    encode_call("nextGameId()", &[])
}

/// `getGame(uint256)`, shared by all three game contracts
pub fn get_game(game_id: u64) -> Vec<u8> {
    encode_call("getGame(uint256)", &[game_id.into()])
}

/// `claimTimeout(uint256)`, shared by all three game contracts
pub fn claim_timeout(game_id: u64) -> Vec<u8> {
    encode_call("claimTimeout(uint256)", &[game_id.into()])
}

/// A zero commit slot means "not committed yet"
pub fn nonzero(hash: Hash) -> Option<Hash> {
    (hash != [0u8; 32]).then_some(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::abi::{selector, u64_word};

    #[test]
    fn test_shared_game_calls() {
        assert_eq!(&next_game_id()[..], &selector("nextGameId()"));
        let data = claim_timeout(7);
        assert_eq!(&data[..4], &selector("claimTimeout(uint256)"));
        assert_eq!(&data[4..], &u64_word(7));
    }

    #[test]
    fn test_decode_scalars() {
        assert_eq!(decode_u64(&u64_word(42)).unwrap(), 42);
        assert!(decode_u64(&[0u8; 16]).is_err());
        assert_eq!(nonzero([0u8; 32]), None);
        assert_eq!(nonzero([1u8; 32]), Some([1u8; 32]));
    }
}
