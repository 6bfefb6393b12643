//! Receipt logs and created-id extraction

use arena_core::abi::{event_topic, Words};
use arena_core::{Address, Hash};

/// A log entry from a transaction receipt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<Hash>,
    pub data: Vec<u8>,
}

/// Id carried in the first indexed topic of a `*Created` event
///
/// Looks for a log from `emitter` whose topic0 is `keccak256(signature)`.
/// When no such log exists (an event declared with a different parameter
/// list) the first log from `emitter` with an indexed argument is used.
pub fn created_id(logs: &[Log], emitter: Address, signature: &str) -> Option<u64> {
    let topic0 = event_topic(signature);
    let indexed: Vec<&Log> =
        logs.iter().filter(|log| log.address == emitter && log.topics.len() > 1).collect();

    indexed
        .iter()
        .find(|log| log.topics[0] == topic0)
        .or_else(|| indexed.first())
        .and_then(|log| Words::new(&log.topics[1]).u64(0).ok())
}
