//! Scriptable in-memory chain for tests, here and in dependent crates

use std::collections::VecDeque;
use std::sync::Mutex;

use arena_bindings::Log;
use arena_core::abi::keccak256;
use arena_core::{Address, Hash, U256};
use async_trait::async_trait;
use ethers::types::Transaction;

use crate::rpc::{CallRequest, ChainRpc, RpcError, TxReceipt};

/// What `eth_getTransactionReceipt` reports for broadcast transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptScript {
    Success,
    Reverted,
    Never,
    /// The poll itself never answers
    Hang,
}

type CallHandler = Box<dyn Fn(Address, &[u8]) -> Result<Vec<u8>, RpcError> + Send + Sync>;

struct State {
    send_failures: VecDeque<RpcError>,
    sent: Vec<Vec<u8>>,
    receipts: ReceiptScript,
    logs: Vec<Log>,
    calls: Vec<(Address, Vec<u8>)>,
    handler: Option<CallHandler>,
    timestamp: u64,
}

/// Scriptable [`ChainRpc`]
pub struct MockRpc {
    state: Mutex<State>,
}

impl std::fmt::Debug for MockRpc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockRpc").finish_non_exhaustive()
    }
}

impl Default for MockRpc {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRpc {
    pub const GAS_ESTIMATE: u64 = 100_000;

    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                send_failures: VecDeque::new(),
                sent: Vec::new(),
                receipts: ReceiptScript::Success,
                logs: Vec::new(),
                calls: Vec::new(),
                handler: None,
                timestamp: 1_700_000_000,
            }),
        }
    }

    /// Fail the next broadcasts with these errors, in order
    pub fn fail_sends(&self, errors: Vec<RpcError>) {
        self.state.lock().unwrap().send_failures.extend(errors);
    }

    pub fn set_receipts(&self, script: ReceiptScript) {
        self.state.lock().unwrap().receipts = script;
    }

    /// Logs attached to every successful receipt
    pub fn set_logs(&self, logs: Vec<Log>) {
        self.state.lock().unwrap().logs = logs;
    }

    pub fn on_call(&self, handler: impl Fn(Address, &[u8]) -> Result<Vec<u8>, RpcError> + Send + Sync + 'static) {
        self.state.lock().unwrap().handler = Some(Box::new(handler));
    }

    /// Broadcast attempts, including failed ones
    pub fn send_count(&self) -> usize {
        self.state.lock().unwrap().sent.len()
    }

    /// Decoded transactions that were broadcast
    pub fn sent(&self) -> Vec<Transaction> {
        self.state
            .lock()
            .unwrap()
            .sent
            .iter()
            .map(|raw| ethers::utils::rlp::decode(raw).unwrap())
            .collect()
    }

    pub fn last_gas_limit(&self) -> Option<u64> {
        self.sent().last().map(|tx| tx.gas.as_u64())
    }

    pub fn calls(&self) -> Vec<(Address, Vec<u8>)> {
        self.state.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl ChainRpc for MockRpc {
    async fn chain_id(&self) -> Result<u64, RpcError> {
        Ok(10143)
    }

    async fn call(&self, to: Address, data: &[u8]) -> Result<Vec<u8>, RpcError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((to, data.to_vec()));
        match &state.handler {
            Some(handler) => handler(to, data),
            None => Err(RpcError::Reverted("no handler".to_string())),
        }
    }

    async fn balance(&self, _who: Address) -> Result<U256, RpcError> {
        Ok(U256::from(10u64).pow(U256::from(19u64)))
    }

    async fn latest_timestamp(&self) -> Result<u64, RpcError> {
        Ok(self.state.lock().unwrap().timestamp)
    }

    async fn estimate_gas(&self, _request: &CallRequest) -> Result<u64, RpcError> {
        Ok(Self::GAS_ESTIMATE)
    }

    async fn nonce(&self, _who: Address) -> Result<u64, RpcError> {
        Ok(self.state.lock().unwrap().sent.len() as u64)
    }

    async fn gas_price(&self) -> Result<U256, RpcError> {
        Ok(U256::from(50_000_000_000u64))
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<Hash, RpcError> {
        let mut state = self.state.lock().unwrap();
        state.sent.push(raw.to_vec());
        match state.send_failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(keccak256(raw)),
        }
    }

    async fn receipt(&self, hash: Hash) -> Result<Option<TxReceipt>, RpcError> {
        let (script, logs) = {
            let state = self.state.lock().unwrap();
            (state.receipts, state.logs.clone())
        };
        let success = match script {
            ReceiptScript::Hang => return std::future::pending().await,
            ReceiptScript::Never => return Ok(None),
            ReceiptScript::Success => true,
            ReceiptScript::Reverted => false,
        };
        Ok(Some(TxReceipt { hash, success, gas_used: 21_000, block_number: 1, logs }))
    }
}
