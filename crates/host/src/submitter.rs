//! Transaction submission
//!
//! Gas policy, signing, broadcast, confirmation and rate-limit backoff.
//! A returned `Ok` means the transaction is mined and did not revert.

use std::sync::Arc;
use std::time::Duration;

use arena_bindings::Log;
use arena_core::abi::to_hex;
use arena_core::{Address, Hash, U256};
use tokio::time::{sleep, sleep_until, timeout_at, Instant};
use tracing::{info, warn};

use crate::error::ArenaError;
use crate::rpc::{CallRequest, ChainRpc, TxReceipt};
use crate::signer::{TxSigner, UnsignedTx};

/// Conservative limit covering the heaviest arena call
pub const DEFAULT_GAS_LIMIT: u64 = 1_500_000;

/// How the gas limit is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasPolicy {
    Fixed(u64),
    /// `eth_estimateGas` scaled by `percent / 100`
    Estimate { percent: u64 },
}

impl Default for GasPolicy {
    fn default() -> Self {
        Self::Fixed(DEFAULT_GAS_LIMIT)
    }
}

impl GasPolicy {
    /// Estimate with the standard 1.5x margin
    pub const fn estimate() -> Self {
        Self::Estimate { percent: 150 }
    }

    /// Limit for a call given the node's estimate (ignored for `Fixed`)
    pub fn gas_limit(&self, estimate: u64) -> u64 {
        match self {
            Self::Fixed(limit) => *limit,
            Self::Estimate { percent } => estimate.saturating_mul(*percent) / 100,
        }
    }
}

/// Submission tuning
#[derive(Debug, Clone)]
pub struct SubmitPolicy {
    pub gas: GasPolicy,
    /// Maximum wait for a receipt
    pub confirm_timeout: Duration,
    pub receipt_poll: Duration,
    /// Extra attempts after a rate-limited one
    pub max_retries: u32,
    /// First backoff, doubled per retry
    pub backoff: Duration,
}

impl Default for SubmitPolicy {
    fn default() -> Self {
        Self {
            gas: GasPolicy::default(),
            confirm_timeout: Duration::from_secs(60),
            receipt_poll: Duration::from_secs(1),
            max_retries: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

/// Confirmed transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutcome {
    pub hash: Hash,
    pub gas_used: u64,
    pub block_number: u64,
    pub logs: Vec<Log>,
}

impl TxOutcome {
    pub fn hash_hex(&self) -> String {
        to_hex(&self.hash)
    }
}

/// Signs and submits transactions for one wallet
#[derive(Debug)]
pub struct TxSubmitter<R> {
    rpc: Arc<R>,
    signer: TxSigner,
    policy: SubmitPolicy,
}

impl<R: ChainRpc> TxSubmitter<R> {
    /// Create a new submitter
    pub fn new(rpc: Arc<R>, signer: TxSigner, policy: SubmitPolicy) -> Self {
        Self { rpc, signer, policy }
    }

    pub const fn address(&self) -> Address {
        self.signer.address()
    }

    pub const fn policy(&self) -> &SubmitPolicy {
        &self.policy
    }

    /// Submit `data` to `to` with `value` attached and wait for it to be mined
    ///
    /// Rate-limited attempts are restarted from the gas step after 2s, 4s
    /// and 8s. Reverts and every other error return immediately.
    pub async fn submit(&self, to: Address, data: Vec<u8>, value: U256) -> Result<TxOutcome, ArenaError> {
        let mut retries = 0u32;
        loop {
            match self.attempt(to, &data, value).await {
                Err(ArenaError::RateLimited(reason)) if retries < self.policy.max_retries => {
                    let delay = self.policy.backoff * 2u32.pow(retries);
                    retries += 1;
                    warn!(
                        "Rate limited ({}), retry {}/{} in {}s",
                        reason,
                        retries,
                        self.policy.max_retries,
                        delay.as_secs()
                    );
                    sleep(delay).await;
                }
                other => return other,
            }
        }
    }

    async fn attempt(&self, to: Address, data: &[u8], value: U256) -> Result<TxOutcome, ArenaError> {
        // 1. Gas limit
        let gas = match self.policy.gas {
            GasPolicy::Fixed(limit) => limit,
            policy @ GasPolicy::Estimate { .. } => {
                let request = CallRequest { from: self.address(), to, data: data.to_vec(), value };
                policy.gas_limit(self.rpc.estimate_gas(&request).await?)
            }
        };

        // 2. Nonce and price, sign, broadcast
        let nonce = self.rpc.nonce(self.address()).await?;
        let gas_price = self.rpc.gas_price().await?;
        let raw = self.signer.sign(&UnsignedTx { to, data: data.to_vec(), value, nonce, gas, gas_price })?;
        let hash = self.rpc.send_raw_transaction(&raw).await?;
        info!("  → tx {} to {} (nonce {}, gas {})", to_hex(&hash), to, nonce, gas);

        // 3. Wait for the receipt
        let receipt = self.wait_for_receipt(hash).await?;

        // 4. Classify
        if !receipt.success {
            warn!("  ✗ tx {} reverted in block {}", to_hex(&hash), receipt.block_number);
            return Err(ArenaError::TxReverted { hash: to_hex(&hash) });
        }
        info!("  ✓ tx {} mined in block {} (gas used {})", to_hex(&hash), receipt.block_number, receipt.gas_used);

        Ok(TxOutcome {
            hash: receipt.hash,
            gas_used: receipt.gas_used,
            block_number: receipt.block_number,
            logs: receipt.logs,
        })
    }

    /// Poll until mined or the confirmation timeout passes
    ///
    /// The transaction is already broadcast here, so poll failures are
    /// tolerated rather than restarting the attempt with a second broadcast.
    /// A poll that does not answer by the deadline counts as the timeout.
    async fn wait_for_receipt(&self, hash: Hash) -> Result<TxReceipt, ArenaError> {
        let deadline = Instant::now() + self.policy.confirm_timeout;
        let timed_out = || ArenaError::TxTimeout { hash: to_hex(&hash), seconds: self.policy.confirm_timeout.as_secs() };
        loop {
            match timeout_at(deadline, self.rpc.receipt(hash)).await {
                Ok(Ok(Some(receipt))) => return Ok(receipt),
                Ok(Ok(None)) => {}
                Ok(Err(e)) => warn!("Receipt poll for {} failed: {}", to_hex(&hash), e),
                Err(_) => return Err(timed_out()),
            }
            if Instant::now() >= deadline {
                return Err(timed_out());
            }
            sleep_until((Instant::now() + self.policy.receipt_poll).min(deadline)).await;
        }
    }
}
