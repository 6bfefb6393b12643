//! JSON-RPC chain access
//!
//! [`ChainRpc`] is the only seam between the client and the node. The
//! submitter, the contract adapter and the tests all go through it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use arena_bindings::Log;
use arena_core::abi::{decode_revert_reason, from_hex, hash_from_hex, to_hex};
use arena_core::{Address, Hash, U256};
use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

/// Transport-level failure, classified so callers can react differently
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RpcError {
    #[error("{0}")]
    RateLimited(String),
    /// `eth_call` / `eth_estimateGas` rejected by contract logic
    #[error("{0}")]
    Reverted(String),
    #[error("{0}")]
    Transport(String),
    #[error("{message}")]
    Response { code: i64, message: String },
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Provider wording for quota and throttling failures
const RATE_LIMIT_MARKERS: [&str; 6] = [
    "429",
    "too many requests",
    "rate limit",
    "request limit",
    "compute units",
    "capacity exceeded",
];

/// Whether an error message reads as provider throttling
pub fn is_rate_limit_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    RATE_LIMIT_MARKERS.iter().any(|m| lower.contains(m))
}

/// Parameters for `eth_call`-shaped requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Address,
    pub to: Address,
    pub data: Vec<u8>,
    pub value: U256,
}

/// Mined transaction receipt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub hash: Hash,
    /// `true` for status 0x1
    pub success: bool,
    pub gas_used: u64,
    pub block_number: u64,
    pub logs: Vec<Log>,
}

/// Chain operations the client needs
#[async_trait]
pub trait ChainRpc: Send + Sync {
    async fn chain_id(&self) -> Result<u64, RpcError>;

    /// `eth_call` against the latest block
    async fn call(&self, to: Address, data: &[u8]) -> Result<Vec<u8>, RpcError>;

    async fn balance(&self, who: Address) -> Result<U256, RpcError>;

    /// Timestamp of the latest block, the clock phase deadlines are measured against
    async fn latest_timestamp(&self) -> Result<u64, RpcError>;

    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64, RpcError>;

    /// Pending nonce of `who`
    async fn nonce(&self, who: Address) -> Result<u64, RpcError>;

    async fn gas_price(&self) -> Result<U256, RpcError>;

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<Hash, RpcError>;

    /// `None` until the transaction is mined
    async fn receipt(&self, hash: Hash) -> Result<Option<TxReceipt>, RpcError>;
}

/// Upper bound on a single JSON-RPC round trip
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP JSON-RPC client
#[derive(Debug)]
pub struct HttpRpc {
    url: String,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl HttpRpc {
    /// Create a new client for `url` with the default request timeout
    pub fn new(url: impl Into<String>) -> Result<Self, RpcError> {
        Self::with_timeout(url, REQUEST_TIMEOUT)
    }

    /// Every request, connect and body read included, fails after `timeout`
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| RpcError::Transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { url: url.into(), client, next_id: AtomicU64::new(1) })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Call RPC
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id
        });
        debug!("→ {} {}", method, request["params"]);

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_transport(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| classify_transport(e.to_string()))?;
        debug!("← {} {} {}", method, status, body);

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RpcError::RateLimited(format!("HTTP 429 from {}", method)));
        }
        let response: Value = match serde_json::from_str(&body) {
            Ok(v) => v,
            Err(_) if !status.is_success() => {
                return Err(classify_transport(format!("HTTP {}: {}", status, body)));
            }
            Err(e) => return Err(RpcError::Malformed(e.to_string())),
        };

        parse_response(response)
    }
}

fn classify_transport(message: String) -> RpcError {
    if is_rate_limit_message(&message) {
        RpcError::RateLimited(message)
    } else {
        RpcError::Transport(message)
    }
}

/// Extract `result`, or classify the `error` object of a JSON-RPC response
pub fn parse_response(response: Value) -> Result<Value, RpcError> {
    if let Some(error) = response.get("error") {
        return Err(classify_error(error));
    }
    response
        .get("result")
        .cloned()
        .ok_or_else(|| RpcError::Malformed("no result in response".to_string()))
}

/// Classify a JSON-RPC error object
pub fn classify_error(error: &Value) -> RpcError {
    let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
        .to_string();

    // Revert data may sit directly in `data` or nested one level down
    let revert_data = error
        .get("data")
        .and_then(|d| d.as_str().or_else(|| d.get("data").and_then(Value::as_str)))
        .and_then(|s| from_hex(s).ok());

    if code == 3 || message.to_lowercase().contains("revert") {
        let reason = revert_data
            .as_deref()
            .and_then(decode_revert_reason)
            .unwrap_or(message);
        return RpcError::Reverted(reason);
    }
    if code == -32005 || is_rate_limit_message(&message) {
        return RpcError::RateLimited(message);
    }
    RpcError::Response { code, message }
}

fn as_str<'a>(value: &'a Value, what: &str) -> Result<&'a str, RpcError> {
    value.as_str().ok_or_else(|| RpcError::Malformed(format!("{} is not a string", what)))
}

/// Parse a hex quantity that fits in `u64`
pub fn parse_quantity(value: &Value) -> Result<u64, RpcError> {
    let s = as_str(value, "quantity")?;
    u64::from_str_radix(s.trim_start_matches("0x"), 16)
        .map_err(|e| RpcError::Malformed(format!("quantity {}: {}", s, e)))
}

pub fn parse_u256(value: &Value) -> Result<U256, RpcError> {
    let s = as_str(value, "quantity")?;
    let digits = s.trim_start_matches("0x");
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16).map_err(|e| RpcError::Malformed(format!("quantity {}: {}", s, e)))
}

pub fn parse_bytes(value: &Value) -> Result<Vec<u8>, RpcError> {
    let s = as_str(value, "data")?;
    from_hex(s).map_err(|e| RpcError::Malformed(format!("data: {}", e)))
}

fn parse_hash(value: &Value) -> Result<Hash, RpcError> {
    let s = as_str(value, "hash")?;
    hash_from_hex(s).map_err(|e| RpcError::Malformed(format!("hash {}: {}", s, e)))
}

fn parse_address(value: &Value) -> Result<Address, RpcError> {
    let s = as_str(value, "address")?;
    s.parse().map_err(|e| RpcError::Malformed(format!("address {}: {}", s, e)))
}

fn parse_log(value: &Value) -> Result<Log, RpcError> {
    let topics = value
        .get("topics")
        .and_then(Value::as_array)
        .map(|t| t.iter().map(parse_hash).collect::<Result<Vec<_>, _>>())
        .transpose()?
        .unwrap_or_default();
    Ok(Log {
        address: parse_address(&value["address"])?,
        topics,
        data: value.get("data").map(parse_bytes).transpose()?.unwrap_or_default(),
    })
}

/// Parse an `eth_getTransactionReceipt` result; `null` means not yet mined
pub fn parse_receipt(value: &Value) -> Result<Option<TxReceipt>, RpcError> {
    if value.is_null() {
        return Ok(None);
    }
    let logs = value
        .get("logs")
        .and_then(Value::as_array)
        .map(|logs| logs.iter().map(parse_log).collect::<Result<Vec<_>, _>>())
        .transpose()?
        .unwrap_or_default();
    Ok(Some(TxReceipt {
        hash: parse_hash(&value["transactionHash"])?,
        success: parse_quantity(&value["status"])? == 1,
        gas_used: parse_quantity(&value["gasUsed"])?,
        block_number: parse_quantity(&value["blockNumber"])?,
        logs,
    }))
}

fn call_object(request: &CallRequest) -> Value {
    json!({
        "from": request.from.to_string(),
        "to": request.to.to_string(),
        "data": to_hex(&request.data),
        "value": format!("0x{:x}", request.value),
    })
}

#[async_trait]
impl ChainRpc for HttpRpc {
    async fn chain_id(&self) -> Result<u64, RpcError> {
        parse_quantity(&self.request("eth_chainId", json!([])).await?)
    }

    async fn call(&self, to: Address, data: &[u8]) -> Result<Vec<u8>, RpcError> {
        let result = self
            .request(
                "eth_call",
                json!([{ "to": to.to_string(), "data": to_hex(data) }, "latest"]),
            )
            .await?;
        parse_bytes(&result)
    }

    async fn balance(&self, who: Address) -> Result<U256, RpcError> {
        parse_u256(&self.request("eth_getBalance", json!([who.to_string(), "latest"])).await?)
    }

    async fn latest_timestamp(&self) -> Result<u64, RpcError> {
        let block = self.request("eth_getBlockByNumber", json!(["latest", false])).await?;
        parse_quantity(&block["timestamp"])
    }

    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64, RpcError> {
        parse_quantity(&self.request("eth_estimateGas", json!([call_object(request)])).await?)
    }

    async fn nonce(&self, who: Address) -> Result<u64, RpcError> {
        parse_quantity(
            &self
                .request("eth_getTransactionCount", json!([who.to_string(), "pending"]))
                .await?,
        )
    }

    async fn gas_price(&self) -> Result<U256, RpcError> {
        parse_u256(&self.request("eth_gasPrice", json!([])).await?)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<Hash, RpcError> {
        parse_hash(&self.request("eth_sendRawTransaction", json!([to_hex(raw)])).await?)
    }

    async fn receipt(&self, hash: Hash) -> Result<Option<TxReceipt>, RpcError> {
        parse_receipt(&self.request("eth_getTransactionReceipt", json!([to_hex(&hash)])).await?)
    }
}
