use crate::coins::Coin;
use crate::tx::StdTx;
use async_trait::async_trait;
use core_logic::{ConfigError, NetworkError, SpamStats};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

/// On-chain view of one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountState {
    pub address: String,
    pub coins: Vec<Coin>,
    pub account_number: u64,
    pub sequence: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub hash: String,
}

/// The two chain calls the engine needs. Queries go through the query gate,
/// submissions do not.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn get_account(&self, address: &str) -> Result<AccountState, NetworkError>;

    async fn submit(&self, tx: &StdTx) -> Result<TxReceipt, NetworkError>;
}

/// Cosmos-SDK light client daemon (LCD) REST client.
pub struct RestClient {
    http: reqwest::Client,
    base: Url,
    timeout: Duration,
    stats: Arc<SpamStats>,
}

impl RestClient {
    pub fn new(node_url: &str, timeout: Duration, stats: Arc<SpamStats>) -> Result<Self, ConfigError> {
        let mut base = Url::parse(node_url)
            .map_err(|e| ConfigError::invalid("node_url", e.to_string()))?;
        // join() would otherwise drop the last path segment
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::invalid("node_url", e.to_string()))?;

        Ok(Self {
            http,
            base,
            timeout,
            stats,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, NetworkError> {
        self.base.join(path).map_err(|e| NetworkError::InvalidResponse {
            endpoint: path.to_string(),
            reason: e.to_string(),
        })
    }

    fn transport_error(&self, endpoint: &Url, err: reqwest::Error) -> NetworkError {
        if err.is_timeout() {
            NetworkError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
                endpoint: endpoint.to_string(),
            }
        } else {
            NetworkError::Transport {
                endpoint: endpoint.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl ChainClient for RestClient {
    async fn get_account(&self, address: &str) -> Result<AccountState, NetworkError> {
        let url = self.endpoint(&format!("auth/accounts/{}", address))?;
        let started = Instant::now();
        let response = self.http.get(url.clone()).send().await;
        self.stats.record_rpc_latency(started.elapsed());

        let response = response.map_err(|e| self.transport_error(&url, e))?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(NetworkError::AccountNotFound {
                address: address.to_string(),
            });
        }
        if !status.is_success() {
            return Err(NetworkError::HttpError {
                status_code: status.as_u16(),
                endpoint: url.to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(&url, e))?;
        debug!("account {} -> {} bytes", address, body.len());
        parse_account(address, url.as_str(), &body)
    }

    async fn submit(&self, tx: &StdTx) -> Result<TxReceipt, NetworkError> {
        let url = self.endpoint("txs")?;
        let started = Instant::now();
        let response = self
            .http
            .post(url.clone())
            .json(&json!({ "tx": tx, "mode": "sync" }))
            .send()
            .await;
        self.stats.record_rpc_latency(started.elapsed());

        let response = response.map_err(|e| self.transport_error(&url, e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(&url, e))?;

        if !status.is_success() {
            return Err(NetworkError::SubmitRejected {
                code: u32::from(status.as_u16()),
                log: body,
            });
        }
        parse_receipt(url.as_str(), &body)
    }
}

#[derive(Deserialize)]
struct RawAccount {
    #[serde(default)]
    address: String,
    #[serde(default)]
    coins: Option<Vec<Coin>>,
    #[serde(default)]
    account_number: Option<Value>,
    #[serde(default)]
    sequence: Option<Value>,
}

fn int_field(endpoint: &str, name: &str, value: Option<Value>) -> Result<i64, NetworkError> {
    let invalid = |reason: String| NetworkError::InvalidResponse {
        endpoint: endpoint.to_string(),
        reason,
    };
    match value {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| invalid(format!("{} is not an integer", name))),
        Some(Value::String(s)) => s
            .parse()
            .map_err(|_| invalid(format!("{} '{}' is not an integer", name, s))),
        Some(other) => Err(invalid(format!("unexpected {} value {}", name, other))),
    }
}

/// Accepts a bare account object or one wrapped in `{"type", "value"}` and
/// optionally in `{"result"}`.
pub(crate) fn parse_account(
    address: &str,
    endpoint: &str,
    body: &str,
) -> Result<AccountState, NetworkError> {
    let not_found = || NetworkError::AccountNotFound {
        address: address.to_string(),
    };
    if body.trim().is_empty() {
        return Err(not_found());
    }

    let mut value: Value = serde_json::from_str(body).map_err(|e| NetworkError::InvalidResponse {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })?;
    if let Some(inner) = value.get_mut("result").map(Value::take) {
        value = inner;
    }
    if let Some(inner) = value.get_mut("value").map(Value::take) {
        value = inner;
    }
    if value.is_null() {
        return Err(not_found());
    }

    let raw: RawAccount = serde_json::from_value(value).map_err(|e| NetworkError::InvalidResponse {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })?;
    let account_number = int_field(endpoint, "account_number", raw.account_number)?;

    Ok(AccountState {
        address: if raw.address.is_empty() {
            address.to_string()
        } else {
            raw.address
        },
        coins: raw.coins.unwrap_or_default(),
        account_number: account_number.max(0) as u64,
        sequence: int_field(endpoint, "sequence", raw.sequence)?,
    })
}

#[derive(Deserialize)]
struct RawReceipt {
    #[serde(default, alias = "txhash")]
    hash: String,
    #[serde(default)]
    code: u32,
    #[serde(default, alias = "raw_log")]
    log: String,
}

pub(crate) fn parse_receipt(endpoint: &str, body: &str) -> Result<TxReceipt, NetworkError> {
    let raw: RawReceipt = serde_json::from_str(body).map_err(|e| NetworkError::InvalidResponse {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })?;
    if raw.code != 0 {
        return Err(NetworkError::SubmitRejected {
            code: raw.code,
            log: raw.log,
        });
    }
    Ok(TxReceipt { hash: raw.hash })
}
