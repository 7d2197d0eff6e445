//! JSON-RPC 2.0 client for a Sui fullnode
//!
//! One `reqwest::Client` with a per-request timeout, an optional client-side
//! rate limit (`governor`), and HTTP/JSON-RPC failures mapped onto
//! [`ChainError`]. Finality waiting polls `sui_getTransactionBlock` until the
//! digest is indexed.

use super::{
    Balance, ChainClient, ChainError, DynamicFieldInfo, EventCursor, FinalityOptions, ObjectResponse, Page,
};
use crate::config::Config;
use crate::metrics::{metrics, Timer};
use crate::response::{SuiEvent, TransactionBlockResponse};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, trace, warn};

/// Settings for [`SuiRpcClient`]
#[derive(Debug, Clone)]
pub struct SuiRpcSettings {
    pub url: String,
    pub request_timeout: Duration,
    /// Requests per second, 0 disables limiting
    pub rate_limit_rps: u32,
    pub poll_interval: Duration,
    pub wait_timeout: Duration,
}

impl SuiRpcSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            url: config.network.rpc_url().to_string(),
            request_timeout: config.network.request_timeout(),
            rate_limit_rps: config.network.rate_limit_rps,
            poll_interval: config.finality.poll_interval(),
            wait_timeout: config.finality.wait_timeout(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Sui JSON-RPC client
pub struct SuiRpcClient {
    http: Client,
    settings: SuiRpcSettings,
    limiter: Option<DefaultDirectRateLimiter>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for SuiRpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuiRpcClient")
            .field("url", &self.settings.url)
            .field("rate_limited", &self.limiter.is_some())
            .finish()
    }
}

impl SuiRpcClient {
    pub fn new(settings: SuiRpcSettings) -> Result<Self, ChainError> {
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| ChainError::Network(format!("failed to build HTTP client: {}", e)))?;

        let limiter = NonZeroU32::new(settings.rate_limit_rps)
            .map(|rps| RateLimiter::direct(Quota::per_second(rps)));

        Ok(Self {
            http,
            settings,
            limiter,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ChainError> {
        Self::new(SuiRpcSettings::from_config(config))
    }

    pub fn url(&self) -> &str {
        &self.settings.url
    }

    /// Perform one JSON-RPC call and decode its `result`
    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ChainError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        metrics().rpc_requests.with_label_values(&[method]).inc();
        let timer = Timer::new();
        trace!(method, id, "Sending RPC request");

        let result = self.send(&payload).await;
        timer.observe_duration(&metrics().rpc_latency);

        let value = result.map_err(|e| {
            debug!(method, id, error = %e, "RPC request failed");
            e
        })?;

        serde_json::from_value(value).map_err(|e| ChainError::Decode(format!("{}: {}", method, e)))
    }

    async fn send(&self, payload: &Value) -> Result<Value, ChainError> {
        let response = self
            .http
            .post(&self.settings.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => return Err(ChainError::RateLimited),
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
                return Err(ChainError::Unavailable {
                    status: response.status().as_u16(),
                })
            }
            _ => {}
        }

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        let envelope: RpcEnvelope = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(ChainError::Http {
                    status: status.as_u16(),
                })
            }
            Err(e) => return Err(ChainError::Decode(e.to_string())),
        };

        if let Some(error) = envelope.error {
            return Err(ChainError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        envelope
            .result
            .ok_or_else(|| ChainError::Decode("response has neither result nor error".to_string()))
    }

    fn transport_error(&self, error: reqwest::Error) -> ChainError {
        if error.is_timeout() {
            ChainError::Timeout {
                timeout_ms: self.settings.request_timeout.as_millis() as u64,
            }
        } else {
            ChainError::Network(error.to_string())
        }
    }

    /// Single `sui_getTransactionBlock` lookup, no polling
    pub async fn get_transaction_block(
        &self,
        digest: &str,
        options: &FinalityOptions,
    ) -> Result<TransactionBlockResponse, ChainError> {
        self.call("sui_getTransactionBlock", json!([digest, options])).await
    }
}

#[async_trait]
impl ChainClient for SuiRpcClient {
    async fn execute_transaction_block(
        &self,
        tx_bytes: &str,
        signatures: &[String],
        options: &FinalityOptions,
    ) -> Result<TransactionBlockResponse, ChainError> {
        self.call(
            "sui_executeTransactionBlock",
            json!([tx_bytes, signatures, options]),
        )
        .await
    }

    async fn wait_for_transaction(
        &self,
        digest: &str,
        options: &FinalityOptions,
    ) -> Result<TransactionBlockResponse, ChainError> {
        let started = Instant::now();
        let deadline = started + self.settings.wait_timeout;
        let mut polls = 0u32;

        loop {
            polls += 1;
            match self.get_transaction_block(digest, options).await {
                Ok(response) => {
                    debug!(digest, polls, "Transaction indexed");
                    return Ok(response);
                }
                Err(e) if e.is_not_yet_known() => {
                    trace!(digest, polls, "Transaction not indexed yet");
                }
                Err(e) => return Err(e),
            }

            if Instant::now() + self.settings.poll_interval > deadline {
                let waited_ms = started.elapsed().as_millis() as u64;
                warn!(digest, polls, waited_ms, "Gave up waiting for transaction");
                return Err(ChainError::FinalityTimeout {
                    digest: digest.to_string(),
                    waited_ms,
                });
            }
            sleep(self.settings.poll_interval).await;
        }
    }

    async fn get_balance(&self, owner: &str, coin_type: &str) -> Result<Balance, ChainError> {
        self.call("suix_getBalance", json!([owner, coin_type])).await
    }

    async fn get_object(&self, object_id: &str) -> Result<ObjectResponse, ChainError> {
        self.call(
            "sui_getObject",
            json!([object_id, { "showContent": true, "showType": true }]),
        )
        .await
    }

    async fn get_dynamic_fields(
        &self,
        parent_id: &str,
        cursor: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Page<DynamicFieldInfo>, ChainError> {
        self.call("suix_getDynamicFields", json!([parent_id, cursor, limit]))
            .await
    }

    async fn query_events(
        &self,
        event_type: &str,
        cursor: Option<&EventCursor>,
        limit: Option<usize>,
        descending: bool,
    ) -> Result<Page<SuiEvent, EventCursor>, ChainError> {
        self.call(
            "suix_queryEvents",
            json!([{ "MoveEventType": event_type }, cursor, limit, descending]),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(url: &str) -> SuiRpcSettings {
        SuiRpcSettings {
            url: url.to_string(),
            request_timeout: Duration::from_secs(5),
            rate_limit_rps: 0,
            poll_interval: Duration::from_millis(10),
            wait_timeout: Duration::from_millis(100),
        }
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.network.rate_limit_rps = 5;
        let settings = SuiRpcSettings::from_config(&config);

        assert_eq!(settings.url, "https://fullnode.testnet.sui.io:443");
        assert_eq!(settings.request_timeout, Duration::from_secs(30));
        assert_eq!(settings.poll_interval, Duration::from_secs(2));
        assert_eq!(settings.wait_timeout, Duration::from_secs(60));
        assert_eq!(settings.rate_limit_rps, 5);
    }

    #[test]
    fn test_rate_limit_zero_disables_limiter() {
        let client = SuiRpcClient::new(settings("http://127.0.0.1:1")).unwrap();
        assert!(client.limiter.is_none());

        let limited = SuiRpcClient::new(SuiRpcSettings {
            rate_limit_rps: 10,
            ..settings("http://127.0.0.1:1")
        })
        .unwrap();
        assert!(limited.limiter.is_some());
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        // Port 1 is never listening in test environments
        let client = SuiRpcClient::new(settings("http://127.0.0.1:1")).unwrap();
        let err = client.get_object("0x1").await.unwrap_err();
        assert!(matches!(err, ChainError::Network(_) | ChainError::Timeout { .. }), "{:?}", err);
        assert!(err.is_retryable());
    }
}
