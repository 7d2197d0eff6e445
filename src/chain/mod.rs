//! Chain query/submit boundary
//!
//! [`ChainClient`] is everything the client needs from a Sui fullnode. The
//! orchestrator and the bounty read side only see the trait; [`SuiRpcClient`]
//! is the JSON-RPC implementation.

pub mod sui_rpc;

pub use sui_rpc::SuiRpcClient;

use crate::response::{SuiEvent, TransactionBlockResponse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Marker the fullnode uses while a digest is not yet indexed
pub const TRANSACTION_NOT_YET_KNOWN: &str = "Could not find the referenced transaction";

/// Chain client errors
///
/// Display strings carry the words the network classifier keys on, so a
/// classified `ChainError` lands in the right group without extra mapping.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// Transport failure (connect, reset, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// A single request exceeded the configured timeout
    #[error("Request timeout after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// Fullnode throttled us (HTTP 429)
    #[error("HTTP 429: rate limit exceeded")]
    RateLimited,

    /// Fullnode or gateway unavailable (HTTP 502/503/504)
    #[error("Service unavailable (HTTP {status})")]
    Unavailable { status: u16 },

    /// Any other non-success HTTP status
    #[error("Unexpected HTTP status {status}")]
    Http { status: u16 },

    /// JSON-RPC error object
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Body did not decode into the expected shape
    #[error("Invalid response: {0}")]
    Decode(String),

    /// Digest did not finalize within the wait budget
    #[error("Finality wait timeout for {digest} after {waited_ms} ms")]
    FinalityTimeout { digest: String, waited_ms: u64 },
}

impl ChainError {
    /// Whether the same request may succeed if repeated
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_)
            | Self::Timeout { .. }
            | Self::RateLimited
            | Self::Unavailable { .. }
            | Self::FinalityTimeout { .. } => true,
            Self::Http { status } => *status >= 500,
            Self::Rpc { .. } | Self::Decode(_) => false,
        }
    }

    /// True while the fullnode has not indexed a digest yet
    pub fn is_not_yet_known(&self) -> bool {
        matches!(self, Self::Rpc { message, .. } if message.contains(TRANSACTION_NOT_YET_KNOWN))
    }

    /// Get the error category for metrics and observability
    pub fn category(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Timeout { .. } | Self::FinalityTimeout { .. } => "timeout",
            Self::RateLimited => "rate_limit",
            Self::Unavailable { .. } | Self::Http { .. } => "http",
            Self::Rpc { .. } => "rpc",
            Self::Decode(_) => "decode",
        }
    }
}

/// Which sections the fullnode should include in a transaction response
///
/// Defaults to everything; override single fields with struct update syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalityOptions {
    pub show_effects: bool,
    pub show_events: bool,
    pub show_object_changes: bool,
}

impl Default for FinalityOptions {
    fn default() -> Self {
        Self {
            show_effects: true,
            show_events: true,
            show_object_changes: true,
        }
    }
}

/// One page of a cursor-paginated query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T, C = String> {
    pub data: Vec<T>,
    #[serde(default)]
    pub next_cursor: Option<C>,
    #[serde(default)]
    pub has_next_page: bool,
}

/// `sui_getObject` answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ObjectData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectData {
    pub object_id: String,
    #[serde(default)]
    pub version: Value,
    #[serde(default)]
    pub digest: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ObjectContent>,
}

/// Parsed object content; `data_type` is `moveObject` or `package`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectContent {
    pub data_type: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Value>,
}

impl ObjectContent {
    /// Struct fields of a Move object, if this is one
    pub fn move_fields(&self) -> Option<&serde_json::Map<String, Value>> {
        if self.data_type != "moveObject" {
            return None;
        }
        self.fields.as_ref()?.as_object()
    }
}

/// Entry of `suix_getDynamicFields`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicFieldInfo {
    pub name: DynamicFieldName,
    pub object_id: String,
    #[serde(default)]
    pub object_type: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicFieldName {
    #[serde(rename = "type")]
    pub name_type: String,
    pub value: Value,
}

/// `suix_getBalance` answer; amounts are decimal strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub coin_type: String,
    #[serde(default)]
    pub coin_object_count: u64,
    pub total_balance: String,
}

impl Balance {
    /// Total balance in the coin's smallest unit
    pub fn total(&self) -> Result<u64, ChainError> {
        self.total_balance
            .parse()
            .map_err(|_| ChainError::Decode(format!("invalid totalBalance {:?}", self.total_balance)))
    }
}

/// Cursor of `suix_queryEvents` (`{txDigest, eventSeq}`)
pub type EventCursor = Value;

/// Query/submit interface to the chain
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Submit an already-signed transaction
    async fn execute_transaction_block(
        &self,
        tx_bytes: &str,
        signatures: &[String],
        options: &FinalityOptions,
    ) -> Result<TransactionBlockResponse, ChainError>;

    /// Wait until `digest` is final and return its response
    async fn wait_for_transaction(
        &self,
        digest: &str,
        options: &FinalityOptions,
    ) -> Result<TransactionBlockResponse, ChainError>;

    /// Total balance of `owner` in `coin_type`
    async fn get_balance(&self, owner: &str, coin_type: &str) -> Result<Balance, ChainError>;

    /// Read an object with its content
    async fn get_object(&self, object_id: &str) -> Result<ObjectResponse, ChainError>;

    /// List dynamic fields of `parent_id`
    async fn get_dynamic_fields(
        &self,
        parent_id: &str,
        cursor: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Page<DynamicFieldInfo>, ChainError>;

    /// Query Move events by fully qualified type
    async fn query_events(
        &self,
        event_type: &str,
        cursor: Option<&EventCursor>,
        limit: Option<usize>,
        descending: bool,
    ) -> Result<Page<SuiEvent, EventCursor>, ChainError>;
}
