//! Finality response model and decoder
//!
//! The raw types mirror the parts of a Sui `SuiTransactionBlockResponse` this
//! client reads; everything else in the fullnode's answer is ignored on
//! deserialization. [`parse_transaction_response`] turns one into the
//! canonical [`TransactionResult`].

use crate::classifier::parse_transaction_error;
use crate::types::{DomainEvent, LabelFinalizedEvent, TransactionResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Event type marker for label finalization
pub const LABEL_FINALIZED_MARKER: &str = "LabelFinalizedEvent";

/// Failure text when the response carries no effects section
pub const EFFECTS_NOT_AVAILABLE: &str = "Transaction effects not available. Please try again.";

const GENERIC_FAILURE: &str = "Transaction failed";

const BOUNTY_ID_KEYS: &[&str] = &["bounty_id", "bountyId"];
const FILE_NAME_KEYS: &[&str] = &["file_name", "fileName"];
const FINAL_LABEL_KEYS: &[&str] = &["final_label", "finalLabel"];

/// Raw transaction block as returned by the fullnode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionBlockResponse {
    pub digest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effects: Option<TransactionEffects>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<SuiEvent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_changes: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEffects {
    pub status: ExecutionStatus,
    #[serde(default)]
    pub created: Vec<OwnedObjectRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<Value>,
}

/// Execution status; `status` is `"success"` or `"failure"`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStatus {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionStatus {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedObjectRef {
    #[serde(default)]
    pub owner: Value,
    pub reference: ObjectRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRef {
    pub object_id: String,
    #[serde(default)]
    pub version: Value,
    #[serde(default)]
    pub digest: String,
}

/// Raw Move event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_module: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_json: Option<Value>,
}

/// Interpret a finality response
///
/// Never fails: missing effects and on-chain failures both become a failed
/// [`TransactionResult`]. On-chain error strings are classified and only the
/// user-facing sentence is kept.
pub fn parse_transaction_response(response: &TransactionBlockResponse) -> TransactionResult {
    let digest = (!response.digest.is_empty()).then(|| response.digest.clone());

    let effects = match &response.effects {
        Some(effects) => effects,
        None => {
            warn!(digest = %response.digest, "Finality response carried no effects");
            return TransactionResult::failed(EFFECTS_NOT_AVAILABLE, digest);
        }
    };

    if !effects.status.is_success() {
        let raw = effects
            .status
            .error
            .as_deref()
            .filter(|error| !error.is_empty())
            .unwrap_or(GENERIC_FAILURE);
        warn!(digest = %response.digest, status = %effects.status.status, "Transaction failed on-chain");
        let parsed = parse_transaction_error(raw);
        return TransactionResult::failed(parsed.user_message, digest);
    }

    if effects.created.len() > 1 {
        debug!(
            digest = %response.digest,
            created = effects.created.len(),
            "Several objects created, using the first"
        );
    }
    let object_id = effects
        .created
        .first()
        .map(|created| created.reference.object_id.clone());

    let events = parse_events(response.events.as_deref().unwrap_or_default());

    TransactionResult {
        success: true,
        digest,
        object_id,
        events,
        error: None,
    }
}

/// Decode domain events from a raw event list, keeping chain order
///
/// Only events whose type contains [`LABEL_FINALIZED_MARKER`] are decoded.
/// Events without an object payload are dropped.
pub fn parse_events(events: &[SuiEvent]) -> Vec<DomainEvent> {
    events
        .iter()
        .filter(|event| event.event_type.contains(LABEL_FINALIZED_MARKER))
        .filter_map(|event| {
            let decoded = decode_label_finalized(event);
            if decoded.is_none() {
                debug!(event_type = %event.event_type, "Dropping event without payload");
            }
            decoded
        })
        .map(DomainEvent::LabelFinalizedEvent)
        .collect()
}

fn decode_label_finalized(event: &SuiEvent) -> Option<LabelFinalizedEvent> {
    let payload = event.parsed_json.as_ref()?.as_object()?;

    Some(LabelFinalizedEvent {
        bounty_id: lookup_string(payload, BOUNTY_ID_KEYS),
        file_name: lookup_string(payload, FILE_NAME_KEYS),
        final_label: lookup_string(payload, FINAL_LABEL_KEYS),
        timestamp: Utc::now(),
    })
}

/// First present key wins; an absent field decodes to an empty string
pub fn lookup_field<'a>(payload: &'a serde_json::Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .find_map(|key| payload.get(*key).filter(|value| !value.is_null()))
}

fn lookup_string(payload: &serde_json::Map<String, Value>, keys: &[&str]) -> String {
    match lookup_field(payload, keys) {
        Some(Value::String(value)) => value.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
