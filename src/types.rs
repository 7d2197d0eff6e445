//! Common types used throughout the client

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of MIST in one SUI
pub const MIST_PER_SUI: u64 = 1_000_000_000;

/// Parameters for the create-bounty call
///
/// `file_name_list` and `blob_ids` are parallel: index `i` of one pairs with
/// index `i` of the other on-chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBountyParams {
    pub name: String,
    pub file_name_list: Vec<String>,
    pub blob_ids: Vec<String>,
    pub allowed_labels: Vec<String>,
    pub total_images: u64,
    /// Reward escrowed by the bounty, in MIST
    pub reward_amount: u64,
}

/// Parameters for the submit-label call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitLabelParams {
    pub bounty_object_id: String,
    pub file_name: String,
    pub label: String,
}

/// Decoded `LabelFinalizedEvent`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelFinalizedEvent {
    pub bounty_id: String,
    pub file_name: String,
    pub final_label: String,
    /// Client-side decode time; display hint only, not chain ordering
    pub timestamp: DateTime<Utc>,
}

/// Domain events decoded from a transaction's event list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DomainEvent {
    LabelFinalizedEvent(LabelFinalizedEvent),
}

/// Canonical outcome of a submitted call
///
/// Built through [`TransactionResult::succeeded`] and
/// [`TransactionResult::failed`] so that `error` is present exactly when
/// `success` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(default)]
    pub events: Vec<DomainEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TransactionResult {
    pub fn succeeded(digest: impl Into<String>, object_id: Option<String>, events: Vec<DomainEvent>) -> Self {
        Self {
            success: true,
            digest: Some(digest.into()),
            object_id,
            events,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>, digest: Option<String>) -> Self {
        Self {
            success: false,
            digest,
            object_id: None,
            events: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Iterate over the decoded label-finalized events
    pub fn finalized_labels(&self) -> impl Iterator<Item = &LabelFinalizedEvent> {
        self.events.iter().map(|event| match event {
            DomainEvent::LabelFinalizedEvent(label) => label,
        })
    }
}

/// Convert a whole-SUI amount to MIST, rounding down
///
/// Returns `None` for negative, non-finite or overflowing amounts.
pub fn sui_to_mist(amount: f64) -> Option<u64> {
    if !amount.is_finite() || amount < 0.0 {
        return None;
    }
    let mist = (amount * MIST_PER_SUI as f64).floor();
    if mist > u64::MAX as f64 {
        return None;
    }
    Some(mist as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_invariant() {
        let ok = TransactionResult::succeeded("D1", Some("0xabc".into()), vec![]);
        assert!(ok.success);
        assert!(ok.error.is_none());

        let failed = TransactionResult::failed("boom", Some("D2".into()));
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("boom"));
        assert!(failed.object_id.is_none());
    }

    #[test]
    fn test_result_serialization() {
        let failed = TransactionResult::failed("boom", None);
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "boom");
        assert!(json.get("digest").is_none());
        assert!(json.get("objectId").is_none());
    }

    #[test]
    fn test_event_tagging() {
        let event = DomainEvent::LabelFinalizedEvent(LabelFinalizedEvent {
            bounty_id: "0x1".into(),
            file_name: "a.jpg".into(),
            final_label: "cat".into(),
            timestamp: Utc::now(),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "LabelFinalizedEvent");
        assert_eq!(json["bountyId"], "0x1");
        assert_eq!(json["finalLabel"], "cat");
    }

    #[test]
    fn test_sui_to_mist() {
        assert_eq!(sui_to_mist(1.0), Some(1_000_000_000));
        assert_eq!(sui_to_mist(0.5), Some(500_000_000));
        assert_eq!(sui_to_mist(0.0000000019), Some(1));
        assert_eq!(sui_to_mist(-1.0), None);
        assert_eq!(sui_to_mist(f64::NAN), None);
    }
}
