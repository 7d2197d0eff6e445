//! Correlation and trace identifiers for user actions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlation ID tying every log line and the returned outcome of one action together
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Create a new correlation ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CorrelationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Trace context for one orchestrated action
///
/// The correlation id is handed back to the caller as the action id; child
/// spans share the trace and correlation ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceContext {
    /// Unique trace identifier for the entire action
    pub trace_id: String,

    /// Identifier of this step
    pub span_id: String,

    pub correlation_id: CorrelationId,

    pub parent_span_id: Option<String>,

    /// Operation name (`create_bounty`, `finality`, ...)
    pub operation: String,

    pub started_at: DateTime<Utc>,
}

impl TraceContext {
    /// Create a new trace context for an operation
    pub fn new(operation: &str) -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string(),
            span_id: Uuid::new_v4().to_string(),
            correlation_id: CorrelationId::new(),
            parent_span_id: None,
            operation: operation.to_string(),
            started_at: Utc::now(),
        }
    }

    /// Create a child span context
    pub fn child_span(&self, operation: &str) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            span_id: Uuid::new_v4().to_string(),
            correlation_id: self.correlation_id.clone(),
            parent_span_id: Some(self.span_id.clone()),
            operation: operation.to_string(),
            started_at: Utc::now(),
        }
    }

    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    /// `tracing` span carrying the ids, for `Instrument`
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "action",
            operation = %self.operation,
            action_id = %self.correlation_id,
            trace_id = %self.trace_id,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = TraceContext::new("create_bounty");
        let b = TraceContext::new("create_bounty");
        assert_ne!(a.trace_id, b.trace_id);
        assert_ne!(a.correlation_id, b.correlation_id);
    }

    #[test]
    fn test_child_span_keeps_trace_and_correlation() {
        let root = TraceContext::new("submit_label");
        let child = root.child_span("finality");

        assert_eq!(child.trace_id, root.trace_id);
        assert_eq!(child.correlation_id, root.correlation_id);
        assert_eq!(child.parent_span_id.as_deref(), Some(root.span_id.as_str()));
        assert_ne!(child.span_id, root.span_id);
        assert_eq!(child.operation, "finality");
    }

    #[test]
    fn test_correlation_id_serializes_as_string() {
        let id = CorrelationId::from("abc");
        assert_eq!(serde_json::to_value(&id).unwrap(), serde_json::json!("abc"));
        assert_eq!(id.to_string(), "abc");
    }
}
