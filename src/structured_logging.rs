//! Per-action structured logging
//!
//! One logger per orchestrated action; every line carries the action id so a
//! whole build → sign → finality → parse sequence can be filtered out of the
//! log stream.

use crate::classifier::ParsedError;
use crate::observability::CorrelationId;
use crate::types::TransactionResult;

/// Structured logger for orchestration steps
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    action_id: CorrelationId,
    action: &'static str,
}

impl StructuredLogger {
    pub fn new(action_id: CorrelationId, action: &'static str) -> Self {
        Self { action_id, action }
    }

    pub fn action_id(&self) -> &CorrelationId {
        &self.action_id
    }

    pub fn log_started(&self, sender: Option<&str>) {
        tracing::info!(
            action_id = %self.action_id,
            action = self.action,
            sender = ?sender,
            "Action started"
        );
    }

    pub fn log_call_built(&self, inputs: usize, commands: usize) {
        tracing::debug!(
            action_id = %self.action_id,
            action = self.action,
            inputs,
            commands,
            "Call built"
        );
    }

    pub fn log_signature_requested(&self, sender: &str) {
        tracing::info!(
            action_id = %self.action_id,
            action = self.action,
            sender = %sender,
            "Waiting for wallet approval"
        );
    }

    pub fn log_submitted(&self, digest: &str) {
        tracing::info!(
            action_id = %self.action_id,
            action = self.action,
            digest = %digest,
            "Transaction submitted, waiting for finality"
        );
    }

    pub fn log_finalized(&self, digest: &str, latency_ms: u64) {
        tracing::debug!(
            action_id = %self.action_id,
            action = self.action,
            digest = %digest,
            latency_ms,
            "Finality response received"
        );
    }

    pub fn log_step_failed(&self, step: &str, error: &ParsedError) {
        tracing::warn!(
            action_id = %self.action_id,
            action = self.action,
            step = %step,
            kind = %error.kind,
            can_retry = error.can_retry,
            "Action step failed"
        );
    }

    pub fn log_outcome(&self, result: &TransactionResult) {
        if result.success {
            tracing::info!(
                action_id = %self.action_id,
                action = self.action,
                digest = ?result.digest,
                object_id = ?result.object_id,
                events = result.events.len(),
                "Action succeeded"
            );
        } else {
            tracing::warn!(
                action_id = %self.action_id,
                action = self.action,
                digest = ?result.digest,
                error = ?result.error,
                "Action failed"
            );
        }
    }
}
