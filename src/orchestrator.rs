//! Transaction orchestrator
//!
//! Runs one user action end to end:
//! 1. require a connected wallet session (no chain traffic otherwise)
//! 2. build the unsigned call
//! 3. for a new bounty, compare the sender's balance with the reward
//!    (`contract.check_balance`)
//! 4. hand it to the wallet signer and suspend until the user decides
//! 5. wait for finality with bounded backoff
//! 6. parse the finality response
//!
//! Steps run strictly in order. Every failure is classified where it happens
//! and returned as a failed [`TransactionResult`]; nothing escapes as an error.

use crate::chain::{ChainClient, FinalityOptions};
use crate::classifier::{
    parse_network_error, parse_transaction_error, parse_wallet_error, ErrorKind, ParsedError,
};
use crate::config::ContractConfig;
use crate::metrics::{metrics, Timer};
use crate::observability::{CorrelationId, TraceContext};
use crate::response::{parse_transaction_response, TransactionBlockResponse};
use crate::retry::{retry_with_backoff, RetryOptions};
use crate::structured_logging::StructuredLogger;
use crate::tx_builder::{
    build_create_bounty_transaction, build_submit_label_transaction, ProgrammableCall,
    TransactionBuilderError,
};
use crate::types::{CreateBountyParams, SubmitLabelParams, TransactionResult};
use crate::wallet::{WalletSession, WalletSigner};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, warn, Instrument};

const CREATE_BOUNTY: &str = "create_bounty";
const SUBMIT_LABEL: &str = "submit_label";

/// Result of one orchestrated action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutcome {
    /// Correlation id of the action; lets a caller drop results of abandoned flows
    pub action_id: CorrelationId,
    pub result: TransactionResult,
    /// Input state (form fields, focus) may be cleared
    pub reset_inputs: bool,
}

/// Composes builder, signer, finality wait and parser
pub struct TransactionOrchestrator {
    chain: Arc<dyn ChainClient>,
    signer: Arc<dyn WalletSigner>,
    contract: ContractConfig,
    finality_policy: RetryOptions,
}

impl TransactionOrchestrator {
    pub fn new(chain: Arc<dyn ChainClient>, signer: Arc<dyn WalletSigner>, contract: ContractConfig) -> Self {
        Self {
            chain,
            signer,
            contract,
            finality_policy: RetryOptions::finality(),
        }
    }

    /// Replace the finality retry policy (defaults to 3 attempts, 1s → 5s)
    pub fn with_finality_policy(mut self, policy: RetryOptions) -> Self {
        self.finality_policy = policy;
        self
    }

    pub fn contract(&self) -> &ContractConfig {
        &self.contract
    }

    /// Create a bounty; on success `result.object_id` is the new bounty
    pub async fn create_bounty(&self, session: &WalletSession, params: &CreateBountyParams) -> ActionOutcome {
        self.run(CREATE_BOUNTY, session, Some(params.reward_amount), |contract| {
            build_create_bounty_transaction(contract, params)
        })
        .await
    }

    /// Submit a label for one file of a bounty
    pub async fn submit_label(&self, session: &WalletSession, params: &SubmitLabelParams) -> ActionOutcome {
        self.run(SUBMIT_LABEL, session, None, |contract| {
            build_submit_label_transaction(contract, params)
        })
        .await
    }

    /// Wait for `digest` to finalize, retrying transient failures
    ///
    /// `options` defaults to effects, events and object changes. On failure
    /// the error is network-classified; its `Display` is the user message.
    pub async fn wait_for_transaction_with_retry(
        &self,
        digest: &str,
        options: Option<FinalityOptions>,
    ) -> Result<TransactionBlockResponse, ParsedError> {
        let options = options.unwrap_or_default();
        let chain = &self.chain;

        retry_with_backoff(
            || chain.wait_for_transaction(digest, &options),
            &self.finality_policy,
        )
        .await
        .map_err(|e| parse_network_error(&e))
    }

    /// Wait for an already submitted digest and parse it
    pub async fn wait_and_parse(&self, digest: &str) -> TransactionResult {
        match self.wait_for_transaction_with_retry(digest, None).await {
            Ok(response) => parse_transaction_response(&response),
            Err(e) => TransactionResult::failed(e.user_message, Some(digest.to_string())),
        }
    }

    /// Submit a transaction signed elsewhere, then wait and parse
    pub async fn execute_signed(&self, tx_bytes: &str, signatures: &[String]) -> TransactionResult {
        let options = FinalityOptions::default();
        let response = match self
            .chain
            .execute_transaction_block(tx_bytes, signatures, &options)
            .await
        {
            Ok(response) => response,
            Err(e) => return TransactionResult::failed(parse_network_error(&e).user_message, None),
        };

        // Fullnodes may answer before effects are available
        if response.effects.is_none() && !response.digest.is_empty() {
            return self.wait_and_parse(&response.digest).await;
        }
        parse_transaction_response(&response)
    }

    async fn run<B>(
        &self,
        action: &'static str,
        session: &WalletSession,
        required_balance: Option<u64>,
        build: B,
    ) -> ActionOutcome
    where
        B: FnOnce(&ContractConfig) -> Result<ProgrammableCall, TransactionBuilderError>,
    {
        let trace = TraceContext::new(action);
        let logger = StructuredLogger::new(trace.correlation_id().clone(), action);
        metrics().actions_started.with_label_values(&[action]).inc();

        let result = self
            .execute(&trace, &logger, session, required_balance, build)
            .instrument(trace.span())
            .await;

        logger.log_outcome(&result);
        let outcome_metric = if result.success {
            &metrics().actions_succeeded
        } else {
            &metrics().actions_failed
        };
        outcome_metric.with_label_values(&[action]).inc();

        ActionOutcome {
            action_id: trace.correlation_id().clone(),
            reset_inputs: result.success && action == CREATE_BOUNTY,
            result,
        }
    }

    async fn execute<B>(
        &self,
        trace: &TraceContext,
        logger: &StructuredLogger,
        session: &WalletSession,
        required_balance: Option<u64>,
        build: B,
    ) -> TransactionResult
    where
        B: FnOnce(&ContractConfig) -> Result<ProgrammableCall, TransactionBuilderError>,
    {
        logger.log_started(session.address());

        let sender = match session.address() {
            Some(sender) => sender,
            None => {
                let err = ParsedError::wallet_required();
                logger.log_step_failed("session", &err);
                return TransactionResult::failed(err.user_message, None);
            }
        };

        let call = match build(&self.contract) {
            Ok(call) => call,
            Err(e) => {
                let err = builder_failure(&e);
                logger.log_step_failed("build", &err);
                return TransactionResult::failed(err.user_message, None);
            }
        };
        logger.log_call_built(call.inputs.len(), call.commands.len());

        if let Some(required) = required_balance.filter(|_| self.contract.check_balance) {
            if let Err(err) = self.ensure_balance(sender, required).await {
                logger.log_step_failed("balance", &err);
                return TransactionResult::failed(err.user_message, None);
            }
        }

        logger.log_signature_requested(sender);
        let digest = match self.signer.sign_and_execute(sender, &call).await {
            Ok(digest) => digest,
            Err(e) => {
                let err = parse_wallet_error(&e);
                logger.log_step_failed("sign", &err);
                return TransactionResult::failed(err.user_message, None);
            }
        };
        logger.log_submitted(&digest);

        let finality = trace.child_span("finality");
        let timer = Timer::new();
        let response = match self
            .wait_for_transaction_with_retry(&digest, None)
            .instrument(finality.span())
            .await
        {
            Ok(response) => response,
            Err(err) => {
                logger.log_step_failed("finality", &err);
                return TransactionResult::failed(err.user_message, Some(digest));
            }
        };
        timer.observe_duration(&metrics().finality_latency);
        logger.log_finalized(&digest, (timer.elapsed_secs() * 1000.0) as u64);

        parse_transaction_response(&response)
    }

    /// Fail early when `owner` holds less than `required` of the reward coin
    ///
    /// Gas is not included. A failed lookup skips the check; execution still
    /// reports an insufficient balance.
    async fn ensure_balance(&self, owner: &str, required: u64) -> Result<(), ParsedError> {
        let total = match self
            .chain
            .get_balance(owner, &self.contract.coin_type)
            .await
            .and_then(|balance| balance.total())
        {
            Ok(total) => total,
            Err(e) => {
                warn!(owner, error = %e, "Balance lookup failed, skipping pre-check");
                return Ok(());
            }
        };

        if total < required {
            return Err(parse_transaction_error(&format!(
                "Balance is not enough: have {}, need {}",
                total, required
            )));
        }
        debug!(owner, total, required, "Balance covers reward");
        Ok(())
    }
}

/// Builder failures are deterministic input problems; surface our own text
fn builder_failure(err: &TransactionBuilderError) -> ParsedError {
    error!(category = err.category(), error = %err, "Failed to build transaction");
    metrics()
        .classified_failures
        .with_label_values(&["builder", ErrorKind::ValidationError.as_str()])
        .inc();
    ParsedError::new(ErrorKind::ValidationError, err.to_string(), err.to_string())
}
