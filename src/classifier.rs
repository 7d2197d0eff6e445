//! Failure classification for wallet, transaction and network errors
//!
//! Failures reaching this layer rarely carry anything structured: a wallet
//! extension rejects with a sentence, the fullnode answers with a Move abort
//! string, the transport times out. Classification therefore works on the
//! message text alone:
//!
//! 1. The failure is rendered to a string (`Display`).
//! 2. An ordered list of keyword groups for the failure context is scanned
//!    with case-sensitive substring matching; the first group with any hit
//!    decides the [`ErrorKind`] and the user-facing sentence.
//! 3. When nothing matches, the context's generic group applies.
//!
//! Retry eligibility is a property of the kind alone ([`ErrorKind::can_retry`]).
//! [`is_retryable`] is the single predicate the backoff retrier consults, so
//! the classifier and the retrier cannot disagree about what is worth another
//! attempt.

use crate::metrics::metrics;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::error;

/// Classified failure kind shared by all three failure contexts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// User declined the signing or connection prompt
    WalletRejected,
    /// No signing extension present
    WalletNotInstalled,
    /// Generic wallet or network-mismatch problem
    WalletConnection,
    /// Funds too low for reward plus gas
    InsufficientBalance,
    /// Referenced on-chain object missing or invalid
    InvalidObject,
    /// On-chain execution or Move logic failure
    ContractError,
    /// Transport, timeout, rate limit or unavailable service
    NetworkError,
    /// Unclassified transaction failure
    TransactionFailed,
    /// Input rejected by the validation predicate
    ValidationError,
    /// Fallback when nothing else applies
    UnknownError,
}

impl ErrorKind {
    /// Whether an automatic retry is appropriate for this kind
    pub fn can_retry(self) -> bool {
        match self {
            // Transient or user-recoverable
            ErrorKind::WalletRejected => true,
            ErrorKind::WalletConnection => true,
            ErrorKind::ContractError => true,
            ErrorKind::NetworkError => true,
            ErrorKind::TransactionFailed => true,

            // Retrying cannot change the outcome
            ErrorKind::WalletNotInstalled => false,
            ErrorKind::InsufficientBalance => false,
            ErrorKind::InvalidObject => false,
            ErrorKind::ValidationError => false,
            ErrorKind::UnknownError => false,
        }
    }

    /// Stable identifier used in logs and metrics
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::WalletRejected => "WALLET_REJECTED",
            ErrorKind::WalletNotInstalled => "WALLET_NOT_INSTALLED",
            ErrorKind::WalletConnection => "WALLET_CONNECTION",
            ErrorKind::InsufficientBalance => "INSUFFICIENT_BALANCE",
            ErrorKind::InvalidObject => "INVALID_OBJECT",
            ErrorKind::ContractError => "CONTRACT_ERROR",
            ErrorKind::NetworkError => "NETWORK_ERROR",
            ErrorKind::TransactionFailed => "TRANSACTION_FAILED",
            ErrorKind::ValidationError => "VALIDATION_ERROR",
            ErrorKind::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a failure originated; selects the keyword table and fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureContext {
    Wallet,
    Transaction,
    Network,
}

impl FailureContext {
    pub fn label(self) -> &'static str {
        match self {
            FailureContext::Wallet => "wallet",
            FailureContext::Transaction => "transaction",
            FailureContext::Network => "network",
        }
    }

    fn groups(self) -> &'static [KeywordGroup] {
        match self {
            FailureContext::Wallet => WALLET_GROUPS,
            FailureContext::Transaction => TRANSACTION_GROUPS,
            FailureContext::Network => NETWORK_GROUPS,
        }
    }

    fn fallback(self) -> &'static KeywordGroup {
        match self {
            FailureContext::Wallet => &WALLET_FALLBACK,
            FailureContext::Transaction => &TRANSACTION_FALLBACK,
            FailureContext::Network => &NETWORK_FALLBACK,
        }
    }
}

/// One row of a classification table
struct KeywordGroup {
    keywords: &'static [&'static str],
    kind: ErrorKind,
    user_message: &'static str,
    /// Copy the raw message into `details`
    keep_details: bool,
}

impl KeywordGroup {
    fn matches(&self, message: &str) -> bool {
        self.keywords.iter().any(|keyword| message.contains(keyword))
    }
}

// Priority order matters: the first matching group wins.
const WALLET_GROUPS: &[KeywordGroup] = &[
    KeywordGroup {
        keywords: &["rejected", "denied", "cancelled"],
        kind: ErrorKind::WalletRejected,
        user_message: "Wallet connection was rejected. Please try again and approve the connection.",
        keep_details: false,
    },
    KeywordGroup {
        keywords: &["not installed", "not found", "no wallet"],
        kind: ErrorKind::WalletNotInstalled,
        user_message: "No Sui wallet detected. Please install a Sui wallet extension (e.g., Sui Wallet).",
        keep_details: false,
    },
    KeywordGroup {
        keywords: &["network", "chain"],
        kind: ErrorKind::WalletConnection,
        user_message: "Please ensure your wallet is connected to the configured Sui network.",
        keep_details: false,
    },
];

const WALLET_FALLBACK: KeywordGroup = KeywordGroup {
    keywords: &[],
    kind: ErrorKind::WalletConnection,
    user_message: "Failed to connect wallet. Please try again.",
    keep_details: true,
};

const TRANSACTION_GROUPS: &[KeywordGroup] = &[
    KeywordGroup {
        keywords: &["insufficient", "balance", "not enough"],
        kind: ErrorKind::InsufficientBalance,
        user_message: "Insufficient balance. Please ensure you have enough SUI for the reward amount and gas fees.",
        keep_details: false,
    },
    KeywordGroup {
        keywords: &["object", "not found", "does not exist"],
        kind: ErrorKind::InvalidObject,
        user_message: "Invalid or non-existent object ID. Please check the bounty object ID and try again.",
        keep_details: false,
    },
    KeywordGroup {
        keywords: &["execution", "contract", "move"],
        kind: ErrorKind::ContractError,
        user_message: "Smart contract execution failed. Please check your input and try again.",
        keep_details: true,
    },
    KeywordGroup {
        keywords: &["rejected", "denied", "cancelled"],
        kind: ErrorKind::WalletRejected,
        user_message: "Transaction was rejected. Please try again and approve the transaction.",
        keep_details: false,
    },
    KeywordGroup {
        keywords: &["network", "timeout", "fetch"],
        kind: ErrorKind::NetworkError,
        user_message: "Network error occurred. Please check your connection and try again.",
        keep_details: false,
    },
];

const TRANSACTION_FALLBACK: KeywordGroup = KeywordGroup {
    keywords: &[],
    kind: ErrorKind::TransactionFailed,
    user_message: "Transaction failed. Please try again.",
    keep_details: true,
};

const NETWORK_GROUPS: &[KeywordGroup] = &[
    KeywordGroup {
        keywords: &["unavailable", "503", "502"],
        kind: ErrorKind::NetworkError,
        user_message: "RPC endpoint is temporarily unavailable. Please try again in a moment.",
        keep_details: false,
    },
    KeywordGroup {
        keywords: &["timeout", "timed out"],
        kind: ErrorKind::NetworkError,
        user_message: "Request timed out. Please check your connection and try again.",
        keep_details: false,
    },
    KeywordGroup {
        keywords: &["rate limit", "429"],
        kind: ErrorKind::NetworkError,
        user_message: "Too many requests. Please wait a moment and try again.",
        keep_details: false,
    },
];

const NETWORK_FALLBACK: KeywordGroup = KeywordGroup {
    keywords: &[],
    kind: ErrorKind::NetworkError,
    user_message: "Network error occurred. Please check your connection and try again.",
    keep_details: true,
};

/// Structured, user-facing view of a failure
///
/// `Display` renders only [`ParsedError::user_message`]; the raw text stays in
/// `message` (and `details` for the generic groups).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{user_message}")]
#[serde(rename_all = "camelCase")]
pub struct ParsedError {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub message: String,
    pub user_message: String,
    pub can_retry: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ParsedError {
    /// Build a classified error outside the keyword tables
    pub fn new(kind: ErrorKind, message: impl Into<String>, user_message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            user_message: user_message.into(),
            can_retry: kind.can_retry(),
            details: None,
        }
    }

    /// Failure raised before any chain interaction because no account is connected
    pub fn wallet_required() -> Self {
        Self::new(
            ErrorKind::WalletConnection,
            "wallet session has no connected account",
            "Please connect your wallet first.",
        )
    }
}

fn match_group(context: FailureContext, message: &str) -> &'static KeywordGroup {
    context
        .groups()
        .iter()
        .find(|group| group.matches(message))
        .unwrap_or_else(|| context.fallback())
}

/// Classify a failure in the given context, logging the raw cause first
pub fn classify<E: fmt::Display + ?Sized>(context: FailureContext, failure: &E) -> ParsedError {
    let message = failure.to_string();

    error!(
        context = context.label(),
        error = %message,
        "Failure reported"
    );

    let group = match_group(context, &message);
    metrics()
        .classified_failures
        .with_label_values(&[context.label(), group.kind.as_str()])
        .inc();

    ParsedError {
        kind: group.kind,
        user_message: group.user_message.to_string(),
        can_retry: group.kind.can_retry(),
        details: group.keep_details.then(|| message.clone()),
        message,
    }
}

/// Classify a wallet connection or signing failure
pub fn parse_wallet_error<E: fmt::Display + ?Sized>(failure: &E) -> ParsedError {
    classify(FailureContext::Wallet, failure)
}

/// Classify a transaction building, submission or execution failure
pub fn parse_transaction_error<E: fmt::Display + ?Sized>(failure: &E) -> ParsedError {
    classify(FailureContext::Transaction, failure)
}

/// Classify a transport-level failure talking to the fullnode
pub fn parse_network_error<E: fmt::Display + ?Sized>(failure: &E) -> ParsedError {
    classify(FailureContext::Network, failure)
}

/// Shared retry predicate
///
/// Uses the transaction table because that is where the non-retryable
/// balance and missing-object families live. Does not log.
pub fn is_retryable<E: fmt::Display + ?Sized>(failure: &E) -> bool {
    let message = failure.to_string();
    match_group(FailureContext::Transaction, &message).kind.can_retry()
}
