//! DataPact client library
//!
//! Builds DataPact contract calls, hands them to a wallet signer, waits for
//! finality with bounded backoff and turns the result (or any failure along
//! the way) into something a user can act on.

pub mod bounty;
pub mod chain;
pub mod classifier;
pub mod config;
pub mod metrics;
pub mod observability;
pub mod orchestrator;
pub mod response;
pub mod retry;
pub mod structured_logging;
pub mod tx_builder;
pub mod types;
pub mod validation;
pub mod wallet;

// Re-export commonly used types
pub use chain::{ChainClient, ChainError, FinalityOptions, SuiRpcClient};
pub use classifier::{
    is_retryable, parse_network_error, parse_transaction_error, parse_wallet_error, ErrorKind,
    ParsedError,
};
pub use config::Config;
pub use orchestrator::{ActionOutcome, TransactionOrchestrator};
pub use response::{parse_events, parse_transaction_response, TransactionBlockResponse};
pub use retry::{retry_with_backoff, RetryOptions};
pub use tx_builder::{build_create_bounty_transaction, build_submit_label_transaction, ProgrammableCall};
pub use types::{CreateBountyParams, DomainEvent, LabelFinalizedEvent, SubmitLabelParams, TransactionResult};
pub use wallet::{HttpWalletBridge, WalletSession, WalletSigner};
