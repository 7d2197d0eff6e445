//! Wallet session and signing boundary
//!
//! The client never holds keys. A [`WalletSession`] says which account is
//! connected; a [`WalletSigner`] takes an unsigned call, gets the user's
//! approval, submits the signed transaction and hands back its digest.
//! Approval is a human decision, so nothing here applies a timeout or retry.

use crate::tx_builder::ProgrammableCall;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Connected account, passed explicitly into every orchestrated action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSession {
    address: Option<String>,
}

impl WalletSession {
    pub fn connected(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
        }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Session for an optional address; empty strings count as disconnected
    pub fn from_address(address: Option<String>) -> Self {
        Self {
            address: address.filter(|a| !a.trim().is_empty()),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }
}

/// Signing boundary errors
///
/// Display strings keep the words the wallet classifier keys on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// User declined the request
    #[error("User rejected the request: {0}")]
    Rejected(String),

    /// No wallet or bridge to talk to
    #[error("Wallet not installed: {0}")]
    NotInstalled(String),

    /// Bridge could not be reached
    #[error("Wallet bridge unreachable: {0}")]
    Unreachable(String),

    /// Wallet reported a failure while signing or submitting
    #[error("{0}")]
    Signing(String),
}

impl WalletError {
    /// Get the error category for metrics and observability
    pub fn category(&self) -> &'static str {
        match self {
            Self::Rejected(_) => "rejected",
            Self::NotInstalled(_) => "not_installed",
            Self::Unreachable(_) => "unreachable",
            Self::Signing(_) => "signing",
        }
    }
}

/// Signs and submits a built call on behalf of the connected account
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Suspends until the user approves or rejects; returns the transaction digest
    async fn sign_and_execute(&self, sender: &str, call: &ProgrammableCall) -> Result<String, WalletError>;
}

#[derive(Debug, Serialize)]
struct SignRequest<'a> {
    sender: &'a str,
    transaction: &'a ProgrammableCall,
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    #[serde(default)]
    digest: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    rejected: bool,
}

/// Signer backed by an external HTTP signing bridge
///
/// `POST {base}/sign-and-execute` with `{sender, transaction}`; the bridge
/// answers `{digest}` once the user approved and the transaction was
/// submitted, or `{error, rejected}` otherwise.
#[derive(Debug, Clone)]
pub struct HttpWalletBridge {
    http: Client,
    endpoint: String,
}

impl HttpWalletBridge {
    pub fn new(base_url: &str) -> Result<Self, WalletError> {
        // No request timeout: the bridge holds the request open while the user decides
        let http = Client::builder()
            .build()
            .map_err(|e| WalletError::Unreachable(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: format!("{}/sign-and-execute", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl WalletSigner for HttpWalletBridge {
    async fn sign_and_execute(&self, sender: &str, call: &ProgrammableCall) -> Result<String, WalletError> {
        debug!(sender, endpoint = %self.endpoint, commands = call.commands.len(), "Requesting signature");

        let response = self
            .http
            .post(&self.endpoint)
            .json(&SignRequest {
                sender,
                transaction: call,
            })
            .send()
            .await
            .map_err(|e| WalletError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(WalletError::NotInstalled(format!(
                "no signing endpoint at {}",
                self.endpoint
            )));
        }

        let body: SignResponse = response
            .json()
            .await
            .map_err(|e| WalletError::Signing(format!("wallet bridge sent an unreadable reply (HTTP {}): {}", status, e)))?;

        if body.rejected {
            return Err(WalletError::Rejected(
                body.error.unwrap_or_else(|| "declined in wallet".to_string()),
            ));
        }

        match (body.digest, body.error) {
            (Some(digest), None) if status.is_success() && !digest.is_empty() => {
                info!(sender, digest = %digest, "Transaction signed and submitted");
                Ok(digest)
            }
            (_, Some(error)) => Err(WalletError::Signing(error)),
            _ => Err(WalletError::Signing(format!(
                "wallet bridge returned no digest (HTTP {})",
                status
            ))),
        }
    }
}
