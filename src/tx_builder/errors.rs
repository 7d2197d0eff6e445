//! Error types for the transaction builder
//!
//! Building is pure. The only ways it can fail are a broken file/blob pairing,
//! which would corrupt the bounty silently if it reached the chain, and a
//! contract configuration that cannot name a call target.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionBuilderError {
    /// File name and blob id lists differ in length
    ///
    /// Pairing is positional on-chain, so the call is refused rather than
    /// truncated or padded.
    #[error("File names and blob IDs must pair one-to-one (file names: {file_names}, blob ids: {blob_ids})")]
    MismatchedPairing { file_names: usize, blob_ids: usize },

    /// Call target cannot be formed from configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl TransactionBuilderError {
    /// Get the error category for metrics and observability
    pub fn category(&self) -> &'static str {
        match self {
            Self::MismatchedPairing { .. } => "pairing",
            Self::Configuration(_) => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TransactionBuilderError::MismatchedPairing {
            file_names: 2,
            blob_ids: 1,
        };
        assert_eq!(
            err.to_string(),
            "File names and blob IDs must pair one-to-one (file names: 2, blob ids: 1)"
        );

        let err = TransactionBuilderError::Configuration("package id is not set".to_string());
        assert_eq!(err.to_string(), "Configuration error: package id is not set");
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            TransactionBuilderError::MismatchedPairing { file_names: 0, blob_ids: 1 }.category(),
            "pairing"
        );
        assert_eq!(
            TransactionBuilderError::Configuration(String::new()).category(),
            "config"
        );
    }
}
