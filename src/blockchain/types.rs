//! Ledger-facing types and error definitions.

use alloy::primitives::B256;
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// The contract call reverted or could not be encoded.
    #[error("Contract call '{call}' failed: {reason}")]
    Contract { call: &'static str, reason: String },

    /// Connected to a node serving a different chain.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// Invalid private key format or derivation error.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Invalid contract address or endpoint in the configuration.
    #[error("Invalid ledger configuration: {0}")]
    Config(String),
}

/// Result type for ledger operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// A record as anchored on the data ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRecord {
    /// Content hash of the canonical measurement. Identity key.
    pub hash: B256,
    /// Human-readable provenance string.
    pub description: String,
    /// Hex-encoded secret, encrypted for the ledger administrator.
    pub encrypted_uri: String,
}

/// What a ledger read returns for an existing record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub encrypted_uri: String,
    pub description: String,
}

impl StoredRecord {
    /// The contract returns empty strings for keys that were never written.
    pub fn is_empty(&self) -> bool {
        self.encrypted_uri.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BlockchainError::Timeout(10);
        assert_eq!(err.to_string(), "RPC timeout after 10 seconds");

        let err = BlockchainError::Contract {
            call: "storeInfo",
            reason: "execution reverted".to_string(),
        };
        assert!(err.to_string().contains("storeInfo"));
    }

    #[test]
    fn test_empty_record() {
        let record = StoredRecord {
            encrypted_uri: String::new(),
            description: String::new(),
        };
        assert!(record.is_empty());
    }
}
