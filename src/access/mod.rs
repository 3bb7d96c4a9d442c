//! Access gating against the ledger-resident registry.
//!
//! The registry knows which producer public keys may submit measurements and
//! which key belongs to the ledger administrator. The pipeline consults it
//! once per measurement before any cryptographic or storage work.

use async_trait::async_trait;

use crate::blockchain::types::BlockchainResult;

/// Answer of the registry for one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Denied { reason: String },
}

/// Read side of the access-control registry.
#[async_trait]
pub trait AccessGate: Send + Sync {
    /// Whether `identity` (hex-encoded public key) may submit measurements.
    async fn check_access(&self, identity: &str) -> BlockchainResult<AccessDecision>;

    /// Hex-encoded public key of the ledger administrator.
    async fn administrator_public_key(&self) -> BlockchainResult<String>;
}
