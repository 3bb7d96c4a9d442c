//! End-to-end ingestion of one measurement.

use std::sync::Arc;
use std::time::Instant;

use alloy::primitives::B256;
use thiserror::Error;

use crate::access::{AccessDecision, AccessGate};
use crate::anchoring::{AnchorError, AnchorOutcome, AnchorPlan, AnchorReport, LedgerAnchor};
use crate::blockchain::types::{BlockchainError, LedgerRecord};
use crate::blockchain::Wallet;
use crate::crypto::{self, asymmetric, symmetric, CryptoError, SymmetricKey};
use crate::observability::metrics;
use crate::pipeline::measurement::{Measurement, MeasurementError};
use crate::storage::{Confidentiality, Locator, StorageBackend, StorageError};

/// Why an ingestion ended without reaching `Priced`.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid measurement: {0}")]
    Validation(#[from] MeasurementError),

    #[error("access denied: {reason}")]
    AccessDenied { reason: String },

    #[error("access check failed: {0}")]
    AccessCheck(#[source] BlockchainError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Registry read (administrator key) failed.
    #[error("ledger read failed: {0}")]
    LedgerRead(#[source] BlockchainError),

    #[error(transparent)]
    Anchor(#[from] AnchorError),
}

impl IngestError {
    /// Stable machine-readable category.
    pub fn category(&self) -> &'static str {
        match self {
            IngestError::Validation(_) => "validation_error",
            IngestError::AccessDenied { .. } => "access_denied",
            IngestError::AccessCheck(_) => "access_check_error",
            IngestError::Crypto(_) => "crypto_error",
            IngestError::Storage(_) => "storage_error",
            IngestError::LedgerRead(_) | IngestError::Anchor(AnchorError::Read(_)) => {
                "ledger_read_error"
            }
            IngestError::Anchor(AnchorError::Submission { .. }) => "ledger_submission_error",
            IngestError::Anchor(AnchorError::ConfirmationTimeout { .. }) => {
                "ledger_confirmation_timeout"
            }
            IngestError::Anchor(AnchorError::ConfirmationRead { .. }) => "ledger_confirmation_error",
        }
    }
}

/// Result of a successful ingestion.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub hash: B256,
    pub outcome: AnchorOutcome,
    /// Where the payload was stored, if this run stored it.
    pub locator: Option<Locator>,
    pub anchor: AnchorReport,
}

/// Runs access check, envelope, storage and anchoring for one measurement.
#[derive(Clone)]
pub struct IngestionPipeline {
    gate: Arc<dyn AccessGate>,
    storage: Arc<dyn StorageBackend>,
    anchor: LedgerAnchor,
    wallet: Wallet,
    identity: String,
    gateway_id: String,
}

impl IngestionPipeline {
    pub fn new(
        gate: Arc<dyn AccessGate>,
        storage: Arc<dyn StorageBackend>,
        anchor: LedgerAnchor,
        wallet: Wallet,
        gateway_id: impl Into<String>,
    ) -> Self {
        let identity = wallet.public_key_hex();
        Self {
            gate,
            storage,
            anchor,
            wallet,
            identity,
            gateway_id: gateway_id.into(),
        }
    }

    /// Identity presented to the access registry.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Ingest one measurement and record the outcome metric.
    pub async fn ingest(&self, measurement: &Measurement) -> Result<IngestReport, IngestError> {
        let started = Instant::now();
        let result = self.run(measurement).await;

        let outcome = match &result {
            Ok(report) => report.outcome.as_str(),
            Err(e) => e.category(),
        };
        metrics::record_notification(outcome, started.elapsed());

        match &result {
            Ok(report) => tracing::info!(
                id = measurement.id(),
                hash = %report.hash,
                outcome = outcome,
                "Measurement ingested"
            ),
            Err(e) => tracing::warn!(
                id = measurement.id(),
                category = outcome,
                error = %e,
                "Measurement rejected"
            ),
        }
        result
    }

    async fn run(&self, measurement: &Measurement) -> Result<IngestReport, IngestError> {
        let description = measurement.description(&self.gateway_id)?;

        match self
            .gate
            .check_access(&self.identity)
            .await
            .map_err(IngestError::AccessCheck)?
        {
            AccessDecision::Allowed => {}
            AccessDecision::Denied { reason } => return Err(IngestError::AccessDenied { reason }),
        }

        let canonical = crypto::canonicalize(measurement.raw())?;
        let hash = crypto::content_hash(&canonical);
        let signature = crypto::sign(self.wallet.signer(), &canonical)?;
        let message = crypto::signed_message(&canonical, &signature);
        tracing::debug!(hash = %hash, bytes = message.len(), "Measurement signed");

        // Reads only; nothing has been stored yet.
        match self.anchor.inspect(hash).await? {
            AnchorPlan::AlreadyRecorded => {
                return Ok(Self::report(hash, None, LedgerAnchor::already_recorded(hash)));
            }
            AnchorPlan::ResumePricing => {
                let anchor = self.anchor.resume_pricing(hash).await?;
                return Ok(Self::report(hash, None, anchor));
            }
            AnchorPlan::Submit => {}
        }

        let admin_key = self
            .gate
            .administrator_public_key()
            .await
            .map_err(IngestError::LedgerRead)?;
        let admin_key = crypto::parse_public_key(&admin_key)?;

        let (blob, key) = match self.storage.confidentiality() {
            Confidentiality::ClientEncrypted => {
                let key = SymmetricKey::generate();
                (symmetric::encrypt(&key, &message)?, Some(key))
            }
            Confidentiality::BackendDelegated => (message, None),
        };

        let locator = self.store(blob).await?;

        let mut secret = Vec::new();
        if let Some(key) = &key {
            secret.extend_from_slice(key.as_bytes());
        }
        secret.extend_from_slice(locator.as_bytes());
        let encrypted_uri = hex::encode(asymmetric::encrypt(&admin_key, &secret)?);

        let record = LedgerRecord {
            hash,
            description,
            encrypted_uri,
        };
        let anchor = self.anchor.submit(&record).await?;
        Ok(Self::report(hash, Some(locator), anchor))
    }

    async fn store(&self, blob: Vec<u8>) -> Result<Locator, StorageError> {
        let started = Instant::now();
        let result = self.storage.store(blob).await;
        metrics::record_storage_write(self.storage.kind(), result.is_ok(), started.elapsed());
        if let Ok(locator) = &result {
            // The locator is part of the secret; log only its size.
            tracing::debug!(backend = self.storage.kind(), locator_len = locator.as_str().len(), "Payload stored");
        }
        result
    }

    fn report(hash: B256, locator: Option<Locator>, anchor: AnchorReport) -> IngestReport {
        IngestReport {
            hash,
            outcome: anchor.outcome,
            locator,
            anchor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_categories() {
        let timeout = IngestError::from(AnchorError::ConfirmationTimeout {
            stage: crate::anchoring::AnchorStage::Record,
            waited: Duration::from_secs(15),
            attempts: 8,
        });
        assert_eq!(timeout.category(), "ledger_confirmation_timeout");

        let denied = IngestError::AccessDenied {
            reason: "unknown key".into(),
        };
        assert_eq!(denied.category(), "access_denied");

        let read = IngestError::from(AnchorError::Read(BlockchainError::Timeout(10)));
        assert_eq!(read.category(), "ledger_read_error");

        let unreadable = IngestError::from(AnchorError::ConfirmationRead {
            stage: crate::anchoring::AnchorStage::Price,
            source: BlockchainError::Timeout(10),
        });
        assert_eq!(unreadable.category(), "ledger_confirmation_error");

        let storage = IngestError::from(StorageError::Unavailable("down".into()));
        assert_eq!(storage.category(), "storage_error");
    }
}
