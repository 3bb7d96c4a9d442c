//! Startup orchestration.
//!
//! Builds every runtime component from a validated [`GatewayConfig`]. Nothing
//! here listens for traffic; `main` binds the listener once this succeeds.

use std::sync::Arc;

use thiserror::Error;

use crate::anchoring::{LedgerAnchor, PollPolicy};
use crate::blockchain::{BlockchainError, LedgerClient, Wallet};
use crate::config::GatewayConfig;
use crate::pipeline::IngestionPipeline;
use crate::storage::{self, Confidentiality, StorageError};

/// Setup failures. Each is fatal.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to load signing key: {0}")]
    Wallet(#[source] BlockchainError),

    #[error("failed to set up ledger client: {0}")]
    Ledger(#[source] BlockchainError),

    #[error("failed to register gateway public key: {0}")]
    Registration(#[source] BlockchainError),

    #[error("failed to set up storage backend: {0}")]
    Storage(#[from] StorageError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Runtime components, ready to serve.
pub struct Gateway {
    pub pipeline: Arc<IngestionPipeline>,
}

/// Initialize subsystems in dependency order.
pub async fn initialize(config: &GatewayConfig) -> Result<Gateway, StartupError> {
    let wallet = Wallet::from_env(&config.ledger.private_key_env, config.ledger.chain_id)
        .map_err(StartupError::Wallet)?;

    let ledger = Arc::new(LedgerClient::new(&config.ledger, &wallet).map_err(StartupError::Ledger)?);

    if let Err(e) = ledger.verify_chain_id().await {
        // The node may come up later; requests fail until it does.
        tracing::warn!(error = %e, "Ledger client initialized but chain verification failed");
    }

    if config.ledger.register_public_key {
        ledger
            .register_public_key(&wallet.public_key_hex())
            .await
            .map_err(StartupError::Registration)?;
    }

    let storage = storage::from_config(&config.storage)?;
    if storage.confidentiality() == Confidentiality::BackendDelegated {
        tracing::warn!(
            backend = storage.kind(),
            "Storage backend receives signed measurements in plaintext; confidentiality is delegated to it"
        );
    }

    let anchor = LedgerAnchor::new(
        ledger.clone(),
        PollPolicy::from_config(&config.anchoring),
        config.anchoring.price,
    );

    let pipeline = IngestionPipeline::new(
        ledger,
        storage,
        anchor,
        wallet,
        config.gateway_id.clone(),
    );

    tracing::info!(
        gateway_id = %config.gateway_id,
        storage = %config.storage.kind(),
        price = config.anchoring.price,
        "Gateway initialized"
    );

    Ok(Gateway {
        pipeline: Arc::new(pipeline),
    })
}
