//! Configuration validation.
//!
//! Serde handles the syntactic side; this module checks value ranges and
//! cross-field constraints. Every problem is reported, not just the first.

use std::fmt;
use std::net::SocketAddr;

use alloy::primitives::Address;

use crate::config::schema::{GatewayConfig, StorageConfig};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Ledger calls one ingestion can make, each bounded by the RPC timeout:
/// access check, record read, administrator key read, record write, price
/// write, and the final probe of each confirmation wait.
pub const LEDGER_CALLS_PER_REQUEST: u64 = 7;

/// Longest a single ingestion can take before the pipeline itself reports
/// an outcome. A confirmation probe started just before the deadline may run
/// for a full RPC timeout, which the ledger call count covers.
pub fn request_budget_secs(config: &GatewayConfig) -> u64 {
    2 * config.anchoring.confirmation_timeout_secs
        + config.storage.timeout_secs()
        + LEDGER_CALLS_PER_REQUEST * config.ledger.rpc_timeout_secs
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.gateway_id.trim().is_empty() {
        errors.push(ValidationError::new("gateway_id", "must not be empty"));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.listener.max_body_size == 0 {
        errors.push(ValidationError::new("listener.max_body_size", "must be > 0"));
    }

    if url::Url::parse(&config.ledger.rpc_url).is_err() {
        errors.push(ValidationError::new(
            "ledger.rpc_url",
            format!("'{}' is not a URL", config.ledger.rpc_url),
        ));
    }

    for (field, value) in [
        ("ledger.data_contract", &config.ledger.data_contract),
        ("ledger.access_contract", &config.ledger.access_contract),
        ("ledger.balance_contract", &config.ledger.balance_contract),
    ] {
        if value.parse::<Address>().is_err() {
            errors.push(ValidationError::new(
                field,
                format!("'{}' is not a contract address", value),
            ));
        }
    }

    if config.ledger.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("ledger.rpc_timeout_secs", "must be > 0"));
    }

    if config.ledger.private_key_env.is_empty() {
        errors.push(ValidationError::new("ledger.private_key_env", "must name an environment variable"));
    }

    let anchoring = &config.anchoring;
    if anchoring.price == 0 {
        // A zero price is indistinguishable from "unset" on the ledger.
        errors.push(ValidationError::new("anchoring.price", "must be > 0"));
    }
    if anchoring.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new("anchoring.confirmation_timeout_secs", "must be > 0"));
    }
    if anchoring.poll_interval_ms == 0 {
        errors.push(ValidationError::new("anchoring.poll_interval_ms", "must be > 0"));
    }
    if anchoring.max_poll_interval_ms < anchoring.poll_interval_ms {
        errors.push(ValidationError::new(
            "anchoring.max_poll_interval_ms",
            "must be >= anchoring.poll_interval_ms",
        ));
    }

    let budget = request_budget_secs(config);
    if config.listener.request_timeout_secs <= budget {
        errors.push(ValidationError::new(
            "listener.request_timeout_secs",
            format!(
                "must exceed the worst-case ingestion time ({}s: two confirmation waits, \
                 the storage write and {} ledger calls)",
                budget, LEDGER_CALLS_PER_REQUEST
            ),
        ));
    }

    let (field, url) = match &config.storage {
        StorageConfig::Ipfs { api_url, .. } => ("storage.api_url", api_url),
        StorageConfig::Broker { url, .. } => ("storage.url", url),
    };
    if url::Url::parse(url).is_err() {
        errors.push(ValidationError::new(field, format!("'{}' is not a URL", url)));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
