//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the measurement gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Identifier of this gateway, embedded in every ledger description.
    pub gateway_id: String,

    /// Listener configuration (bind address, limits).
    pub listener: ListenerConfig,

    /// Ledger (contract) connectivity.
    pub ledger: LedgerConfig,

    /// Anchoring and pricing policy.
    pub anchoring: AnchoringConfig,

    /// Object storage backend selection.
    pub storage: StorageConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            gateway_id: "gateway-01".to_string(),
            listener: ListenerConfig::default(),
            ledger: LedgerConfig::default(),
            anchoring: AnchoringConfig::default(),
            storage: StorageConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Whole-request timeout in seconds. Must cover every ledger call, the
    /// storage write and both confirmation waits.
    pub request_timeout_secs: u64,

    /// Maximum accepted body size in bytes.
    pub max_body_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 120,
            max_body_size: 256 * 1024,
        }
    }
}

/// Ledger connectivity and transaction parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Chain ID used for transaction signing.
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Address of the data ledger contract (records).
    pub data_contract: String,

    /// Address of the access control contract (registry).
    pub access_contract: String,

    /// Address of the balance contract (price tags).
    pub balance_contract: String,

    /// Gas limit attached to every write.
    pub gas_limit: u64,

    /// Gas price in wei; `None` lets the provider estimate it.
    pub gas_price_wei: Option<u128>,

    /// Environment variable holding the hex-encoded signing key.
    pub private_key_env: String,

    /// Register the gateway public key in the access registry on startup.
    pub register_public_key: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            chain_id: 1337,
            rpc_timeout_secs: 10,
            // First three deployments from the default dev account on a local node
            data_contract: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
            access_contract: "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512".to_string(),
            balance_contract: "0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0".to_string(),
            gas_limit: 3_000_000,
            gas_price_wei: Some(0),
            private_key_env: "IOT_GATEWAY_PRIVATE_KEY".to_string(),
            register_public_key: false,
        }
    }
}

/// Confirmation polling and pricing policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnchoringConfig {
    /// Price attached to every anchored measurement.
    pub price: u64,

    /// Deadline for a write to become observable, in seconds.
    pub confirmation_timeout_secs: u64,

    /// First delay between two polls, in milliseconds.
    pub poll_interval_ms: u64,

    /// Upper bound on the backoff between polls, in milliseconds.
    pub max_poll_interval_ms: u64,
}

impl Default for AnchoringConfig {
    fn default() -> Self {
        Self {
            price: 1,
            confirmation_timeout_secs: 15,
            poll_interval_ms: 250,
            max_poll_interval_ms: 2000,
        }
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StorageConfig {
    /// Content-addressed store reached through the IPFS HTTP API.
    Ipfs {
        /// Base URL of the IPFS API (e.g., "http://127.0.0.1:5001").
        api_url: String,
        #[serde(default = "default_storage_timeout")]
        timeout_secs: u64,
    },
    /// HTTP broker returning a retrieval URL.
    Broker {
        /// Upload endpoint of the broker.
        url: String,
        #[serde(default = "default_storage_timeout")]
        timeout_secs: u64,
    },
}

fn default_storage_timeout() -> u64 {
    10
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Ipfs {
            api_url: "http://127.0.0.1:5001".to_string(),
            timeout_secs: default_storage_timeout(),
        }
    }
}

impl StorageConfig {
    /// Name of the selected variant, for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            StorageConfig::Ipfs { .. } => "ipfs",
            StorageConfig::Broker { .. } => "broker",
        }
    }

    /// Per-upload timeout of the selected variant.
    pub fn timeout_secs(&self) -> u64 {
        match self {
            StorageConfig::Ipfs { timeout_secs, .. } | StorageConfig::Broker { timeout_secs, .. } => {
                *timeout_secs
            }
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) used when RUST_LOG is unset.
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.anchoring.confirmation_timeout_secs, 15);
        assert_eq!(config.ledger.gas_limit, 3_000_000);
        assert_eq!(config.storage.kind(), "ipfs");
    }

    #[test]
    fn test_broker_section_parses() {
        let raw = r#"
            gateway_id = "gw-7"

            [storage]
            backend = "broker"
            url = "http://broker.local/upload"
        "#;
        let config: GatewayConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.gateway_id, "gw-7");
        match config.storage {
            StorageConfig::Broker { url, timeout_secs } => {
                assert_eq!(url, "http://broker.local/upload");
                assert_eq!(timeout_secs, 10);
            }
            other => panic!("unexpected storage config: {:?}", other),
        }
        // Untouched sections keep their defaults
        assert_eq!(config.anchoring.price, 1);
    }
}
