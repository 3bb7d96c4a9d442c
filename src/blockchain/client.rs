//! Ledger RPC client.
//!
//! # Responsibilities
//! - Connect to the JSON-RPC endpoint with the gateway wallet attached
//! - Read and write the data ledger and balance contracts
//! - Answer access-registry queries
//! - Bound every RPC call with the configured timeout

use std::time::Duration;

use alloy::primitives::{Address, TxHash, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use async_trait::async_trait;

use crate::access::{AccessDecision, AccessGate};
use crate::anchoring::Ledger;
use crate::blockchain::contracts::{
    AccessRegistry::AccessRegistryInstance, BalanceLedger::BalanceLedgerInstance,
    DataLedger::DataLedgerInstance,
};
use crate::blockchain::types::{BlockchainError, BlockchainResult, LedgerRecord, StoredRecord};
use crate::blockchain::wallet::Wallet;
use crate::config::LedgerConfig;
use crate::observability::metrics;
use crate::resilience::timeouts::with_rpc_deadline;

/// Contract-level view of the ledger node.
#[derive(Clone)]
pub struct LedgerClient {
    provider: DynProvider,
    data: DataLedgerInstance<DynProvider>,
    balance: BalanceLedgerInstance<DynProvider>,
    access: AccessRegistryInstance<DynProvider>,
    chain_id: u64,
    gas_limit: u64,
    gas_price: Option<u128>,
    rpc_timeout: Duration,
}

fn parse_address(field: &str, value: &str) -> BlockchainResult<Address> {
    value
        .parse()
        .map_err(|e| BlockchainError::Config(format!("{} '{}': {}", field, value, e)))
}

fn contract_error(call: &'static str) -> impl Fn(alloy::contract::Error) -> BlockchainError {
    move |e| BlockchainError::Contract {
        call,
        reason: e.to_string(),
    }
}

impl LedgerClient {
    /// Build the client. Does not contact the node.
    pub fn new(config: &LedgerConfig, wallet: &Wallet) -> BlockchainResult<Self> {
        let rpc_url: url::Url = config.rpc_url.parse().map_err(|e| {
            BlockchainError::Config(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;

        let provider = ProviderBuilder::new()
            .wallet(wallet.ethereum_wallet())
            .connect_http(rpc_url)
            .erased();

        let data = DataLedgerInstance::new(
            parse_address("ledger.data_contract", &config.data_contract)?,
            provider.clone(),
        );
        let balance = BalanceLedgerInstance::new(
            parse_address("ledger.balance_contract", &config.balance_contract)?,
            provider.clone(),
        );
        let access = AccessRegistryInstance::new(
            parse_address("ledger.access_contract", &config.access_contract)?,
            provider.clone(),
        );

        tracing::info!(
            rpc_url = %config.rpc_url,
            chain_id = config.chain_id,
            sender = %wallet.address(),
            "Ledger client initialized"
        );

        Ok(Self {
            provider,
            data,
            balance,
            access,
            chain_id: config.chain_id,
            gas_limit: config.gas_limit,
            gas_price: config.gas_price_wei,
            rpc_timeout: Duration::from_secs(config.rpc_timeout_secs),
        })
    }

    /// Verify the node serves the configured chain.
    pub async fn verify_chain_id(&self) -> BlockchainResult<()> {
        let actual = with_rpc_deadline(self.rpc_timeout, async {
            self.provider
                .get_chain_id()
                .await
                .map_err(|e| BlockchainError::Rpc(e.to_string()))
        })
        .await?;

        if actual != self.chain_id {
            return Err(BlockchainError::ChainMismatch {
                expected: self.chain_id,
                actual,
            });
        }
        Ok(())
    }

    /// Register `public_key` with the access registry.
    pub async fn register_public_key(&self, public_key: &str) -> BlockchainResult<TxHash> {
        let mut call = self
            .access
            .addPubKey(public_key.to_string())
            .gas(self.gas_limit);
        if let Some(price) = self.gas_price {
            call = call.gas_price(price);
        }

        let tx = self
            .observe("addPubKey", async {
                call.send()
                    .await
                    .map(|pending| *pending.tx_hash())
                    .map_err(contract_error("addPubKey"))
            })
            .await?;
        tracing::info!(tx = %tx, "Public key registration submitted");
        Ok(tx)
    }

    /// Run `call` under the RPC deadline and record its latency.
    async fn observe<T, F>(&self, name: &'static str, call: F) -> BlockchainResult<T>
    where
        F: std::future::Future<Output = BlockchainResult<T>>,
    {
        let started = std::time::Instant::now();
        let result = with_rpc_deadline(self.rpc_timeout, call).await;
        metrics::record_ledger_call(name, result.is_ok(), started.elapsed());
        if let Err(e) = &result {
            tracing::warn!(call = name, error = %e, "Ledger call failed");
        }
        result
    }
}

#[async_trait]
impl Ledger for LedgerClient {
    async fn get_record(&self, hash: B256) -> BlockchainResult<Option<StoredRecord>> {
        let ret = self
            .observe("ledger", async {
                self.data.ledger(hash).call().await.map_err(contract_error("ledger"))
            })
            .await?;

        let record = StoredRecord {
            encrypted_uri: ret.uri,
            description: ret.description,
        };
        Ok((!record.is_empty()).then_some(record))
    }

    async fn get_price(&self, hash: B256) -> BlockchainResult<U256> {
        self.observe("getPriceMeasurement", async {
            self.balance
                .getPriceMeasurement(hash)
                .call()
                .await
                .map_err(contract_error("getPriceMeasurement"))
        })
        .await
    }

    async fn submit_record(&self, record: &LedgerRecord) -> BlockchainResult<TxHash> {
        let mut call = self
            .data
            .storeInfo(
                record.hash,
                record.encrypted_uri.clone(),
                record.description.clone(),
            )
            .gas(self.gas_limit);
        if let Some(price) = self.gas_price {
            call = call.gas_price(price);
        }

        self.observe("storeInfo", async {
            call.send()
                .await
                .map(|pending| *pending.tx_hash())
                .map_err(contract_error("storeInfo"))
        })
        .await
    }

    async fn set_price(&self, hash: B256, amount: U256) -> BlockchainResult<TxHash> {
        let mut call = self
            .balance
            .setPriceToMeasurement(hash, amount)
            .gas(self.gas_limit);
        if let Some(price) = self.gas_price {
            call = call.gas_price(price);
        }

        self.observe("setPriceToMeasurement", async {
            call.send()
                .await
                .map(|pending| *pending.tx_hash())
                .map_err(contract_error("setPriceToMeasurement"))
        })
        .await
    }
}

#[async_trait]
impl AccessGate for LedgerClient {
    async fn check_access(&self, identity: &str) -> BlockchainResult<AccessDecision> {
        let allowed = self
            .observe("isPubKeyAllowed", async {
                self.access
                    .isPubKeyAllowed(identity.to_string())
                    .call()
                    .await
                    .map_err(contract_error("isPubKeyAllowed"))
            })
            .await?;

        if allowed {
            Ok(AccessDecision::Allowed)
        } else {
            Ok(AccessDecision::Denied {
                reason: "public key is not registered with the access registry".to_string(),
            })
        }
    }

    async fn administrator_public_key(&self) -> BlockchainResult<String> {
        let key = self
            .observe("adminPublicKey", async {
                self.access
                    .adminPublicKey()
                    .call()
                    .await
                    .map_err(contract_error("adminPublicKey"))
            })
            .await?;

        if key.is_empty() {
            return Err(BlockchainError::Contract {
                call: "adminPublicKey",
                reason: "administrator public key is not set".to_string(),
            });
        }
        Ok(key)
    }
}

impl std::fmt::Debug for LedgerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerClient")
            .field("data", self.data.address())
            .field("balance", self.balance.address())
            .field("access", self.access.address())
            .field("chain_id", &self.chain_id)
            .field("gas_limit", &self.gas_limit)
            .finish()
    }
}
