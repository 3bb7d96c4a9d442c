//! Shared doubles for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{TxHash, B256, U256};
use async_trait::async_trait;
use k256::SecretKey;
use serde_json::{json, Value};

use measurement_gateway::access::{AccessDecision, AccessGate};
use measurement_gateway::anchoring::{Ledger, LedgerAnchor, PollPolicy};
use measurement_gateway::blockchain::{BlockchainError, BlockchainResult, LedgerRecord, StoredRecord, Wallet};
use measurement_gateway::crypto::public_key_hex;
use measurement_gateway::pipeline::{IngestionPipeline, Measurement};
use measurement_gateway::storage::{Confidentiality, Locator, StorageBackend, StorageError, StorageResult};

// Anvil's first account
pub const GATEWAY_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const GATEWAY_ID: &str = "gw-test";

pub fn scenario_measurement() -> Measurement {
    Measurement::from_value(json!({
        "id": "sensor-1",
        "dateObserved": {"value": "2023-01-01T00:00:00Z"}
    }))
    .unwrap()
}

pub fn measurement(value: Value) -> Measurement {
    Measurement::from_value(value).unwrap()
}

pub fn gateway_wallet() -> Wallet {
    Wallet::from_private_key(GATEWAY_KEY, 1337).unwrap()
}

pub fn admin_secret() -> SecretKey {
    SecretKey::from_slice(&[7u8; 32]).unwrap()
}

pub fn admin_public_hex() -> String {
    public_key_hex(&admin_secret().public_key())
}

pub fn fast_policy() -> PollPolicy {
    PollPolicy {
        deadline: Duration::from_secs(15),
        interval: Duration::from_millis(100),
        max_interval: Duration::from_millis(1000),
    }
}

/// When a write becomes readable.
#[derive(Debug, Clone, Copy)]
pub enum Visibility {
    Immediate,
    /// Hidden from this many reads after the write.
    AfterReads(u32),
    Never,
}

#[derive(Default)]
struct LedgerState {
    records: HashMap<B256, StoredRecord>,
    prices: HashMap<B256, U256>,
    pending_records: HashMap<B256, (StoredRecord, u32)>,
    pending_prices: HashMap<B256, (U256, u32)>,
}

/// In-memory ledger with write-once records and controllable visibility.
pub struct MemoryLedger {
    state: Mutex<LedgerState>,
    record_visibility: Visibility,
    price_visibility: Visibility,
    reject_submissions: bool,
    fail_reads_after_submit: bool,
    pub record_submissions: AtomicU32,
    pub price_submissions: AtomicU32,
    pub reads: AtomicU32,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::with_visibility(Visibility::Immediate, Visibility::Immediate)
    }

    pub fn with_visibility(record: Visibility, price: Visibility) -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            record_visibility: record,
            price_visibility: price,
            reject_submissions: false,
            fail_reads_after_submit: false,
            record_submissions: AtomicU32::new(0),
            price_submissions: AtomicU32::new(0),
            reads: AtomicU32::new(0),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            reject_submissions: true,
            ..Self::new()
        }
    }

    /// Accepts writes, then every read fails as if the node stopped answering.
    pub fn unreadable_after_submit() -> Self {
        Self {
            fail_reads_after_submit: true,
            ..Self::new()
        }
    }

    fn check_readable(&self) -> BlockchainResult<()> {
        if self.fail_reads_after_submit && self.submissions() > 0 {
            return Err(BlockchainError::Timeout(10));
        }
        Ok(())
    }

    pub fn seed_record(&self, hash: B256, record: StoredRecord) {
        self.state.lock().unwrap().records.insert(hash, record);
    }

    pub fn seed_price(&self, hash: B256, price: u64) {
        self.state.lock().unwrap().prices.insert(hash, U256::from(price));
    }

    pub fn record(&self, hash: B256) -> Option<StoredRecord> {
        self.state.lock().unwrap().records.get(&hash).cloned()
    }

    pub fn price(&self, hash: B256) -> U256 {
        self.state.lock().unwrap().prices.get(&hash).copied().unwrap_or(U256::ZERO)
    }

    pub fn record_count(&self) -> usize {
        self.state.lock().unwrap().records.len()
    }

    pub fn submissions(&self) -> u32 {
        self.record_submissions.load(Ordering::SeqCst) + self.price_submissions.load(Ordering::SeqCst)
    }
}

fn tx(n: u32) -> TxHash {
    TxHash::with_last_byte(n as u8)
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn get_record(&self, hash: B256) -> BlockchainResult<Option<StoredRecord>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_readable()?;
        let mut state = self.state.lock().unwrap();
        if let Some((record, remaining)) = state.pending_records.remove(&hash) {
            if remaining == 0 {
                state.records.entry(hash).or_insert(record);
            } else {
                state.pending_records.insert(hash, (record, remaining - 1));
            }
        }
        Ok(state.records.get(&hash).cloned())
    }

    async fn get_price(&self, hash: B256) -> BlockchainResult<U256> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_readable()?;
        let mut state = self.state.lock().unwrap();
        if let Some((price, remaining)) = state.pending_prices.remove(&hash) {
            if remaining == 0 {
                state.prices.insert(hash, price);
            } else {
                state.pending_prices.insert(hash, (price, remaining - 1));
            }
        }
        Ok(state.prices.get(&hash).copied().unwrap_or(U256::ZERO))
    }

    async fn submit_record(&self, record: &LedgerRecord) -> BlockchainResult<TxHash> {
        let n = self.record_submissions.fetch_add(1, Ordering::SeqCst) + 1;
        if self.reject_submissions {
            return Err(BlockchainError::Rpc("transaction underpriced".into()));
        }

        let stored = StoredRecord {
            encrypted_uri: record.encrypted_uri.clone(),
            description: record.description.clone(),
        };
        let mut state = self.state.lock().unwrap();
        match self.record_visibility {
            Visibility::Immediate => {
                state.records.entry(record.hash).or_insert(stored);
            }
            Visibility::AfterReads(reads) => {
                state.pending_records.insert(record.hash, (stored, reads));
            }
            Visibility::Never => {}
        }
        Ok(tx(n))
    }

    async fn set_price(&self, hash: B256, amount: U256) -> BlockchainResult<TxHash> {
        let n = self.price_submissions.fetch_add(1, Ordering::SeqCst) + 1;
        if self.reject_submissions {
            return Err(BlockchainError::Rpc("transaction underpriced".into()));
        }

        let mut state = self.state.lock().unwrap();
        match self.price_visibility {
            Visibility::Immediate => {
                state.prices.insert(hash, amount);
            }
            Visibility::AfterReads(reads) => {
                state.pending_prices.insert(hash, (amount, reads));
            }
            Visibility::Never => {}
        }
        Ok(tx(100 + n))
    }
}

/// Storage double that records every blob.
pub struct CountingStorage {
    locator: String,
    confidentiality: Confidentiality,
    available: bool,
    pub blobs: Mutex<Vec<Vec<u8>>>,
}

impl CountingStorage {
    pub fn new(locator: &str) -> Self {
        Self {
            locator: locator.to_string(),
            confidentiality: Confidentiality::ClientEncrypted,
            available: true,
            blobs: Mutex::new(Vec::new()),
        }
    }

    pub fn delegated(locator: &str) -> Self {
        Self {
            confidentiality: Confidentiality::BackendDelegated,
            ..Self::new(locator)
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new("unused")
        }
    }

    pub fn calls(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }
}

#[async_trait]
impl StorageBackend for CountingStorage {
    fn kind(&self) -> &'static str {
        "memory"
    }

    fn confidentiality(&self) -> Confidentiality {
        self.confidentiality
    }

    async fn store(&self, blob: Vec<u8>) -> StorageResult<Locator> {
        self.blobs.lock().unwrap().push(blob);
        if !self.available {
            return Err(StorageError::Unavailable("connection refused".into()));
        }
        Ok(Locator::new(self.locator.clone()))
    }
}

/// Access gate with a fixed answer.
pub struct StaticGate {
    allowed: bool,
    admin_key: String,
    pub checks: AtomicU32,
    pub identities: Mutex<Vec<String>>,
}

impl StaticGate {
    pub fn allowing() -> Self {
        Self {
            allowed: true,
            admin_key: admin_public_hex(),
            checks: AtomicU32::new(0),
            identities: Mutex::new(Vec::new()),
        }
    }

    pub fn denying() -> Self {
        Self {
            allowed: false,
            ..Self::allowing()
        }
    }

    pub fn with_admin_key(admin_key: &str) -> Self {
        Self {
            admin_key: admin_key.to_string(),
            ..Self::allowing()
        }
    }
}

#[async_trait]
impl AccessGate for StaticGate {
    async fn check_access(&self, identity: &str) -> BlockchainResult<AccessDecision> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        self.identities.lock().unwrap().push(identity.to_string());
        if self.allowed {
            Ok(AccessDecision::Allowed)
        } else {
            Ok(AccessDecision::Denied {
                reason: "public key is not registered".into(),
            })
        }
    }

    async fn administrator_public_key(&self) -> BlockchainResult<String> {
        Ok(self.admin_key.clone())
    }
}

/// A pipeline wired to doubles, with handles on each of them.
pub struct Harness {
    pub ledger: Arc<MemoryLedger>,
    pub storage: Arc<CountingStorage>,
    pub gate: Arc<StaticGate>,
    pub pipeline: IngestionPipeline,
}

impl Harness {
    pub fn new(ledger: MemoryLedger, storage: CountingStorage, gate: StaticGate, price: u64) -> Self {
        let ledger = Arc::new(ledger);
        let storage = Arc::new(storage);
        let gate = Arc::new(gate);

        let anchor = LedgerAnchor::new(ledger.clone(), fast_policy(), price);
        let pipeline = IngestionPipeline::new(
            gate.clone(),
            storage.clone(),
            anchor,
            gateway_wallet(),
            GATEWAY_ID,
        );

        Self {
            ledger,
            storage,
            gate,
            pipeline,
        }
    }

    pub fn standard() -> Self {
        Self::new(MemoryLedger::new(), CountingStorage::new("cidABC"), StaticGate::allowing(), 5)
    }
}
