//! Ledger anchoring subsystem.
//!
//! # Data Flow
//! ```text
//! LedgerRecord {hash, description, encrypted_uri}
//!     → anchor.rs   read-before-write check (record? price?)
//!     → anchor.rs   storeInfo, then poll.rs until the record is readable
//!     → anchor.rs   setPriceToMeasurement, then poll.rs until the price is readable
//! ```
//!
//! # Design Decisions
//! - Record and price are separate, separately confirmed writes; a crash
//!   between them is repaired by the next run for the same hash
//! - A deadline miss is reported as an unknown outcome, never as absence
//! - No retries here; the HTTP caller owns the retry policy

pub mod anchor;
pub mod poll;
pub mod state;

use alloy::primitives::{TxHash, B256, U256};
use async_trait::async_trait;

use crate::blockchain::types::{BlockchainResult, LedgerRecord, StoredRecord};

pub use anchor::LedgerAnchor;
pub use poll::{poll_until, PollOutcome, PollPolicy};
pub use state::{AnchorError, AnchorOutcome, AnchorPlan, AnchorReport, AnchorStage, AnchorState};

/// Request/response view of the append-only ledger.
///
/// Writes return as soon as the transaction is accepted for processing;
/// whether it took effect is only visible through the read methods.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Record stored at `hash`, or `None` if nothing was written there.
    async fn get_record(&self, hash: B256) -> BlockchainResult<Option<StoredRecord>>;

    /// Price tag at `hash`; zero means unset.
    async fn get_price(&self, hash: B256) -> BlockchainResult<U256>;

    async fn submit_record(&self, record: &LedgerRecord) -> BlockchainResult<TxHash>;

    async fn set_price(&self, hash: B256, amount: U256) -> BlockchainResult<TxHash>;
}
