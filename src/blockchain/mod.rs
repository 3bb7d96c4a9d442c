//! Ledger integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variable (private key)
//!     → wallet.rs (signing identity, transaction signer)
//!     → contracts.rs (data ledger, balance, access registry bindings)
//!     → client.rs (RPC calls with timeouts, Ledger + AccessGate impls)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or decrypted secrets
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod contracts;
pub mod types;
pub mod wallet;

pub use client::LedgerClient;
pub use types::{BlockchainError, BlockchainResult, LedgerRecord, StoredRecord};
pub use wallet::Wallet;
