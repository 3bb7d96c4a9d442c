//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to an external collaborator (ledger RPC):
//!     → timeouts.rs (every call carries a deadline)
//!
//! Waiting for a ledger write to become observable:
//!     → backoff.rs (exponential delay with jitter between polls)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every RPC call has a deadline
//! - No automatic retries of writes; the caller owns the retry policy

pub mod backoff;
pub mod timeouts;
