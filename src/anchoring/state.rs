//! Anchoring states, outcomes and errors.

use std::fmt;
use std::time::Duration;

use alloy::primitives::{TxHash, B256};
use thiserror::Error;

use crate::blockchain::types::BlockchainError;

/// Progress of one hash through the anchoring protocol.
///
/// ```text
/// Unsubmitted → Submitting → AwaitingConfirmation → Confirmed → SettingPrice → Priced
///                    │                │                              │
///                    └──── Failed ◀───┴──────── TimedOut ◀───────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorState {
    Unsubmitted,
    Submitting,
    AwaitingConfirmation,
    Confirmed,
    SettingPrice,
    Priced,
    TimedOut,
    Failed,
}

impl AnchorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnchorState::Unsubmitted => "unsubmitted",
            AnchorState::Submitting => "submitting",
            AnchorState::AwaitingConfirmation => "awaiting_confirmation",
            AnchorState::Confirmed => "confirmed",
            AnchorState::SettingPrice => "setting_price",
            AnchorState::Priced => "priced",
            AnchorState::TimedOut => "timed_out",
            AnchorState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AnchorState::Priced | AnchorState::TimedOut | AnchorState::Failed)
    }
}

impl fmt::Display for AnchorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which write a confirmation or submission error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorStage {
    Record,
    Price,
}

impl fmt::Display for AnchorStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnchorStage::Record => f.write_str("record"),
            AnchorStage::Price => f.write_str("price"),
        }
    }
}

/// Decision taken from the read-before-write check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorPlan {
    /// Nothing on the ledger yet.
    Submit,
    /// Record present, price unset: a previous run stopped half way.
    ResumePricing,
    /// Record and price present.
    AlreadyRecorded,
}

/// How a successful anchoring run got to `Priced`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorOutcome {
    /// Record and price written by this run.
    Anchored,
    /// Record found, price written by this run.
    Resumed,
    /// Nothing written; the ledger already held record and price.
    AlreadyRecorded,
}

impl AnchorOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnchorOutcome::Anchored => "anchored",
            AnchorOutcome::Resumed => "resumed",
            AnchorOutcome::AlreadyRecorded => "already_recorded",
        }
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone)]
pub struct AnchorReport {
    pub hash: B256,
    pub outcome: AnchorOutcome,
    /// States visited, in order. Always ends with `Priced`.
    pub path: Vec<AnchorState>,
    /// Transactions submitted by this run.
    pub transactions: Vec<TxHash>,
}

impl AnchorReport {
    pub fn final_state(&self) -> AnchorState {
        self.path.last().copied().unwrap_or(AnchorState::Unsubmitted)
    }
}

/// Anchoring failures. Each maps to a terminal [`AnchorState`].
#[derive(Debug, Error)]
pub enum AnchorError {
    /// Reading the ledger before anything was submitted failed.
    #[error("ledger read failed: {0}")]
    Read(#[source] BlockchainError),

    /// The ledger refused the transaction outright.
    #[error("{stage} transaction was not accepted: {source}")]
    Submission {
        stage: AnchorStage,
        #[source]
        source: BlockchainError,
    },

    /// The write was accepted but not observed before the deadline. It may
    /// still land; re-check before resubmitting.
    #[error("{stage} not observable on the ledger after {waited:?} ({attempts} polls); outcome unknown")]
    ConfirmationTimeout {
        stage: AnchorStage,
        waited: Duration,
        attempts: u32,
    },

    /// The write was accepted but reading it back failed. Like a timeout,
    /// the write may still land.
    #[error("{stage} submitted but reading it back failed: {source}; outcome unknown")]
    ConfirmationRead {
        stage: AnchorStage,
        #[source]
        source: BlockchainError,
    },
}

impl AnchorError {
    pub fn state(&self) -> AnchorState {
        match self {
            AnchorError::ConfirmationTimeout { .. } | AnchorError::ConfirmationRead { .. } => {
                AnchorState::TimedOut
            }
            AnchorError::Read(_) | AnchorError::Submission { .. } => AnchorState::Failed,
        }
    }
}
