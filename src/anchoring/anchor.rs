//! Record anchoring and idempotent pricing.

use std::sync::Arc;

use alloy::primitives::{TxHash, B256, U256};
use tokio::time::Instant;

use crate::anchoring::poll::{poll_until, PollOutcome, PollPolicy};
use crate::anchoring::state::{
    AnchorError, AnchorOutcome, AnchorPlan, AnchorReport, AnchorStage, AnchorState,
};
use crate::anchoring::Ledger;
use crate::blockchain::types::{BlockchainError, LedgerRecord};
use crate::observability::metrics;

/// Drives one hash from `Unsubmitted` to `Priced`.
///
/// Holds no per-hash state between calls: the ledger is the only source of
/// truth, which is what makes re-invocation for the same hash converge.
#[derive(Clone)]
pub struct LedgerAnchor {
    ledger: Arc<dyn Ledger>,
    policy: PollPolicy,
    price: U256,
}

/// Records the states one run goes through.
struct Progress {
    hash: B256,
    path: Vec<AnchorState>,
}

impl Progress {
    fn new(hash: B256) -> Self {
        Self {
            hash,
            path: vec![AnchorState::Unsubmitted],
        }
    }

    fn enter(&mut self, next: AnchorState) {
        let from = self.path.last().copied().unwrap_or(AnchorState::Unsubmitted);
        tracing::debug!(hash = %self.hash, from = %from, to = %next, "Anchor state transition");
        metrics::record_anchor_transition(next.as_str());
        self.path.push(next);
    }

    fn fail(&mut self, error: AnchorError) -> AnchorError {
        self.enter(error.state());
        error
    }

    fn finish(self, outcome: AnchorOutcome, transactions: Vec<TxHash>) -> AnchorReport {
        AnchorReport {
            hash: self.hash,
            outcome,
            path: self.path,
            transactions,
        }
    }
}

impl LedgerAnchor {
    pub fn new(ledger: Arc<dyn Ledger>, policy: PollPolicy, price: u64) -> Self {
        Self {
            ledger,
            policy,
            price: U256::from(price),
        }
    }

    /// Read-before-write check for `hash`.
    pub async fn inspect(&self, hash: B256) -> Result<AnchorPlan, AnchorError> {
        let existing = self.ledger.get_record(hash).await.map_err(AnchorError::Read)?;
        if existing.is_none() {
            return Ok(AnchorPlan::Submit);
        }

        let price = self.ledger.get_price(hash).await.map_err(AnchorError::Read)?;
        if price.is_zero() {
            tracing::info!(hash = %hash, "Record present without price; resuming at price-setting");
            Ok(AnchorPlan::ResumePricing)
        } else {
            tracing::info!(hash = %hash, price = %price, "Measurement already recorded and priced");
            Ok(AnchorPlan::AlreadyRecorded)
        }
    }

    /// Run the whole protocol for `record`, starting with the ledger check.
    pub async fn anchor(&self, record: &LedgerRecord) -> Result<AnchorReport, AnchorError> {
        match self.inspect(record.hash).await {
            Ok(AnchorPlan::Submit) => self.submit(record).await,
            Ok(AnchorPlan::ResumePricing) => self.resume_pricing(record.hash).await,
            Ok(AnchorPlan::AlreadyRecorded) => Ok(Self::already_recorded(record.hash)),
            Err(e) => {
                let mut progress = Progress::new(record.hash);
                Err(progress.fail(e))
            }
        }
    }

    /// Report for a hash the ledger already holds in full.
    pub fn already_recorded(hash: B256) -> AnchorReport {
        let mut progress = Progress::new(hash);
        progress.enter(AnchorState::Priced);
        progress.finish(AnchorOutcome::AlreadyRecorded, Vec::new())
    }

    /// Submit `record`, wait for it, then price it.
    ///
    /// Callers should have established with [`inspect`](Self::inspect) that
    /// the hash is unknown. A concurrent writer winning the race is harmless:
    /// the ledger keeps the first record and confirmation still succeeds.
    pub async fn submit(&self, record: &LedgerRecord) -> Result<AnchorReport, AnchorError> {
        let mut progress = Progress::new(record.hash);
        progress.enter(AnchorState::Submitting);

        let record_tx = match self.ledger.submit_record(record).await {
            Ok(tx) => tx,
            Err(source) => {
                return Err(progress.fail(AnchorError::Submission {
                    stage: AnchorStage::Record,
                    source,
                }))
            }
        };
        tracing::info!(hash = %record.hash, tx = %record_tx, "Record transaction submitted");
        progress.enter(AnchorState::AwaitingConfirmation);

        self.await_record(record.hash).await.map_err(|e| progress.fail(e))?;
        progress.enter(AnchorState::Confirmed);

        let price_tx = self.set_price(&mut progress).await?;
        Ok(progress.finish(AnchorOutcome::Anchored, vec![record_tx, price_tx]))
    }

    /// Price a record that is already on the ledger.
    pub async fn resume_pricing(&self, hash: B256) -> Result<AnchorReport, AnchorError> {
        let mut progress = Progress::new(hash);
        let price_tx = self.set_price(&mut progress).await?;
        Ok(progress.finish(AnchorOutcome::Resumed, vec![price_tx]))
    }

    async fn set_price(&self, progress: &mut Progress) -> Result<TxHash, AnchorError> {
        let hash = progress.hash;
        progress.enter(AnchorState::SettingPrice);

        let tx = match self.ledger.set_price(hash, self.price).await {
            Ok(tx) => tx,
            Err(source) => {
                return Err(progress.fail(AnchorError::Submission {
                    stage: AnchorStage::Price,
                    source,
                }))
            }
        };
        tracing::info!(hash = %hash, tx = %tx, price = %self.price, "Price transaction submitted");

        self.await_price(hash).await.map_err(|e| progress.fail(e))?;
        progress.enter(AnchorState::Priced);
        Ok(tx)
    }

    async fn await_record(&self, hash: B256) -> Result<(), AnchorError> {
        let started = Instant::now();
        let ledger = &self.ledger;
        let outcome = poll_until(self.policy, || async move {
            ledger.get_record(hash).await.map(|record| record.map(|_| ()))
        })
        .await;
        self.settle(AnchorStage::Record, started, outcome)
    }

    async fn await_price(&self, hash: B256) -> Result<(), AnchorError> {
        let started = Instant::now();
        let ledger = &self.ledger;
        let outcome = poll_until(self.policy, || async move {
            ledger
                .get_price(hash)
                .await
                .map(|price| (!price.is_zero()).then_some(()))
        })
        .await;
        self.settle(AnchorStage::Price, started, outcome)
    }

    fn settle(
        &self,
        stage: AnchorStage,
        started: Instant,
        outcome: PollOutcome<(), BlockchainError>,
    ) -> Result<(), AnchorError> {
        let stage_name = match stage {
            AnchorStage::Record => "record",
            AnchorStage::Price => "price",
        };
        match outcome {
            PollOutcome::Confirmed(()) => {
                metrics::record_confirmation_wait(stage_name, "confirmed", started.elapsed());
                Ok(())
            }
            PollOutcome::TimedOut { waited, attempts } => {
                metrics::record_confirmation_wait(stage_name, "timed_out", waited);
                tracing::warn!(
                    stage = stage_name,
                    waited = ?waited,
                    attempts = attempts,
                    "Write not observable before deadline; outcome unknown"
                );
                Err(AnchorError::ConfirmationTimeout {
                    stage,
                    waited,
                    attempts,
                })
            }
            PollOutcome::Error(e) => {
                metrics::record_confirmation_wait(stage_name, "error", started.elapsed());
                tracing::warn!(
                    stage = stage_name,
                    error = %e,
                    "Confirmation read failed after submission; outcome unknown"
                );
                Err(AnchorError::ConfirmationRead { stage, source: e })
            }
        }
    }
}
