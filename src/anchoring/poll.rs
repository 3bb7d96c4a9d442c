//! Poll-until-observable primitive.
//!
//! Ledger writes are accepted long before they can be read back. Both the
//! record and the price confirmation use [`poll_until`] to wait for the read
//! path to reflect the write, within a fixed deadline.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::config::AnchoringConfig;
use crate::resilience::backoff::calculate_backoff;

/// Deadline and cadence of a confirmation wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Give up once this much time has passed since the first probe.
    pub deadline: Duration,
    /// Delay after the first unsuccessful probe.
    pub interval: Duration,
    /// Backoff ceiling.
    pub max_interval: Duration,
}

impl PollPolicy {
    pub fn from_config(config: &AnchoringConfig) -> Self {
        Self {
            deadline: Duration::from_secs(config.confirmation_timeout_secs),
            interval: Duration::from_millis(config.poll_interval_ms),
            max_interval: Duration::from_millis(config.max_poll_interval_ms),
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from_config(&AnchoringConfig::default())
    }
}

/// Result of a confirmation wait.
#[derive(Debug)]
pub enum PollOutcome<T, E> {
    /// The probe observed the value.
    Confirmed(T),
    /// The deadline passed without observation. The write may still land.
    TimedOut { waited: Duration, attempts: u32 },
    /// The probe itself failed.
    Error(E),
}

/// Call `probe` until it yields `Some`, fails, or the deadline passes.
///
/// The wall clock is re-checked after every probe and sleeps never extend
/// past the deadline, so at most one probe runs after it expires.
pub async fn poll_until<T, E, F, Fut>(policy: PollPolicy, mut probe: F) -> PollOutcome<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let started = Instant::now();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match probe().await {
            Ok(Some(value)) => return PollOutcome::Confirmed(value),
            Ok(None) => {}
            Err(e) => return PollOutcome::Error(e),
        }

        let waited = started.elapsed();
        if waited >= policy.deadline {
            return PollOutcome::TimedOut { waited, attempts };
        }

        let delay = calculate_backoff(attempts, policy.interval, policy.max_interval)
            .min(policy.deadline - waited);
        tracing::trace!(attempt = attempts, delay = ?delay, "Not yet observable");
        sleep(delay).await;
    }
}
