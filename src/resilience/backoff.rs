//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

/// Delay before poll attempt `attempt + 1`.
///
/// Grows as `base * 2^(attempt - 1)`, capped at `max`, plus up to 10% jitter
/// so concurrent pollers against the same node spread out.
pub fn calculate_backoff(attempt: u32, base: Duration, max: Duration) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let base_ms = base.as_millis() as u64;
    let max_ms = max.as_millis() as u64;

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let capped_delay = base_ms.saturating_mul(exponential_base).min(max_ms);

    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: Duration = Duration::from_millis(100);
    const MAX: Duration = Duration::from_millis(1000);

    #[test]
    fn test_backoff_grows() {
        let first = calculate_backoff(1, BASE, MAX);
        assert!(first >= Duration::from_millis(100) && first < Duration::from_millis(110));

        let second = calculate_backoff(2, BASE, MAX);
        assert!(second >= Duration::from_millis(200) && second < Duration::from_millis(220));
    }

    #[test]
    fn test_backoff_is_capped() {
        let late = calculate_backoff(30, BASE, MAX);
        assert!(late >= MAX);
        assert!(late < MAX + MAX / 10);
    }

    #[test]
    fn test_zeroth_attempt() {
        assert_eq!(calculate_backoff(0, BASE, MAX), Duration::ZERO);
    }
}
