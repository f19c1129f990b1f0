//! Retry policy: retry budget and backoff delays.

use std::time::Duration;

/// Retry budget used when the configured value is not positive.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Retry policy for failed deliveries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retryable failures tolerated per task.
    pub max_retries: u32,

    /// Whether to sleep before a retried task is requeued.
    pub backoff: bool,

    /// Delay added per retry.
    pub step: Duration,

    /// Upper bound for a single delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Policy with the standard linear backoff (2s per retry, capped at 30s).
    ///
    /// A zero budget falls back to [`DEFAULT_MAX_RETRIES`].
    pub fn new(max_retries: u32, backoff: bool) -> Self {
        let max_retries = if max_retries == 0 {
            DEFAULT_MAX_RETRIES
        } else {
            max_retries
        };
        Self {
            max_retries,
            backoff,
            step: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
        }
    }

    /// Delay for a task that has failed `retry_count` times.
    ///
    /// delay = min(retry_count * step, max_delay)
    ///
    /// - retry 1: 2s
    /// - retry 2: 4s
    /// - retry 15 and later: 30s
    pub fn backoff_delay(&self, retry_count: u32) -> Duration {
        self.step
            .checked_mul(retry_count)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// Delay actually applied before requeue; zero when backoff is disabled.
    pub fn requeue_delay(&self, retry_count: u32) -> Duration {
        if self.backoff {
            self.backoff_delay(retry_count)
        } else {
            Duration::ZERO
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn zero_budget_falls_back_to_default() {
        assert_eq!(RetryPolicy::new(0, true).max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(RetryPolicy::new(7, true).max_retries, 7);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 2)]
    #[case(2, 4)]
    #[case(3, 6)]
    #[case(14, 28)]
    #[case(15, 30)]
    #[case(16, 30)]
    #[case(u32::MAX, 30)]
    fn linear_backoff_is_capped(#[case] retry_count: u32, #[case] secs: u64) {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(retry_count), Duration::from_secs(secs));
    }

    #[test]
    fn backoff_never_decreases() {
        let policy = RetryPolicy::default();
        let delays: Vec<_> = (0..40).map(|n| policy.backoff_delay(n)).collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn disabled_backoff_requeues_immediately() {
        let policy = RetryPolicy::new(3, false);
        assert_eq!(policy.requeue_delay(3), Duration::ZERO);
        // the schedule itself is unchanged
        assert_eq!(policy.backoff_delay(3), Duration::from_secs(6));
    }
}
