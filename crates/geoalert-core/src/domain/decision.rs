//! Decision model: what the worker does with a task after one attempt.
//!
//! `decide` is a pure function of the verdict, the task's retry count and the
//! policy. The worker loop performs the sleeping and requeueing.

use std::time::Duration;

use super::outcome::Classification;
use super::retry::RetryPolicy;

/// Why a task leaves the pipeline without being delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// The endpoint rejected the request in a way retrying cannot fix.
    Terminal,

    /// The retry budget is spent. `retry_count` is the count after this failure.
    RetriesExhausted { retry_count: u32, max_retries: u32 },
}

/// The next action for a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Nothing left to do for this task; go back to waiting.
    Continue,

    /// Put the task back at the tail of the queue after `delay`.
    RequeueAfter(Duration),

    /// Remove the task permanently.
    Drop(DropReason),
}

/// Decide the next action for a task.
///
/// # Arguments
/// * `classification` - verdict of the attempt that just finished
/// * `retry_count` - the task's retry count *before* this attempt is counted
/// * `policy` - retry budget and backoff schedule
pub fn decide(classification: Classification, retry_count: u32, policy: &RetryPolicy) -> Decision {
    match classification {
        Classification::Success => Decision::Continue,
        Classification::Terminal => Decision::Drop(DropReason::Terminal),
        Classification::Retryable => {
            let next = retry_count.saturating_add(1);
            if next > policy.max_retries {
                Decision::Drop(DropReason::RetriesExhausted {
                    retry_count: next,
                    max_retries: policy.max_retries,
                })
            } else {
                Decision::RequeueAfter(policy.requeue_delay(next))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn success_continues() {
        let policy = RetryPolicy::new(3, true);
        assert_eq!(decide(Classification::Success, 0, &policy), Decision::Continue);
        assert_eq!(decide(Classification::Success, 3, &policy), Decision::Continue);
    }

    #[rstest]
    #[case(0)]
    #[case(2)]
    fn terminal_drops_regardless_of_budget(#[case] retry_count: u32) {
        let policy = RetryPolicy::new(5, true);
        assert_eq!(
            decide(Classification::Terminal, retry_count, &policy),
            Decision::Drop(DropReason::Terminal)
        );
    }

    #[rstest]
    #[case(0, 2)]
    #[case(1, 4)]
    #[case(2, 6)]
    fn retryable_within_budget_requeues_with_backoff(#[case] retry_count: u32, #[case] secs: u64) {
        let policy = RetryPolicy::new(3, true);
        assert_eq!(
            decide(Classification::Retryable, retry_count, &policy),
            Decision::RequeueAfter(Duration::from_secs(secs))
        );
    }

    #[test]
    fn retryable_without_backoff_requeues_immediately() {
        let policy = RetryPolicy::new(5, false);
        assert_eq!(
            decide(Classification::Retryable, 2, &policy),
            Decision::RequeueAfter(Duration::ZERO)
        );
    }

    #[test]
    fn exceeding_budget_drops() {
        let policy = RetryPolicy::new(2, false);

        // retry_count 0 -> 1 and 1 -> 2 are still within budget
        assert!(matches!(
            decide(Classification::Retryable, 1, &policy),
            Decision::RequeueAfter(_)
        ));
        assert_eq!(
            decide(Classification::Retryable, 2, &policy),
            Decision::Drop(DropReason::RetriesExhausted {
                retry_count: 3,
                max_retries: 2,
            })
        );
    }
}
