//! Worker state machine.

use std::fmt;

/// What the delivery worker is doing right now.
///
/// State transitions:
/// - Waiting -> Delivering -> Waiting (delivered or dropped)
/// - Waiting -> Delivering -> Backoff -> Waiting (requeued)
/// - any -> Stopped (cancellation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// Blocked in the bounded dequeue.
    Waiting,

    /// HTTP call in flight.
    Delivering,

    /// Sleeping before a requeue.
    Backoff,

    /// Loop has exited.
    Stopped,
}

impl WorkerState {
    pub fn is_stopped(self) -> bool {
        matches!(self, WorkerState::Stopped)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkerState::Waiting => "waiting",
            WorkerState::Delivering => "delivering",
            WorkerState::Backoff => "backoff",
            WorkerState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}
