//! Status - 配送ワーカーの集計
//!
//! The worker bumps these counters as it goes; readers take a snapshot.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Point-in-time copy of the worker counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryCounts {
    /// HTTP attempts made (including ones that failed at transport level).
    pub attempts: u64,
    pub delivered: u64,
    pub requeued: u64,
    pub dropped_terminal: u64,
    pub dropped_exhausted: u64,
    /// Requeues that failed; each one is a lost task.
    pub requeue_failures: u64,
    pub dequeue_errors: u64,
}

impl DeliveryCounts {
    /// Tasks that left the pipeline for good, delivered or not.
    pub fn finished(&self) -> u64 {
        self.delivered + self.dropped_terminal + self.dropped_exhausted + self.requeue_failures
    }
}

#[derive(Debug, Default)]
pub struct DeliveryStats {
    attempts: AtomicU64,
    delivered: AtomicU64,
    requeued: AtomicU64,
    dropped_terminal: AtomicU64,
    dropped_exhausted: AtomicU64,
    requeue_failures: AtomicU64,
    dequeue_errors: AtomicU64,
}

impl DeliveryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_requeued(&self) {
        self.requeued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped_terminal(&self) {
        self.dropped_terminal.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped_exhausted(&self) {
        self.dropped_exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_requeue_failure(&self) {
        self.requeue_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dequeue_error(&self) {
        self.dequeue_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DeliveryCounts {
        DeliveryCounts {
            attempts: self.attempts.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            requeued: self.requeued.load(Ordering::Relaxed),
            dropped_terminal: self.dropped_terminal.load(Ordering::Relaxed),
            dropped_exhausted: self.dropped_exhausted.load(Ordering::Relaxed),
            requeue_failures: self.requeue_failures.load(Ordering::Relaxed),
            dequeue_errors: self.dequeue_errors.load(Ordering::Relaxed),
        }
    }
}
