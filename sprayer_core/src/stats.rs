//! Per-lane counters shared between the producer side and the worker.
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct LaneStats {
    submitted: AtomicU64,
    dropped: AtomicU64,
    processed: AtomicU64,
    anomalies: AtomicU64,
    hw_failures: AtomicU64,
}

/// Point-in-time copy of `LaneStats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaneSnapshot {
    /// Jobs handed to the lane queue.
    pub submitted: u64,
    /// Jobs evicted by a newer one while the queue was full.
    pub dropped: u64,
    /// Jobs popped and served by the worker.
    pub processed: u64,
    /// Jobs whose spray window had already passed when served.
    pub anomalies: u64,
    /// Relay calls that returned an error.
    pub hw_failures: u64,
}

impl LaneStats {
    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }
    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }
    pub(crate) fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }
    pub(crate) fn record_anomaly(&self) {
        self.anomalies.fetch_add(1, Ordering::Relaxed);
    }
    pub(crate) fn record_hw_failure(&self) {
        self.hw_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> LaneSnapshot {
        LaneSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            anomalies: self.anomalies.load(Ordering::Relaxed),
            hw_failures: self.hw_failures.load(Ordering::Relaxed),
        }
    }
}
