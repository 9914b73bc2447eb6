//! Bounded per-lane job queue with drop-oldest overflow.
//!
//! Backed by a bounded crossbeam channel. The producer side keeps its own
//! clone of the receiver so that, when the channel is full, it can evict the
//! oldest job itself instead of blocking. A stale job describes a weed that is
//! already behind the nozzle bar, so losing it is preferable to honoring it
//! late.
use std::sync::Arc;

use crossbeam_channel as xch;

use crate::job::ActuationJob;
use crate::stats::LaneStats;

/// Producer handle of a lane queue.
pub struct LaneQueue {
    lane: usize,
    tx: xch::Sender<ActuationJob>,
    evict: xch::Receiver<ActuationJob>,
    stats: Arc<LaneStats>,
}

/// Create a lane queue; the receiver goes to the lane worker.
pub fn lane_queue(
    lane: usize,
    capacity: usize,
    stats: Arc<LaneStats>,
) -> (LaneQueue, xch::Receiver<ActuationJob>) {
    let (tx, rx) = xch::bounded(capacity.max(1));
    let queue = LaneQueue {
        lane,
        tx,
        evict: rx.clone(),
        stats,
    };
    (queue, rx)
}

impl LaneQueue {
    /// Enqueue without blocking. Returns the job evicted to make room, if any.
    pub fn push(&self, job: ActuationJob) -> Option<ActuationJob> {
        self.stats.record_submitted();
        let mut job = job;
        let mut evicted = None;
        loop {
            match self.tx.try_send(job) {
                Ok(()) => break,
                Err(xch::TrySendError::Full(back)) => {
                    job = back;
                    // the worker may have popped in the meantime; then just retry
                    if let Ok(old) = self.evict.try_recv() {
                        self.stats.record_dropped();
                        tracing::debug!(lane = self.lane, "lane queue full; dropped oldest job");
                        evicted.get_or_insert(old);
                    }
                }
                Err(xch::TrySendError::Disconnected(back)) => {
                    // unreachable while `evict` is alive; count it as a drop anyway
                    self.stats.record_dropped();
                    return Some(back);
                }
            }
        }
        evicted
    }

    /// Jobs currently waiting.
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.tx.capacity().unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn job(ms: u64) -> ActuationJob {
        ActuationJob::new(0, Instant::now(), Duration::ZERO, Duration::from_millis(ms))
    }

    #[test]
    fn overflow_evicts_oldest_and_keeps_newest() {
        let stats = Arc::new(LaneStats::default());
        let (queue, rx) = lane_queue(0, 3, stats.clone());
        for ms in 1..=3 {
            assert!(queue.push(job(ms)).is_none());
        }
        let evicted = queue.push(job(4)).expect("oldest evicted");
        assert_eq!(evicted.duration, Duration::from_millis(1));
        assert_eq!(queue.len(), 3);

        let kept: Vec<u64> = rx.try_iter().map(|j| j.duration.as_millis() as u64).collect();
        assert_eq!(kept, vec![2, 3, 4]);

        let s = stats.snapshot();
        assert_eq!(s.submitted, 4);
        assert_eq!(s.dropped, 1);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let (queue, _rx) = lane_queue(0, 0, Arc::new(LaneStats::default()));
        assert_eq!(queue.capacity(), 1);
        assert!(queue.push(job(1)).is_none());
        assert!(queue.push(job(2)).is_some());
    }
}
