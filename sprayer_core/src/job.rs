//! Actuation jobs and the latency-compensated on-time calculation.
use std::time::{Duration, Instant};

use crate::detection::Point;

/// One spray request for one lane, derived from a single detection.
///
/// `detected_at` is the capture time of the frame, not the enqueue time, so
/// every delay between capture and service (processing, dispatch, queueing)
/// is taken off the spray duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuationJob {
    pub lane: usize,
    pub detected_at: Instant,
    /// Wait before a switched-off lane is switched on.
    pub delay: Duration,
    /// Requested spray length measured from `detected_at`.
    pub duration: Duration,
    /// Detection center, for logging only.
    pub location: Option<Point>,
}

/// Result of evaluating a job against the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnTime {
    /// How long the nozzle should still stay on.
    pub effective: Duration,
    /// How far past its spray window the job is; zero when in time.
    pub overdue: Duration,
}

impl OnTime {
    /// True when the raw on-time was negative and had to be clamped.
    pub fn is_clamped(&self) -> bool {
        !self.overdue.is_zero()
    }
}

impl ActuationJob {
    pub fn new(lane: usize, detected_at: Instant, delay: Duration, duration: Duration) -> Self {
        Self {
            lane,
            detected_at,
            delay,
            duration,
            location: None,
        }
    }

    pub fn at(mut self, location: Point) -> Self {
        self.location = Some(location);
        self
    }

    /// `max(0, duration - (now - detected_at))`, plus the clamped amount.
    pub fn on_time(&self, now: Instant) -> OnTime {
        let elapsed = now.saturating_duration_since(self.detected_at);
        OnTime {
            effective: self.duration.saturating_sub(elapsed),
            overdue: elapsed.saturating_sub(self.duration),
        }
    }
}
