//! Per-frame dispatch: detections past the activation line become jobs.
use std::time::{Duration, Instant};

use crate::config::DispatchCfg;
use crate::controller::JobSink;
use crate::detection::Detections;
use crate::error::BuildError;
use crate::job::ActuationJob;
use crate::job_log::JobLogger;
use crate::lanes::LaneMap;

/// What one `dispatch()` call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Centers past the activation line.
    pub eligible: usize,
    /// Jobs accepted by the sink.
    pub submitted: usize,
    /// Jobs the sink refused (unknown lane, stopped controller).
    pub rejected: usize,
}

pub struct Dispatcher {
    lanes: LaneMap,
    activation_y: i64,
    delay: Duration,
    duration: Duration,
    job_log: Option<Box<dyn JobLogger>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("lanes", &self.lanes.len())
            .field("activation_y", &self.activation_y)
            .field("delay", &self.delay)
            .field("duration", &self.duration)
            .field("job_log", &self.job_log.is_some())
            .finish()
    }
}

impl Dispatcher {
    pub fn new(cfg: &DispatchCfg) -> Result<Self, BuildError> {
        if !(0.0..1.0).contains(&cfg.activation_fraction) {
            return Err(BuildError::InvalidConfig(
                "activation fraction must be in [0.0, 1.0)",
            ));
        }
        if cfg.frame_height == 0 {
            return Err(BuildError::InvalidConfig("frame height must be > 0"));
        }
        let lanes = LaneMap::new(cfg.frame_width, cfg.lanes)?;
        let activation_y = (cfg.activation_fraction * f64::from(cfg.frame_height)).floor() as i64;
        Ok(Self {
            lanes,
            activation_y,
            delay: cfg.delay,
            duration: cfg.duration,
            job_log: None,
        })
    }

    /// Record every dispatched job with `logger`.
    pub fn with_job_log(mut self, logger: Box<dyn JobLogger>) -> Self {
        self.job_log = Some(logger);
        self
    }

    pub fn lane_map(&self) -> &LaneMap {
        &self.lanes
    }

    /// Row a detection must be strictly below to trigger a spray.
    pub fn activation_y(&self) -> i64 {
        self.activation_y
    }

    pub fn is_eligible(&self, y: i32) -> bool {
        i64::from(y) > self.activation_y
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Applies to jobs created by later `dispatch()` calls.
    pub fn set_delay(&mut self, delay: Duration) {
        tracing::info!(delay_ms = delay.as_millis() as u64, "actuation delay updated");
        self.delay = delay;
    }

    /// Applies to jobs created by later `dispatch()` calls.
    pub fn set_duration(&mut self, duration: Duration) {
        tracing::info!(duration_ms = duration.as_millis() as u64, "actuation duration updated");
        self.duration = duration;
    }

    /// Turn one frame's detections into jobs and hand them to `sink`.
    ///
    /// `detected_at` is the frame's capture time; every job carries it so the
    /// lane workers can subtract processing latency. Never blocks.
    pub fn dispatch(
        &mut self,
        detections: &Detections,
        detected_at: Instant,
        sink: &impl JobSink,
    ) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        for &center in &detections.centers {
            if !self.is_eligible(center.y) {
                continue;
            }
            summary.eligible += 1;
            for lane in self.lanes.lanes_for(i64::from(center.x)) {
                let job = ActuationJob::new(lane, detected_at, self.delay, self.duration).at(center);
                if let Some(log) = self.job_log.as_mut() {
                    if let Err(e) = log.record(&job) {
                        tracing::warn!(error = %e, "job log write failed");
                    }
                }
                match sink.submit(job) {
                    Ok(()) => summary.submitted += 1,
                    Err(e) => {
                        summary.rejected += 1;
                        tracing::warn!(lane, error = %e, "job rejected");
                    }
                }
            }
        }
        if summary.eligible > 0 {
            tracing::trace!(
                eligible = summary.eligible,
                submitted = summary.submitted,
                "frame dispatched"
            );
        }
        summary
    }
}
