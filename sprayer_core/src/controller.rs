//! Lifecycle controller: owns every lane, starts and stops the workers.
//!
//! Stopping is cooperative for the workers (an in-flight pulse completes and
//! queued jobs drain) but the controller always finishes with a direct
//! `off()` on every relay, whatever the workers' logical state was.

use std::sync::Arc;
use std::time::Duration;

use sprayer_traits::{Buzzer, MonotonicClock};

use crate::config::ControllerCfg;
use crate::error::{BuildError, SprayerError};
use crate::hw_error::map_hw_error;
use crate::job::ActuationJob;
use crate::scheduler::{BoxedRelay, LaneHandle, Override, SharedClock, share_relay};
use crate::stats::LaneSnapshot;
use crate::status::TransitionSink;

pub type BoxedBuzzer = Box<dyn Buzzer + Send>;

/// Anything jobs can be handed to without blocking.
pub trait JobSink {
    fn submit(&self, job: ActuationJob) -> Result<(), SprayerError>;
}

/// Builder for `SprayController`. Nothing runs until `start()`.
#[derive(Default)]
pub struct ControllerBuilder {
    relays: Vec<BoxedRelay>,
    buzzer: Option<BoxedBuzzer>,
    cfg: ControllerCfg,
    clock: Option<SharedClock>,
    sink: Option<Arc<dyn TransitionSink>>,
}

impl ControllerBuilder {
    /// Relays in lane order: `relays[i]` drives lane `i`.
    pub fn with_relays(mut self, relays: Vec<BoxedRelay>) -> Self {
        self.relays = relays;
        self
    }

    pub fn with_buzzer(mut self, buzzer: BoxedBuzzer) -> Self {
        self.buzzer = Some(buzzer);
        self
    }

    pub fn with_config(mut self, cfg: ControllerCfg) -> Self {
        self.cfg = cfg;
        self
    }

    /// Clock used by every lane worker. Defaults to `MonotonicClock`.
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Receives every ON/OFF transition of every lane.
    pub fn with_sink(mut self, sink: Arc<dyn TransitionSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Validate, spawn one worker per relay and sound the start-up beep.
    ///
    /// Configuration problems are reported before any worker thread exists.
    pub fn start(self) -> Result<SprayController, BuildError> {
        let Self {
            relays,
            buzzer,
            cfg,
            clock,
            sink,
        } = self;

        if relays.is_empty() {
            return Err(BuildError::MissingRelays);
        }
        if let Some(lanes) = cfg.lanes.filter(|&n| n != relays.len()) {
            return Err(BuildError::LaneMismatch {
                lanes,
                relays: relays.len(),
            });
        }
        if cfg.queue_capacity == 0 {
            return Err(BuildError::InvalidConfig("queue capacity must be >= 1"));
        }

        let clock = clock.unwrap_or_else(|| Arc::new(MonotonicClock::new()));
        let mut lanes = Vec::with_capacity(relays.len());
        for (lane, relay) in relays.into_iter().enumerate() {
            // on failure the lanes spawned so far are stopped by their Drop
            lanes.push(LaneHandle::spawn(
                lane,
                share_relay(relay),
                cfg.queue_capacity,
                clock.clone(),
                sink.clone(),
            )?);
        }
        tracing::info!(
            lanes = lanes.len(),
            queue_capacity = cfg.queue_capacity,
            "spray controller started"
        );

        let mut ctl = SprayController {
            lanes,
            buzzer,
            cfg,
            stopped: false,
        };
        ctl.beep(ctl.cfg.startup_beep, 1);
        Ok(ctl)
    }
}

/// Running set of lane workers bound to their relays.
pub struct SprayController {
    lanes: Vec<LaneHandle>,
    buzzer: Option<BoxedBuzzer>,
    cfg: ControllerCfg,
    stopped: bool,
}

impl std::fmt::Debug for SprayController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SprayController")
            .field("lanes", &self.lanes.len())
            .field("buzzer", &self.buzzer.is_some())
            .field("stopped", &self.stopped)
            .finish()
    }
}

impl SprayController {
    pub fn builder() -> ControllerBuilder {
        ControllerBuilder::default()
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Queue a job on its lane. Never blocks; a full queue drops its oldest job.
    pub fn submit(&self, job: ActuationJob) -> Result<(), SprayerError> {
        if self.stopped {
            return Err(SprayerError::State("controller is stopped".into()));
        }
        let lanes = self.lanes.len();
        let handle = self
            .lanes
            .get(job.lane)
            .ok_or(SprayerError::UnknownLane {
                lane: job.lane,
                lanes,
            })?;
        handle.submit(job);
        Ok(())
    }

    /// Latch every lane on until `all_off()`.
    pub fn all_on(&self) -> Result<(), SprayerError> {
        self.broadcast(Override::On)
    }

    /// Release every lane and switch it off.
    pub fn all_off(&self) -> Result<(), SprayerError> {
        self.broadcast(Override::Off)
    }

    fn broadcast(&self, cmd: Override) -> Result<(), SprayerError> {
        if self.stopped {
            return Err(SprayerError::State("controller is stopped".into()));
        }
        let mut first_err = None;
        for lane in &self.lanes {
            if let Err(e) = lane.send_override(cmd) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    pub fn stats(&self, lane: usize) -> Option<LaneSnapshot> {
        self.lanes.get(lane).map(LaneHandle::stats)
    }

    pub fn all_stats(&self) -> Vec<LaneSnapshot> {
        self.lanes.iter().map(LaneHandle::stats).collect()
    }

    /// Stop every worker, then force every relay off.
    ///
    /// Every relay gets its `off()` call even if some fail; the first failure
    /// is returned. Calling `stop()` again is a no-op.
    pub fn stop(&mut self) -> Result<(), SprayerError> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;

        for lane in &mut self.lanes {
            lane.signal_stop();
        }
        for lane in &mut self.lanes {
            lane.join();
        }

        let mut first_err = None;
        for lane in &self.lanes {
            if let Err(e) = lane.force_off() {
                tracing::error!(lane = lane.lane(), error = %e, "forced off failed");
                first_err.get_or_insert(e);
            }
        }
        tracing::info!(lanes = self.lanes.len(), "spray controller stopped; all channels off");
        self.beep(self.cfg.shutdown_beep, 2);
        first_err.map_or(Ok(()), Err)
    }

    fn beep(&mut self, len: Duration, repeats: u8) {
        if len.is_zero() {
            return;
        }
        let Some(buzzer) = self.buzzer.as_mut() else {
            return;
        };
        if let Err(e) = buzzer.beep(len, len, repeats) {
            tracing::warn!(error = %map_hw_error(e.as_ref()), "buzzer failed");
        }
    }
}

impl JobSink for SprayController {
    fn submit(&self, job: ActuationJob) -> Result<(), SprayerError> {
        SprayController::submit(self, job)
    }
}

impl Drop for SprayController {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!(error = %e, "stop during drop failed");
        }
    }
}
