//! Per-lane channel scheduler: one queue, one worker thread, one relay.
//!
//! The worker blocks until a job, an override command or the stop signal
//! arrives. For each job it computes the remaining on-time from the
//! detection timestamp, waits the actuation delay only when the channel is
//! off, switches on and sleeps the remaining on-time. While more jobs are
//! queued the channel stays on; the channel is switched off once the queue
//! runs dry.
//!
//! Relay failures are logged and counted but never end the worker. The
//! logical state is only updated after a successful call, so a failed
//! transition is attempted again by the next job.
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use crossbeam_channel::{self as xch, select};
use sprayer_traits::{Clock, Relay};

use crate::error::{BuildError, SprayerError};
use crate::hw_error::map_hw_error;
use crate::job::ActuationJob;
use crate::queue::{LaneQueue, lane_queue};
use crate::stats::{LaneSnapshot, LaneStats};
use crate::status::{ChannelState, TransitionSink};

pub type BoxedRelay = Box<dyn Relay + Send>;
/// Relay shared between its lane worker and the controller's forced all-off.
pub type SharedRelay = Arc<Mutex<BoxedRelay>>;
pub type SharedClock = Arc<dyn Clock + Send + Sync>;

/// Manual override delivered through the lane worker, so it never races the
/// worker's own transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Override {
    /// Switch on and hold on; queued jobs are consumed without switching off.
    On,
    /// Release the hold and switch off.
    Off,
}

/// A worker that panicked while holding the lock must not prevent the
/// shutdown all-off, so poisoning is ignored.
pub(crate) fn lock_relay(relay: &SharedRelay) -> MutexGuard<'_, BoxedRelay> {
    relay.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn share_relay(relay: BoxedRelay) -> SharedRelay {
    Arc::new(Mutex::new(relay))
}

/// Worker side of one lane. Consumed by `run()`.
pub struct ChannelScheduler {
    lane: usize,
    relay: SharedRelay,
    jobs: xch::Receiver<ActuationJob>,
    control: xch::Receiver<Override>,
    stop: xch::Receiver<()>,
    clock: SharedClock,
    sink: Option<Arc<dyn TransitionSink>>,
    stats: Arc<LaneStats>,
    state: ChannelState,
    latched: bool,
}

impl ChannelScheduler {
    /// Worker loop; returns once the stop signal is seen and the queue is drained.
    pub fn run(mut self) {
        tracing::debug!(lane = self.lane, "lane worker started");
        let (control, jobs, stop) = (self.control.clone(), self.jobs.clone(), self.stop.clone());
        loop {
            // overrides are served ahead of queued jobs
            if let Ok(cmd) = control.try_recv() {
                self.apply_override(cmd);
                continue;
            }
            select! {
                recv(control) -> cmd => match cmd {
                    Ok(cmd) => self.apply_override(cmd),
                    Err(_) => break,
                },
                recv(jobs) -> job => match job {
                    Ok(job) => self.serve(job),
                    Err(_) => break,
                },
                recv(stop) -> _ => break,
            }
        }
        if let Ok(job) = self.jobs.try_recv() {
            self.serve(job);
        }
        // a latched lane, or one whose last off() failed, is still on
        if self.state.is_on() {
            self.switch(ChannelState::Off);
        }
        tracing::debug!(lane = self.lane, "lane worker exited");
    }

    /// Serve `first` and every job queued behind it as one continuous burst.
    fn serve(&mut self, first: ActuationJob) {
        let mut next = Some(first);
        while let Some(job) = next {
            self.actuate(&job);
            next = self.jobs.try_recv().ok();
        }
        if self.latched {
            return;
        }
        // an override sent during the burst decides how it ends
        if let Ok(cmd) = self.control.try_recv() {
            self.apply_override(cmd);
            return;
        }
        self.switch(ChannelState::Off);
    }

    fn actuate(&mut self, job: &ActuationJob) {
        let on_time = job.on_time(self.clock.now());
        if on_time.is_clamped() {
            self.stats.record_anomaly();
            tracing::warn!(
                lane = self.lane,
                overdue_ms = on_time.overdue.as_millis() as u64,
                "job served after its spray window; on-time clamped to zero"
            );
        }
        if self.latched {
            self.stats.record_processed();
            return;
        }
        if !self.state.is_on() {
            self.clock.sleep(job.delay);
            self.switch(ChannelState::On);
        }
        self.clock.sleep(on_time.effective);
        self.stats.record_processed();
        tracing::trace!(
            lane = self.lane,
            on_ms = on_time.effective.as_millis() as u64,
            "pulse served"
        );
    }

    fn apply_override(&mut self, cmd: Override) {
        tracing::info!(lane = self.lane, ?cmd, "manual override");
        match cmd {
            Override::On => {
                self.latched = true;
                self.switch(ChannelState::On);
            }
            Override::Off => {
                self.latched = false;
                self.switch(ChannelState::Off);
            }
        }
    }

    fn switch(&mut self, target: ChannelState) {
        let res = {
            let mut relay = lock_relay(&self.relay);
            match target {
                ChannelState::On => relay.on(),
                ChannelState::Off => relay.off(),
            }
        };
        match res {
            Ok(()) => {
                if self.state != target {
                    self.state = target;
                    if let Some(sink) = &self.sink {
                        sink.update(self.lane, target);
                    }
                    tracing::debug!(lane = self.lane, state = %target, "channel switched");
                }
            }
            Err(e) => {
                self.stats.record_hw_failure();
                let err = map_hw_error(e.as_ref());
                tracing::error!(
                    lane = self.lane,
                    target = %target,
                    state = %self.state,
                    error = %err,
                    "relay transition failed"
                );
            }
        }
    }
}

/// Producer/controller side of one lane.
pub struct LaneHandle {
    lane: usize,
    queue: LaneQueue,
    control: xch::Sender<Override>,
    stop: Option<xch::Sender<()>>,
    worker: Option<JoinHandle<()>>,
    relay: SharedRelay,
    stats: Arc<LaneStats>,
}

/// Build both halves of a lane without starting its thread.
pub fn channel(
    lane: usize,
    relay: SharedRelay,
    capacity: usize,
    clock: SharedClock,
    sink: Option<Arc<dyn TransitionSink>>,
) -> (LaneHandle, ChannelScheduler) {
    let stats = Arc::new(LaneStats::default());
    let (queue, jobs) = lane_queue(lane, capacity, stats.clone());
    let (control_tx, control_rx) = xch::unbounded();
    let (stop_tx, stop_rx) = xch::bounded(0);
    let handle = LaneHandle {
        lane,
        queue,
        control: control_tx,
        stop: Some(stop_tx),
        worker: None,
        relay: relay.clone(),
        stats: stats.clone(),
    };
    let worker = ChannelScheduler {
        lane,
        relay,
        jobs,
        control: control_rx,
        stop: stop_rx,
        clock,
        sink,
        stats,
        state: ChannelState::Off,
        latched: false,
    };
    (handle, worker)
}

impl LaneHandle {
    /// Build a lane and start its worker thread.
    pub fn spawn(
        lane: usize,
        relay: SharedRelay,
        capacity: usize,
        clock: SharedClock,
        sink: Option<Arc<dyn TransitionSink>>,
    ) -> Result<Self, BuildError> {
        let (mut handle, worker) = channel(lane, relay, capacity, clock, sink);
        handle.start(worker)?;
        Ok(handle)
    }

    /// Run `worker` on a dedicated, named thread.
    pub fn start(&mut self, worker: ChannelScheduler) -> Result<(), BuildError> {
        if self.worker.is_some() {
            return Err(BuildError::InvalidConfig("lane worker already started"));
        }
        let join = std::thread::Builder::new()
            .name(format!("lane-{}", self.lane))
            .spawn(move || worker.run())
            .map_err(|e| BuildError::Spawn {
                lane: self.lane,
                reason: e.to_string(),
            })?;
        self.worker = Some(join);
        Ok(())
    }

    pub fn lane(&self) -> usize {
        self.lane
    }

    /// Queue a job; never blocks. Returns the job evicted on overflow.
    pub fn submit(&self, job: ActuationJob) -> Option<ActuationJob> {
        self.queue.push(job)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn send_override(&self, cmd: Override) -> Result<(), SprayerError> {
        self.control
            .send(cmd)
            .map_err(|_| SprayerError::State(format!("lane {} worker is gone", self.lane)))
    }

    /// Ask the worker to exit once its queue is drained. Does not wait.
    pub fn signal_stop(&mut self) {
        self.stop.take();
    }

    /// Wait for the worker to exit. Returns false if it panicked.
    pub fn join(&mut self) -> bool {
        match self.worker.take() {
            Some(handle) => match handle.join() {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(lane = self.lane, ?e, "lane worker panicked");
                    false
                }
            },
            None => true,
        }
    }

    /// Signal stop and wait for the worker.
    pub fn stop(&mut self) -> bool {
        self.signal_stop();
        self.join()
    }

    /// Switch the relay off directly, bypassing the worker.
    pub fn force_off(&self) -> Result<(), SprayerError> {
        lock_relay(&self.relay)
            .off()
            .map_err(|e| map_hw_error(e.as_ref()))
    }

    pub fn stats(&self) -> LaneSnapshot {
        self.stats.snapshot()
    }
}

impl Drop for LaneHandle {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.stop();
        }
    }
}
