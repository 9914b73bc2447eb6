#![allow(dead_code)]
//! Recording relays, buzzers and sinks shared by the integration tests.

use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use sprayer_core::{ChannelState, SharedClock, TransitionSink};
use sprayer_traits::{Buzzer, Relay};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    On,
    Off,
}

/// Observer side of a `RecordingRelay`; clones share one log.
#[derive(Clone, Default)]
pub struct RelayLog {
    log: Arc<Mutex<Vec<(Call, Instant)>>>,
    failing_ons: Arc<AtomicUsize>,
    failing_offs: Arc<AtomicUsize>,
}

impl RelayLog {
    /// Relay whose calls are timestamped with `clock`.
    pub fn relay(&self, clock: SharedClock) -> Box<dyn Relay + Send> {
        Box::new(RecordingRelay {
            relay_log: self.clone(),
            clock,
        })
    }

    /// Make the next `n` calls to `on()` fail.
    pub fn fail_next_ons(&self, n: usize) {
        self.failing_ons.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` calls to `off()` fail.
    pub fn fail_next_offs(&self, n: usize) {
        self.failing_offs.store(n, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.lock().unwrap().iter().map(|(c, _)| *c).collect()
    }

    /// Calls with their offset from `origin`.
    pub fn timeline(&self, origin: Instant) -> Vec<(Call, Duration)> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .map(|(c, t)| (*c, t.saturating_duration_since(origin)))
            .collect()
    }

    pub fn count(&self, call: Call) -> usize {
        self.calls().into_iter().filter(|c| *c == call).count()
    }

    pub fn last(&self) -> Option<Call> {
        self.calls().last().copied()
    }
}

struct RecordingRelay {
    relay_log: RelayLog,
    clock: SharedClock,
}

impl RecordingRelay {
    /// Failed calls are not logged.
    fn record(&self, call: Call, failing: &AtomicUsize) -> Result<(), Box<dyn Error + Send + Sync>> {
        if failing
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err("gpio write failed".into());
        }
        self.relay_log.log.lock().unwrap().push((call, self.clock.now()));
        Ok(())
    }
}

impl Relay for RecordingRelay {
    fn on(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.record(Call::On, &self.relay_log.failing_ons)
    }

    fn off(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.record(Call::Off, &self.relay_log.failing_offs)
    }
}

/// Buzzer that records `(on, repeats)` per call.
#[derive(Clone, Default)]
pub struct BeepLog(pub Arc<Mutex<Vec<(Duration, u8)>>>);

impl Buzzer for BeepLog {
    fn beep(
        &mut self,
        on: Duration,
        _off: Duration,
        repeats: u8,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.0.lock().unwrap().push((on, repeats));
        Ok(())
    }
}

/// Transition sink that keeps every update in order.
#[derive(Default)]
pub struct SinkLog(pub Mutex<Vec<(usize, ChannelState)>>);

impl SinkLog {
    pub fn for_lane(&self, lane: usize) -> Vec<ChannelState> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == lane)
            .map(|(_, s)| *s)
            .collect()
    }
}

impl TransitionSink for SinkLog {
    fn update(&self, lane: usize, state: ChannelState) {
        self.0.lock().unwrap().push((lane, state));
    }
}

/// Poll `cond` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    cond()
}
