//! Lane worker timing with a manual clock: compensation, clamping,
//! coalescing, overflow and failure handling.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Call, RelayLog, SinkLog};
use sprayer_core::{ActuationJob, ChannelState, SharedClock, TransitionSink, channel, share_relay};
use sprayer_traits::{Clock, ManualClock};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn setup() -> (ManualClock, SharedClock, RelayLog) {
    let clock = ManualClock::new();
    let shared: SharedClock = Arc::new(clock.clone());
    (clock, shared, RelayLog::default())
}

#[test]
fn on_time_is_shortened_by_latency_since_detection() {
    let (clock, shared, relay_log) = setup();
    let t0 = clock.now();
    clock.advance(ms(400));

    let (mut lane, worker) = channel(0, share_relay(relay_log.relay(shared.clone())), 5, shared, None);
    lane.submit(ActuationJob::new(0, t0, Duration::ZERO, ms(1000)));
    lane.start(worker).unwrap();
    assert!(lane.stop());

    assert_eq!(
        relay_log.timeline(t0),
        vec![(Call::On, ms(400)), (Call::Off, ms(1000))]
    );
    let s = lane.stats();
    assert_eq!((s.processed, s.anomalies), (1, 0));
}

#[test]
fn overdue_job_clamps_to_zero_and_counts_anomaly() {
    let (clock, shared, relay_log) = setup();
    let t0 = clock.now();
    clock.advance(Duration::from_secs(5));

    let (mut lane, worker) = channel(0, share_relay(relay_log.relay(shared.clone())), 5, shared, None);
    lane.submit(ActuationJob::new(0, t0, Duration::ZERO, ms(1000)));
    lane.start(worker).unwrap();
    assert!(lane.stop());

    let timeline = relay_log.timeline(t0);
    assert_eq!(timeline.len(), 2);
    assert_eq!(timeline[0].1, timeline[1].1, "zero-length pulse");
    let s = lane.stats();
    assert_eq!((s.processed, s.anomalies, s.hw_failures), (1, 1, 0));
}

#[test]
fn queued_jobs_extend_one_pulse() {
    let (clock, shared, relay_log) = setup();
    let sink = Arc::new(SinkLog::default());
    let t0 = clock.now();

    let (mut lane, worker) = channel(
        0,
        share_relay(relay_log.relay(shared.clone())),
        5,
        shared,
        Some(sink.clone() as Arc<dyn TransitionSink>),
    );
    lane.submit(ActuationJob::new(0, t0, Duration::ZERO, ms(300)));
    lane.submit(ActuationJob::new(0, t0 + ms(200), ms(999), ms(300)));
    lane.submit(ActuationJob::new(0, t0 + ms(250), ms(999), ms(300)));
    lane.start(worker).unwrap();
    assert!(lane.stop());

    // delay only applies while off; 300 + 200 + 50 ms of continuous spray
    assert_eq!(
        relay_log.timeline(t0),
        vec![(Call::On, Duration::ZERO), (Call::Off, ms(550))]
    );
    assert_eq!(sink.for_lane(0), vec![ChannelState::On, ChannelState::Off]);
}

#[test]
fn overflow_drops_the_oldest_job_unserved() {
    let (clock, shared, relay_log) = setup();
    let t0 = clock.now();

    let (mut lane, worker) = channel(0, share_relay(relay_log.relay(shared.clone())), 5, shared, None);
    // the first job carries a long delay; had it been served the ON would be late
    assert!(lane.submit(ActuationJob::new(0, t0, ms(500), ms(100))).is_none());
    for _ in 0..4 {
        assert!(lane.submit(ActuationJob::new(0, t0, Duration::ZERO, ms(100))).is_none());
    }
    let evicted = lane
        .submit(ActuationJob::new(0, t0, Duration::ZERO, ms(100)))
        .expect("sixth job evicts the oldest");
    assert_eq!(evicted.delay, ms(500));
    assert_eq!(lane.pending(), 5);

    lane.start(worker).unwrap();
    assert!(lane.stop());

    assert_eq!(
        relay_log.timeline(t0),
        vec![(Call::On, Duration::ZERO), (Call::Off, ms(100))]
    );
    let s = lane.stats();
    assert_eq!((s.submitted, s.dropped, s.processed), (6, 1, 5));
}

#[test]
fn failed_on_is_retried_by_the_next_job() {
    let (clock, shared, relay_log) = setup();
    let sink = Arc::new(SinkLog::default());
    let t0 = clock.now();
    relay_log.fail_next_ons(1);

    let (mut lane, worker) = channel(
        0,
        share_relay(relay_log.relay(shared.clone())),
        5,
        shared,
        Some(sink.clone() as Arc<dyn TransitionSink>),
    );
    lane.start(worker).unwrap();

    lane.submit(ActuationJob::new(0, t0, Duration::ZERO, ms(100)));
    assert!(common::wait_until(Duration::from_secs(2), || lane.stats().processed == 1));
    lane.submit(ActuationJob::new(0, clock.now(), Duration::ZERO, ms(100)));
    assert!(lane.stop());

    // the failed ON leaves the logical state OFF, so the second job turns it on
    assert_eq!(relay_log.count(Call::On), 1);
    assert_eq!(relay_log.last(), Some(Call::Off));
    assert_eq!(sink.for_lane(0), vec![ChannelState::On, ChannelState::Off]);
    let s = lane.stats();
    assert_eq!((s.processed, s.hw_failures), (2, 1));
}

#[test]
fn failed_off_keeps_lane_on_until_the_next_job() {
    let (clock, shared, relay_log) = setup();
    let sink = Arc::new(SinkLog::default());
    let t0 = clock.now();
    relay_log.fail_next_offs(1);

    let (mut lane, worker) = channel(
        0,
        share_relay(relay_log.relay(shared.clone())),
        5,
        shared,
        Some(sink.clone() as Arc<dyn TransitionSink>),
    );
    lane.start(worker).unwrap();

    lane.submit(ActuationJob::new(0, t0, Duration::ZERO, ms(100)));
    assert!(common::wait_until(Duration::from_secs(2), || lane.stats().hw_failures == 1));
    assert_eq!(sink.for_lane(0), vec![ChannelState::On]);

    // still logically on: no delay and no second on() before the retried off
    lane.submit(ActuationJob::new(0, clock.now(), ms(999), ms(100)));
    assert!(lane.stop());

    assert_eq!(
        relay_log.timeline(t0),
        vec![(Call::On, Duration::ZERO), (Call::Off, ms(200))]
    );
    assert_eq!(sink.for_lane(0), vec![ChannelState::On, ChannelState::Off]);
    let s = lane.stats();
    assert_eq!((s.processed, s.hw_failures), (2, 1));
}

#[test]
fn stop_on_idle_lane_is_silent() {
    let (_clock, shared, relay_log) = setup();
    let (mut lane, worker) = channel(0, share_relay(relay_log.relay(shared.clone())), 5, shared, None);
    lane.start(worker).unwrap();
    assert!(lane.stop());
    assert!(relay_log.calls().is_empty());
}

#[test]
fn dropping_a_handle_drains_and_stops_its_worker() {
    for _ in 0..10 {
        let (clock, shared, relay_log) = setup();
        let (mut lane, worker) =
            channel(0, share_relay(relay_log.relay(shared.clone())), 5, shared, None);
        lane.start(worker).unwrap();
        lane.submit(ActuationJob::new(0, clock.now(), Duration::ZERO, ms(10)));
        drop(lane);
        assert_eq!(relay_log.calls(), vec![Call::On, Call::Off]);
    }
}

#[test]
fn starting_twice_is_rejected() {
    let (_clock, shared, relay_log) = setup();
    let (mut lane, worker) = channel(0, share_relay(relay_log.relay(shared.clone())), 5, shared.clone(), None);
    let (_other, second) = channel(1, share_relay(relay_log.relay(shared.clone())), 5, shared, None);
    lane.start(worker).unwrap();
    assert!(lane.start(second).is_err());
}
