#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Actuation scheduling core (hardware-agnostic).
//!
//! Turns per-frame weed detections into timed relay pulses. All hardware
//! interaction goes through `sprayer_traits::Relay` and
//! `sprayer_traits::Buzzer`.
//!
//! ## Architecture
//!
//! - **Lanes**: integer partition of the frame width, one lane per nozzle (`lanes`)
//! - **Jobs**: detection timestamp plus delay and duration (`job`)
//! - **Scheduling**: bounded drop-oldest queue and one worker thread per lane (`queue`, `scheduler`)
//! - **Lifecycle**: start, override, stop with forced all-off (`controller`)
//! - **Dispatch**: activation line, lane lookup, job logging (`dispatch`, `job_log`)
//!
//! ## Timing
//!
//! A job's on-time is measured from the frame's capture instant, not from the
//! moment it is served: `effective = max(0, duration - (now - detected_at))`.
//! Jobs that arrive while a lane is already on extend the pulse instead of
//! cycling the relay.

pub mod config;
pub mod controller;
pub mod conversions;
pub mod detection;
pub mod dispatch;
pub mod error;
pub mod hw_error;
pub mod job;
pub mod job_log;
pub mod lanes;
pub mod queue;
pub mod scheduler;
pub mod stats;
pub mod status;

pub use config::{ControllerCfg, DispatchCfg};
pub use controller::{BoxedBuzzer, ControllerBuilder, JobSink, SprayController};
pub use detection::{BoundingBox, Detections, Point};
pub use dispatch::{DispatchSummary, Dispatcher};
pub use error::{BuildError, Report, Result, SprayerError};
pub use job::{ActuationJob, OnTime};
pub use job_log::{CsvJobLogger, JobLogger, TracingJobLogger};
pub use lanes::{Lane, LaneMap};
pub use scheduler::{BoxedRelay, LaneHandle, Override, SharedClock, SharedRelay, channel, share_relay};
pub use stats::LaneSnapshot;
pub use status::{ChannelState, TransitionSink};
