//! Conversions from `sprayer_config` types to core runtime types.
use std::time::Duration;

use crate::config::{ControllerCfg, DispatchCfg};

/// Seconds from config; negative or non-finite values map to zero.
fn secs(s: f64) -> Duration {
    Duration::try_from_secs_f64(s).unwrap_or(Duration::ZERO)
}

impl From<&sprayer_config::Config> for DispatchCfg {
    fn from(c: &sprayer_config::Config) -> Self {
        Self {
            frame_width: c.camera.resolution_width,
            frame_height: c.camera.resolution_height,
            lanes: c.system.relay_num,
            activation_fraction: c.system.activation_fraction,
            delay: secs(c.system.delay_s),
            duration: secs(c.system.actuation_duration_s),
        }
    }
}

impl From<&sprayer_config::Config> for ControllerCfg {
    fn from(c: &sprayer_config::Config) -> Self {
        Self {
            lanes: Some(c.system.relay_num),
            queue_capacity: c.queue.capacity,
            startup_beep: Duration::from_millis(c.hardware.startup_beep_ms),
            ..ControllerCfg::default()
        }
    }
}
