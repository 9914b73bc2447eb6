//! Runtime configuration types for the actuation core.
//!
//! These are separate from the TOML-deserialized config in `sprayer_config`;
//! see `conversions` for the mapping.
use std::time::Duration;

/// Lifecycle controller settings.
#[derive(Debug, Clone)]
pub struct ControllerCfg {
    /// Lane count the relays must match; `None` accepts whatever is provided.
    pub lanes: Option<usize>,
    /// Jobs buffered per lane before the oldest is dropped.
    pub queue_capacity: usize,
    /// Confirmation beep after start-up; zero disables it.
    pub startup_beep: Duration,
    /// Length of each of the two shutdown beeps; zero disables them.
    pub shutdown_beep: Duration,
}

impl Default for ControllerCfg {
    fn default() -> Self {
        Self {
            lanes: None,
            queue_capacity: 5,
            startup_beep: Duration::from_millis(500),
            shutdown_beep: Duration::from_millis(100),
        }
    }
}

/// Dispatcher settings: frame geometry and default job timing.
#[derive(Debug, Clone)]
pub struct DispatchCfg {
    pub frame_width: u32,
    pub frame_height: u32,
    pub lanes: usize,
    /// Fraction of frame height a detection's `y` must exceed.
    pub activation_fraction: f64,
    pub delay: Duration,
    pub duration: Duration,
}

impl Default for DispatchCfg {
    fn default() -> Self {
        Self {
            frame_width: 640,
            frame_height: 480,
            lanes: 4,
            activation_fraction: 0.01,
            delay: Duration::ZERO,
            duration: Duration::from_millis(150),
        }
    }
}
