#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the sprayer.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - `[relays]` maps lane indices (string keys, TOML tables cannot have
//!   integer keys) to BCM GPIO pins; `relay_pins()` returns them in lane order.
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct System {
    /// Number of lanes, equal to the number of physical relays.
    pub relay_num: usize,
    /// Requested spray duration per detection (seconds).
    pub actuation_duration_s: f64,
    /// Plumbing/solenoid lag applied before a lane switches on (seconds).
    pub delay_s: f64,
    /// Fraction of frame height a detection must pass before it is sprayed.
    pub activation_fraction: f64,
}

impl Default for System {
    fn default() -> Self {
        Self {
            relay_num: 4,
            actuation_duration_s: 0.15,
            delay_s: 0.0,
            activation_fraction: 0.01,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Camera {
    pub resolution_width: u32,
    pub resolution_height: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Queue {
    /// Pending jobs kept per lane; the oldest is dropped on overflow.
    pub capacity: usize,
}

impl Default for Queue {
    fn default() -> Self {
        Self { capacity: 5 }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Simulated,
    Gpio,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Hardware {
    pub backend: Backend,
    /// Buzzer used for start/stop confirmation; none when absent.
    pub buzzer_pin: Option<u8>,
    /// Length of the start-up confirmation beep (0 disables it).
    pub startup_beep_ms: u64,
}

impl Default for Hardware {
    fn default() -> Self {
        Self {
            backend: Backend::Simulated,
            buzzer_pin: None,
            startup_beep_ms: 500,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
    /// Optional CSV file receiving one row per submitted job.
    pub job_log: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Display {
    /// Draw a live row of nozzle boxes in the terminal.
    pub nozzle_vis: bool,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub system: System,
    pub camera: Camera,
    pub relays: BTreeMap<String, u8>,
    #[serde(default)]
    pub queue: Queue,
    #[serde(default)]
    pub hardware: Hardware,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub display: Display,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &std::path::Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {}: {}", path.display(), e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parse config {}: {}", path.display(), e))?;
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    /// Relay pins ordered by lane index.
    ///
    /// Fails unless the keys are exactly `"0"..relay_num`.
    pub fn relay_pins(&self) -> eyre::Result<Vec<u8>> {
        let mut by_lane = BTreeMap::new();
        for (key, pin) in &self.relays {
            let lane: usize = key
                .trim()
                .parse()
                .map_err(|_| eyre::eyre!("relays: key {key:?} is not a lane index"))?;
            if by_lane.insert(lane, *pin).is_some() {
                eyre::bail!("relays: lane {lane} listed twice");
            }
        }
        if by_lane.len() != self.system.relay_num {
            eyre::bail!(
                "lane count mismatch: system.relay_num = {} but [relays] lists {} pins",
                self.system.relay_num,
                by_lane.len()
            );
        }
        let pins: Vec<u8> = by_lane
            .into_iter()
            .enumerate()
            .map(|(expect, (lane, pin))| {
                if lane == expect {
                    Ok(pin)
                } else {
                    Err(eyre::eyre!("relays: missing lane {expect}"))
                }
            })
            .collect::<eyre::Result<_>>()?;
        Ok(pins)
    }

    pub fn validate(&self) -> eyre::Result<()> {
        // System
        if self.system.relay_num == 0 {
            eyre::bail!("system.relay_num must be >= 1");
        }
        if !(self.system.actuation_duration_s.is_finite() && self.system.actuation_duration_s >= 0.0)
        {
            eyre::bail!("system.actuation_duration_s must be a finite value >= 0");
        }
        if !(self.system.delay_s.is_finite() && self.system.delay_s >= 0.0) {
            eyre::bail!("system.delay_s must be a finite value >= 0");
        }
        if !(0.0..1.0).contains(&self.system.activation_fraction) {
            eyre::bail!("system.activation_fraction must be in [0.0, 1.0)");
        }

        // Camera
        if self.camera.resolution_height == 0 {
            eyre::bail!("camera.resolution_height must be > 0");
        }
        if (self.camera.resolution_width as usize) < self.system.relay_num {
            eyre::bail!(
                "camera.resolution_width ({}) must be >= system.relay_num ({})",
                self.camera.resolution_width,
                self.system.relay_num
            );
        }

        // Relays
        let pins = self.relay_pins()?;
        let unique: BTreeSet<u8> = pins.iter().copied().collect();
        if unique.len() != pins.len() {
            eyre::bail!("relays: the same GPIO pin is assigned to more than one lane");
        }
        if let Some(b) = self.hardware.buzzer_pin
            && unique.contains(&b)
        {
            eyre::bail!("hardware.buzzer_pin {b} is also used as a relay pin");
        }

        // Queue
        if self.queue.capacity == 0 {
            eyre::bail!("queue.capacity must be >= 1");
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}
