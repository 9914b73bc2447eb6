use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum SprayerError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("unknown lane {lane} (controller drives {lanes} lanes)")]
    UnknownLane { lane: usize, lanes: usize },
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing relays")]
    MissingRelays,
    #[error("lane count mismatch: {lanes} lanes configured but {relays} relays provided")]
    LaneMismatch { lanes: usize, relays: usize },
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    #[error("failed to spawn worker for lane {lane}: {reason}")]
    Spawn { lane: usize, reason: String },
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
