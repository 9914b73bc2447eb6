use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("gpio backend not compiled in (rebuild with --features hardware)")]
    Unsupported,
}

pub type Result<T> = std::result::Result<T, HwError>;
