//! Maps `Box<dyn Error>` from trait boundaries to typed `SprayerError`.
//!
//! The traits in `sprayer_traits` use `Box<dyn Error + Send + Sync>` so that
//! any relay backend can plug in; this module converts those to our typed
//! error enum, with an optional feature-gated path for
//! `sprayer_hardware::HwError` downcasting.

use crate::error::SprayerError;

/// Map a trait-boundary error to a typed `SprayerError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> SprayerError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<sprayer_hardware::error::HwError>() {
            return match hw {
                sprayer_hardware::error::HwError::Unsupported => {
                    SprayerError::Config(hw.to_string())
                }
                sprayer_hardware::error::HwError::Gpio(_) => {
                    SprayerError::HardwareFault(hw.to_string())
                }
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("gpio") {
        SprayerError::HardwareFault(s)
    } else {
        SprayerError::Hardware(s)
    }
}
