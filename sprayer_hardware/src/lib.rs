pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;
pub mod util;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use sprayer_traits::{Buzzer, Relay};

use crate::error::HwError;

/// Which relay/buzzer implementation to instantiate. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Simulated,
    Gpio,
}

/// Simulated relay: no I/O, only tracks the energized flag.
#[derive(Debug, Clone)]
pub struct SimulatedRelay {
    pin: u8,
    energized: Arc<AtomicBool>,
}

impl SimulatedRelay {
    pub fn new(pin: u8) -> Self {
        Self {
            pin,
            energized: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared view of the energized flag; stays valid after the relay is
    /// moved into a worker.
    pub fn energized(&self) -> Arc<AtomicBool> {
        self.energized.clone()
    }

    pub fn is_on(&self) -> bool {
        self.energized.load(Ordering::Acquire)
    }
}

impl Relay for SimulatedRelay {
    fn on(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.energized.store(true, Ordering::Release);
        tracing::trace!(pin = self.pin, "relay on (simulated)");
        Ok(())
    }

    fn off(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.energized.store(false, Ordering::Release);
        tracing::trace!(pin = self.pin, "relay off (simulated)");
        Ok(())
    }
}

/// Simulated buzzer; logs beeps and sleeps nothing.
#[derive(Debug, Default)]
pub struct SimulatedBuzzer {
    beeps: u32,
}

impl SimulatedBuzzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn beeps(&self) -> u32 {
        self.beeps
    }
}

impl Buzzer for SimulatedBuzzer {
    fn beep(
        &mut self,
        on: Duration,
        _off: Duration,
        repeats: u8,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.beeps = self.beeps.saturating_add(u32::from(repeats));
        tracing::debug!(on_ms = on.as_millis() as u64, repeats, "beep (simulated)");
        Ok(())
    }
}

pub type BoxedRelay = Box<dyn Relay + Send>;
pub type BoxedBuzzer = Box<dyn Buzzer + Send>;

/// Open one relay per pin, in lane order.
pub fn make_relays(backend: Backend, pins: &[u8]) -> Result<Vec<BoxedRelay>, HwError> {
    match backend {
        Backend::Simulated => Ok(pins
            .iter()
            .map(|&p| Box::new(SimulatedRelay::new(p)) as BoxedRelay)
            .collect()),
        Backend::Gpio => open_gpio_relays(pins),
    }
}

/// Open the confirmation buzzer. `None` pin on the GPIO backend yields no buzzer.
pub fn make_buzzer(backend: Backend, pin: Option<u8>) -> Result<Option<BoxedBuzzer>, HwError> {
    match (backend, pin) {
        (Backend::Simulated, _) => Ok(Some(Box::new(SimulatedBuzzer::new()))),
        (Backend::Gpio, None) => Ok(None),
        (Backend::Gpio, Some(pin)) => open_gpio_buzzer(pin).map(Some),
    }
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn open_gpio_relays(pins: &[u8]) -> Result<Vec<BoxedRelay>, HwError> {
    let gpio = rppal::gpio::Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
    pins.iter()
        .map(|&p| gpio::GpioRelay::open(&gpio, p).map(|r| Box::new(r) as BoxedRelay))
        .collect()
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn open_gpio_relays(_pins: &[u8]) -> Result<Vec<BoxedRelay>, HwError> {
    Err(HwError::Unsupported)
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn open_gpio_buzzer(pin: u8) -> Result<BoxedBuzzer, HwError> {
    let gpio = rppal::gpio::Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
    Ok(Box::new(gpio::GpioBuzzer::open(&gpio, pin)?))
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn open_gpio_buzzer(_pin: u8) -> Result<BoxedBuzzer, HwError> {
    Err(HwError::Unsupported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_relay_tracks_state() {
        let mut relay = SimulatedRelay::new(13);
        let flag = relay.energized();
        relay.on().unwrap();
        assert!(flag.load(Ordering::Acquire));
        relay.on().unwrap();
        assert!(relay.is_on());
        relay.off().unwrap();
        assert!(!flag.load(Ordering::Acquire));
    }

    #[test]
    fn simulated_backend_builds_one_relay_per_pin() {
        let relays = make_relays(Backend::Simulated, &[13, 19, 26]).unwrap();
        assert_eq!(relays.len(), 3);
    }

    #[cfg(not(feature = "hardware"))]
    #[test]
    fn gpio_backend_without_feature_is_unsupported() {
        let err = make_relays(Backend::Gpio, &[13]).err().expect("unsupported");
        assert!(matches!(err, HwError::Unsupported));
        assert!(make_buzzer(Backend::Gpio, None).unwrap().is_none());
    }
}
