pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// One physical output channel (relay + solenoid nozzle).
///
/// Both calls are idempotent: switching an energized relay on again, or a
/// released relay off again, is harmless.
pub trait Relay {
    fn on(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn off(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Audible confirmation device.
pub trait Buzzer {
    fn beep(
        &mut self,
        on: std::time::Duration,
        off: std::time::Duration,
        repeats: u8,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<R: Relay + ?Sized> Relay for Box<R> {
    fn on(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).on()
    }
    fn off(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).off()
    }
}

impl<B: Buzzer + ?Sized> Buzzer for Box<B> {
    fn beep(
        &mut self,
        on: std::time::Duration,
        off: std::time::Duration,
        repeats: u8,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).beep(on, off, repeats)
    }
}
