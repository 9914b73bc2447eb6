use std::time::Duration;

use rppal::gpio::{Gpio, OutputPin};
use sprayer_traits::{Buzzer, Relay};
use tracing::trace;

use crate::error::{HwError, Result};
use crate::util::pulse_train;

fn open_output(gpio: &Gpio, pin: u8) -> Result<OutputPin> {
    let mut out = gpio
        .get(pin)
        .map_err(|e| HwError::Gpio(format!("open pin {pin}: {e}")))?
        .into_output();
    // relay boards must come up released
    out.set_low();
    // keep the line driven low if the process exits without an explicit off()
    out.set_reset_on_drop(false);
    Ok(out)
}

/// Relay channel on a BCM GPIO line; active high.
pub struct GpioRelay {
    pin: OutputPin,
}

impl GpioRelay {
    pub fn open(gpio: &Gpio, pin: u8) -> Result<Self> {
        Ok(Self {
            pin: open_output(gpio, pin)?,
        })
    }
}

impl Relay for GpioRelay {
    fn on(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.pin.set_high();
        trace!(pin = self.pin.pin(), "relay on");
        Ok(())
    }

    fn off(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.pin.set_low();
        trace!(pin = self.pin.pin(), "relay off");
        Ok(())
    }
}

/// Active buzzer on a GPIO line.
pub struct GpioBuzzer {
    pin: OutputPin,
}

impl GpioBuzzer {
    pub fn open(gpio: &Gpio, pin: u8) -> Result<Self> {
        Ok(Self {
            pin: open_output(gpio, pin)?,
        })
    }
}

impl Buzzer for GpioBuzzer {
    fn beep(
        &mut self,
        on: Duration,
        off: Duration,
        repeats: u8,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let pin = &mut self.pin;
        pulse_train(
            |high| {
                if high {
                    pin.set_high();
                } else {
                    pin.set_low();
                }
                Ok(())
            },
            on,
            off,
            repeats,
        )?;
        Ok(())
    }
}
