use std::time::Duration;

use crate::error::Result;

/// Drive an output through `repeats` on/off cycles.
///
/// `set` receives `true` for the high phase and `false` for the low phase.
/// The line is always left low, even when a high phase fails midway.
pub fn pulse_train(
    mut set: impl FnMut(bool) -> Result<()>,
    on: Duration,
    off: Duration,
    repeats: u8,
) -> Result<()> {
    for i in 0..repeats {
        if let Err(e) = set(true) {
            let _ = set(false);
            return Err(e);
        }
        std::thread::sleep(on);
        set(false)?;
        // no trailing gap after the last pulse
        if i + 1 < repeats {
            std::thread::sleep(off);
        }
    }
    Ok(())
}
