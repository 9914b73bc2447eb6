//! Human-readable error descriptions, structured JSON errors and exit codes.

use sprayer_core::error::{BuildError, SprayerError};
use sprayer_hardware::error::HwError;

/// Stable process exit codes.
pub const EXIT_OTHER: i32 = 1;
pub const EXIT_CONFIG: i32 = 2;
pub const EXIT_HARDWARE: i32 = 3;

/// Typed view of the error, when it is one of ours.
fn classify(err: &eyre::Report) -> Option<SprayerError> {
    if let Some(se) = err.downcast_ref::<SprayerError>() {
        return Some(se.clone());
    }
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return Some(SprayerError::Config(be.to_string()));
    }
    if let Some(hw) = err.downcast_ref::<HwError>() {
        return Some(sprayer_core::hw_error::map_hw_error(hw));
    }
    None
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingRelays => {
                "What happened: No relays were provided to the controller.\nLikely causes: [relays] is empty or the backend opened no pins.\nHow to fix: List one GPIO pin per lane under [relays] (\"0\" = 13, ...).".to_string()
            }
            BuildError::LaneMismatch { lanes, relays } => format!(
                "What happened: {lanes} lanes are configured but {relays} relays were opened.\nLikely causes: system.relay_num disagrees with the [relays] table.\nHow to fix: Make system.relay_num equal to the number of [relays] entries."
            ),
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/sprayer.toml for a sample."
            ),
            BuildError::Spawn { lane, reason } => format!(
                "What happened: Could not start the worker thread for lane {lane} ({reason}).\nLikely causes: Thread or memory limits of the process.\nHow to fix: Check 'ulimit -u' and available memory."
            ),
        };
    }

    match classify(err) {
        Some(SprayerError::Config(msg)) => {
            return format!(
                "What happened: Configuration error: {msg}.\nLikely causes: Missing file, missing sections or out-of-range values.\nHow to fix: Edit the TOML config (see etc/sprayer.toml) and try again."
            );
        }
        Some(SprayerError::HardwareFault(msg)) => {
            return format!(
                "What happened: GPIO access failed: {msg}.\nLikely causes: Wrong pin numbers, pins in use by another process, or missing GPIO permissions.\nHow to fix: Check [relays] and hardware.buzzer_pin; run as a user in the 'gpio' group."
            );
        }
        Some(SprayerError::Hardware(msg)) => {
            return format!(
                "What happened: Hardware error: {msg}.\nLikely causes: Relay board wiring or power.\nHow to fix: Re-run with --log-level=debug and check the relay board."
            );
        }
        Some(other) => {
            return format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            );
        }
        None => {}
    }

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();
    if lower.contains("detection stream") {
        return format!(
            "What happened: Could not read the detection stream ({err:#}).\nLikely causes: Wrong path or a malformed JSON line.\nHow to fix: Each line must look like {{\"t_ms\": 0, \"centers\": [[x, y]]}}."
        );
    }

    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match classify(err) {
        Some(SprayerError::Config(_)) => EXIT_CONFIG,
        Some(SprayerError::Hardware(_) | SprayerError::HardwareFault(_)) => EXIT_HARDWARE,
        _ => EXIT_OTHER,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;
    let reason = match classify(err) {
        Some(SprayerError::Config(_)) => "Config",
        Some(SprayerError::Hardware(_) | SprayerError::HardwareFault(_)) => "Hardware",
        Some(SprayerError::UnknownLane { .. }) => "UnknownLane",
        Some(SprayerError::State(_)) => "State",
        None => "Error",
    };
    json!({
        "reason": reason,
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_kind() {
        let cfg = eyre::Report::new(SprayerError::Config("bad".into()));
        let lanes = eyre::Report::new(BuildError::LaneMismatch { lanes: 4, relays: 3 });
        let gpio = eyre::Report::new(HwError::Gpio("pin 13 busy".into()));
        let unsupported = eyre::Report::new(HwError::Unsupported);
        let other = eyre::eyre!("boom");
        assert_eq!(exit_code_for_error(&cfg), EXIT_CONFIG);
        assert_eq!(exit_code_for_error(&lanes), EXIT_CONFIG);
        assert_eq!(exit_code_for_error(&gpio), EXIT_HARDWARE);
        assert_eq!(exit_code_for_error(&unsupported), EXIT_CONFIG);
        assert_eq!(exit_code_for_error(&other), EXIT_OTHER);
    }

    #[test]
    fn json_error_has_reason_and_message() {
        let err = eyre::Report::new(BuildError::LaneMismatch { lanes: 4, relays: 3 });
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "Config");
        assert_eq!(v["exit_code"], 2);
        assert!(v["message"].as_str().unwrap().contains("system.relay_num"));
    }
}
