#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    let Ok(cfg) = sprayer_config::load_toml(data) else {
        return;
    };
    if cfg.validate().is_ok() {
        // a valid config always yields one pin per lane
        let pins = cfg.relay_pins().unwrap_or_default();
        assert_eq!(pins.len(), cfg.system.relay_num);
    } else {
        let _ = cfg.relay_pins();
    }
});
