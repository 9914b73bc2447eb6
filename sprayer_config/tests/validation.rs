use rstest::rstest;
use sprayer_config::{Backend, load_file, load_toml};
use std::io::Write;

fn config_with(system: &str, relays: &str, extra: &str) -> String {
    format!(
        r#"
[system]
{system}

[camera]
resolution_width = 1280
resolution_height = 720

[relays]
{relays}

{extra}
"#
    )
}

const FOUR_RELAYS: &str = "0 = 13\n1 = 19\n2 = 26\n3 = 21";

#[test]
fn accepts_complete_config() {
    let toml = config_with(
        "relay_num = 4\nactuation_duration_s = 0.8\ndelay_s = 0.05\nactivation_fraction = 0.5",
        FOUR_RELAYS,
        r#"
[queue]
capacity = 3

[hardware]
backend = "gpio"
buzzer_pin = 4
startup_beep_ms = 200

[logging]
level = "debug"
rotation = "daily"
job_log = "weed_log.csv"

[display]
nozzle_vis = true
"#,
    );
    let cfg = load_toml(&toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.hardware.backend, Backend::Gpio);
    assert_eq!(cfg.queue.capacity, 3);
    assert_eq!(cfg.logging.job_log.as_deref(), Some("weed_log.csv"));
}

#[rstest]
#[case("relay_num = 0", "", "relay_num must be >= 1")]
#[case("relay_num = 4", "0 = 13\n1 = 19\n2 = 26", "lane count mismatch")]
#[case("relay_num = 3", FOUR_RELAYS, "lane count mismatch")]
#[case("relay_num = 4", "0 = 13\n1 = 19\n2 = 26\n4 = 21", "missing lane 3")]
#[case("relay_num = 4", "0 = 13\n1 = 13\n2 = 26\n3 = 21", "more than one lane")]
#[case("relay_num = 4\nactuation_duration_s = -1.0", FOUR_RELAYS, "actuation_duration_s")]
#[case("relay_num = 4\ndelay_s = -0.1", FOUR_RELAYS, "delay_s")]
#[case("relay_num = 4\nactivation_fraction = 1.0", FOUR_RELAYS, "activation_fraction")]
fn rejects_invalid_system_or_relays(
    #[case] system: &str,
    #[case] relays: &str,
    #[case] needle: &str,
) {
    let toml = config_with(system, relays, "");
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(
        format!("{err}").contains(needle),
        "expected {needle:?} in {err}"
    );
}

#[test]
fn rejects_zero_queue_capacity() {
    let toml = config_with("relay_num = 4", FOUR_RELAYS, "[queue]\ncapacity = 0");
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("capacity 0");
    assert!(format!("{err}").contains("queue.capacity must be >= 1"));
}

#[test]
fn rejects_buzzer_on_relay_pin() {
    let toml = config_with("relay_num = 4", FOUR_RELAYS, "[hardware]\nbuzzer_pin = 19");
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("pin clash");
    assert!(format!("{err}").contains("buzzer_pin 19"));
}

#[test]
fn rejects_unknown_backend_at_parse_time() {
    let toml = config_with("relay_num = 4", FOUR_RELAYS, "[hardware]\nbackend = \"serial\"");
    assert!(load_toml(&toml).is_err());
}

#[test]
fn load_file_parses_and_validates() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", config_with("relay_num = 4", FOUR_RELAYS, "")).unwrap();
    let cfg = load_file(file.path()).expect("load");
    assert_eq!(cfg.relay_pins().unwrap().len(), 4);

    let mut bad = tempfile::NamedTempFile::new().unwrap();
    write!(bad, "{}", config_with("relay_num = 2", FOUR_RELAYS, "")).unwrap();
    let err = load_file(bad.path()).expect_err("mismatch");
    assert!(format!("{err}").contains("lane count mismatch"));
}

#[test]
fn shipped_sample_config_is_valid() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../etc/sprayer.toml");
    let cfg = sprayer_config::load_file(&path).unwrap();
    assert_eq!(cfg.relay_pins().unwrap(), vec![13, 19, 26, 21]);
}
