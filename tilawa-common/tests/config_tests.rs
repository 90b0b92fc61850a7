//! Configuration file loading end to end
//!
//! Tests that touch TILAWA_CONFIG are marked #[serial] so they never race
//! on the process environment.

use serial_test::serial;
use std::env;
use std::io::Write;
use tilawa_common::config::{SyncConfig, CONFIG_ENV_VAR};
use tilawa_common::GainCurve;

const FULL_CONFIG: &str = r#"
[server]
host = "0.0.0.0"
port = 8080

[logging]
level = "debug"

[content]
default_section = 36
default_voice = "ar.mahermuaiqly"
allowed_voices = ["ar.mahermuaiqly", "custom.whole"]
album = "Recitations"

[[content.continuous_voices]]
identifier = "custom.whole"
name = "Custom"
english_name = "Custom reciter"
url_prefix = "https://audio.example.org/custom/"

[transport]
ramp_duration_ms = 600
ramp_step = 0.1
ramp_curve = "equal_power"

[scroll]
threshold_px = 4.0
smooth_centering = false

[events]
capacity = 256

[simulation]
unit_duration_secs = 2.5
"#;

#[test]
fn test_full_document() {
    let config = SyncConfig::from_toml_str(FULL_CONFIG).unwrap();

    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.content.default_section, 36);
    assert_eq!(config.content.allowed_voices.len(), 2);
    assert_eq!(config.content.continuous_voices.len(), 1);
    assert_eq!(
        config.content.continuous_voices[0].url_prefix,
        "https://audio.example.org/custom/"
    );
    assert_eq!(config.content.album, "Recitations");
    // Unset keys in a present table keep their defaults
    assert_eq!(config.content.translation_edition, "en.hilali");

    assert_eq!(config.transport.ramp_curve, GainCurve::EqualPower);
    assert_eq!(config.transport.ramp_interval().as_millis(), 60);
    assert_eq!(config.scroll.threshold_px, 4.0);
    assert!(!config.scroll.smooth_centering);
    assert_eq!(config.scroll.quiet_period_ms, 4000);
    assert_eq!(config.events.capacity, 256);
    assert_eq!(config.simulation.unit_duration_secs, 2.5);
    assert_eq!(config.simulation.load_latency_ms, 150);
}

#[test]
fn test_empty_document_is_all_defaults() {
    let config = SyncConfig::from_toml_str("").unwrap();
    assert_eq!(config.server.port, 5741);
    assert_eq!(config.content.continuous_voices.len(), 3);
}

#[test]
fn test_zero_capacity_rejected() {
    assert!(SyncConfig::from_toml_str("[events]\ncapacity = 0\n").is_err());
}

#[test]
#[serial]
fn test_environment_variable_selects_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(FULL_CONFIG.as_bytes()).unwrap();

    env::set_var(CONFIG_ENV_VAR, file.path());
    let (config, path) = SyncConfig::load_resolved(None).unwrap();
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(path.as_deref(), Some(file.path()));
    assert_eq!(config.server.port, 8080);
}

#[test]
#[serial]
fn test_invalid_file_reports_its_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"[transport]\nramp_step = 2.0\n").unwrap();

    env::set_var(CONFIG_ENV_VAR, file.path());
    let result = SyncConfig::load_resolved(None);
    env::remove_var(CONFIG_ENV_VAR);

    let message = result.unwrap_err().to_string();
    assert!(message.contains(&file.path().display().to_string()));
}
