use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use eegwatch::error::{ConfigError, Error};
use eegwatch::infrastructure::config::settings::Config;

static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn write_temp_config(contents: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let suffix = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.push(format!("eegwatch-config-test-{nanos}-{suffix}.toml"));
    fs::write(&path, contents).expect("write temp config");
    path
}

fn load(contents: &str) -> eegwatch::error::Result<Config> {
    let path = write_temp_config(contents);
    let result = Config::load(&path);
    let _ = fs::remove_file(&path);
    result
}

fn expect_invalid(contents: &str, expected: &str) {
    match load(contents) {
        Err(Error::Config(ConfigError::InvalidValue { field, .. })) if field == expected => {}
        Err(err) => panic!("Expected invalid {expected}, got {err}"),
        Ok(_) => panic!("Expected {expected} to be rejected"),
    }
}

#[test]
fn config_loads_full_file() {
    let toml = r#"
[logging]
level = "debug"
format = "json"

[endpoint]
ws_url = "wss://eeg.example.com/api/v1/ws/live_eeg"
api_url = "https://eeg.example.com"

[telemetry.reconnection]
max_attempts = 3
delay_ms = 500

[telemetry.buffer]
capacity = 128

[telemetry.flush]
calm_interval_ms = 50
alert_interval_ms = 50
calm_batch_size = 32
alert_batch_size = 64

[telemetry.retention]
window_secs = 10
max_samples = 256
"#;

    let config = load(toml).expect("valid config");
    let telemetry = config.telemetry_config();

    assert_eq!(config.logging.format, "json");
    assert_eq!(telemetry.retry.max_attempts, 3);
    assert_eq!(telemetry.retry.delay, Duration::from_millis(500));
    assert_eq!(telemetry.buffer_capacity, 128);
    assert_eq!(telemetry.flush.calm_interval, telemetry.flush.alert_interval);
    assert_eq!(telemetry.retention.window, Duration::from_secs(10));
    assert_eq!(telemetry.retention.max_samples, 256);
}

#[test]
fn config_fills_missing_tables_with_defaults() {
    let config = load("[telemetry.buffer]\ncapacity = 10\n").expect("valid config");

    assert_eq!(config.telemetry.buffer.capacity, 10);
    assert_eq!(config.telemetry.reconnection.max_attempts, 5);
    assert_eq!(config.telemetry.reconnection.delay_ms, 3000);
    assert_eq!(config.telemetry.flush.calm_interval_ms, 2000);
    assert_eq!(config.telemetry.flush.alert_interval_ms, 1000);
    assert_eq!(config.telemetry.retention.window_secs, 5);
    assert_eq!(config.telemetry.retention.max_samples, 2048);
}

#[test]
fn config_rejects_zero_capacity() {
    expect_invalid("[telemetry.buffer]\ncapacity = 0\n", "capacity");
}

#[test]
fn config_rejects_zero_attempts() {
    expect_invalid(
        "[telemetry.reconnection]\nmax_attempts = 0\n",
        "max_attempts",
    );
}

#[test]
fn config_rejects_zero_batch_size() {
    expect_invalid("[telemetry.flush]\nalert_batch_size = 0\n", "batch_size");
}

#[test]
fn config_rejects_alert_slower_than_calm() {
    expect_invalid(
        "[telemetry.flush]\ncalm_interval_ms = 1000\nalert_interval_ms = 2000\n",
        "alert_interval_ms",
    );
}

#[test]
fn config_rejects_zero_retention_window() {
    expect_invalid("[telemetry.retention]\nwindow_secs = 0\n", "window_secs");
}

#[test]
fn config_rejects_http_stream_url() {
    expect_invalid(
        "[endpoint]\nws_url = \"http://localhost:8000/api/v1/ws/live_eeg\"\n",
        "ws_url",
    );
}

#[test]
fn config_rejects_unknown_log_format() {
    expect_invalid("[logging]\nformat = \"xml\"\n", "logging.format");
}

#[test]
fn config_reports_malformed_toml() {
    assert!(matches!(
        load("[telemetry.buffer\ncapacity = 1"),
        Err(Error::Config(ConfigError::Parse(_)))
    ));
}

#[test]
fn config_reports_missing_file() {
    let path = std::env::temp_dir().join("eegwatch-config-test-does-not-exist.toml");
    assert!(matches!(
        Config::load(&path),
        Err(Error::Config(ConfigError::ReadFile(_)))
    ));
}
