//! Handler for the `config` command group.

use std::fs;
use std::path::Path;

use crate::adapter::inbound::cli::output;
use crate::error::{ConfigError, Result};
use crate::infrastructure::config::settings::Config;

/// Default config template with documentation.
const CONFIG_TEMPLATE: &str = include_str!("../../../../config.toml.example");

/// Execute `config init`.
pub fn execute_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(ConfigError::InvalidValue {
            field: "config",
            reason: "file already exists (use --force to overwrite)".to_string(),
        }
        .into());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, CONFIG_TEMPLATE)?;
    output::section("Config Initialized");
    output::success("Created configuration file");
    output::field("Path", path.display());
    output::section("Next Steps");
    output::note(&format!("1. Edit {} with your server URLs", path.display()));
    output::note(&format!("2. Run: eegwatch check config -c {}", path.display()));
    output::note(&format!(
        "3. Run: eegwatch watch --patient <id> -c {}",
        path.display()
    ));
    Ok(())
}

/// Execute `config show`.
///
/// A missing file shows the defaults.
pub fn execute_show(path: &Path) -> Result<()> {
    let config = Config::load_or_default(path)?;

    if output::is_json() {
        output::json_line("config", serde_json::to_value(&config)?);
        return Ok(());
    }

    output::section("Effective Configuration");
    if path.exists() {
        output::field("Config", path.display());
    } else {
        output::field("Config", output::muted("(defaults)"));
        output::hint("run `eegwatch config init` to create a config file");
    }
    output::field("Log level", &config.logging.level);
    output::field("Log format", &config.logging.format);

    output::section("Endpoint");
    output::field("Stream", &config.endpoint.ws_url);
    output::field("API", &config.endpoint.api_url);

    let telemetry = &config.telemetry;
    output::section("Reconnection");
    output::field("Max attempts", telemetry.reconnection.max_attempts);
    output::field("Delay", format!("{}ms", telemetry.reconnection.delay_ms));

    output::section("Flush");
    output::field("Buffer", telemetry.buffer.capacity);
    output::field(
        "Calm",
        format!(
            "every {}ms, up to {} samples",
            telemetry.flush.calm_interval_ms, telemetry.flush.calm_batch_size
        ),
    );
    output::field(
        "Alert",
        format!(
            "every {}ms, up to {} samples",
            telemetry.flush.alert_interval_ms, telemetry.flush.alert_batch_size
        ),
    );

    output::section("Retention");
    output::field("Window", format!("{}s", telemetry.retention.window_secs));
    output::field("Max samples", telemetry.retention.max_samples);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_is_a_valid_config() {
        let config = Config::parse_toml_with(CONFIG_TEMPLATE, |_| None).unwrap();
        assert_eq!(config.telemetry.reconnection.max_attempts, 5);
        assert_eq!(config.telemetry.flush.calm_interval_ms, 2000);
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "# mine").unwrap();

        assert!(execute_init(&path, false).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "# mine");
    }

    #[test]
    fn test_init_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        execute_init(&path, false).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), CONFIG_TEMPLATE);
    }
}
