//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all application settings.
//! Configuration is loaded from a TOML file with environment variable overrides
//! for the server endpoints (`EEGWATCH_WS_URL`, `EEGWATCH_API_URL`).
//!
//! # Example
//!
//! ```no_run
//! use eegwatch::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::endpoint::EndpointConfig;
use super::logging::LoggingConfig;
use super::telemetry::TelemetrySettings;
use crate::application::telemetry::TelemetryConfig;
use crate::error::{ConfigError, Result};

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`]. Every table is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Stream and REST endpoints.
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Reconnection, buffering, flush cadence and retention.
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// Endpoint URLs are overridden from the environment when set.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The TOML content is malformed
    /// - Validation fails (e.g., a zero buffer capacity)
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        Self::parse_toml_with(content, |key| std::env::var(key).ok())
    }

    /// Like [`parse_toml`](Self::parse_toml) with an explicit variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`parse_toml`](Self::parse_toml).
    #[allow(clippy::result_large_err)]
    pub fn parse_toml_with(
        content: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.endpoint.apply_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Load `path` if it exists, otherwise defaults plus env overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file is unreadable or invalid.
    #[allow(clippy::result_large_err)]
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Self::parse_toml("")
        }
    }

    /// Validate configuration values.
    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        self.logging.validate()?;
        self.endpoint.validate()?;
        self.telemetry.validate()?;
        Ok(())
    }

    /// Runtime parameters for a [`TelemetryClient`](crate::application::telemetry::TelemetryClient).
    #[must_use]
    pub fn telemetry_config(&self) -> TelemetryConfig {
        self.telemetry.to_config()
    }

    /// Initialize logging from the `[logging]` table.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
