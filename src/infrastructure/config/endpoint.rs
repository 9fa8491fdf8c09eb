//! Upstream server endpoints.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Env var overriding [`EndpointConfig::ws_url`].
pub const WS_URL_ENV: &str = "EEGWATCH_WS_URL";
/// Env var overriding [`EndpointConfig::api_url`].
pub const API_URL_ENV: &str = "EEGWATCH_API_URL";

/// Where the live feed and the REST API live.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointConfig {
    /// Base stream URL. The patient id is appended as the last path segment.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    /// REST API root, used by connectivity checks.
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_ws_url() -> String {
    "ws://localhost:8000/api/v1/ws/live_eeg".into()
}

fn default_api_url() -> String {
    "http://localhost:8000".into()
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            api_url: default_api_url(),
        }
    }
}

impl EndpointConfig {
    /// Replace URLs with values from `lookup`, keyed by the env var names.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(WS_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.ws_url = url;
        }
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_url = url;
        }
    }

    /// Parsed stream base URL.
    ///
    /// # Errors
    ///
    /// Returns an error unless `ws_url` is a valid `ws` or `wss` URL.
    pub fn stream_url(&self) -> Result<Url, ConfigError> {
        parse_with_scheme("ws_url", &self.ws_url, &["ws", "wss"])
    }

    /// Parsed REST API root.
    ///
    /// # Errors
    ///
    /// Returns an error unless `api_url` is a valid `http` or `https` URL.
    pub fn api_url(&self) -> Result<Url, ConfigError> {
        parse_with_scheme("api_url", &self.api_url, &["http", "https"])
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        self.stream_url()?;
        self.api_url()?;
        Ok(())
    }
}

fn parse_with_scheme(
    field: &'static str,
    raw: &str,
    schemes: &[&str],
) -> Result<Url, ConfigError> {
    if raw.trim().is_empty() {
        return Err(ConfigError::MissingField { field });
    }
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
        field,
        reason: e.to_string(),
    })?;
    if !schemes.contains(&url.scheme()) {
        return Err(ConfigError::InvalidValue {
            field,
            reason: format!(
                "scheme must be one of {}, got \"{}\"",
                schemes.join("/"),
                url.scheme()
            ),
        });
    }
    Ok(url)
}
