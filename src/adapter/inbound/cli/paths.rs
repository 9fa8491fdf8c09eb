//! Path utilities for eegwatch.
//!
//! All user data lives under `~/.eegwatch/`:
//! - `~/.eegwatch/config.toml` - main configuration

use std::path::PathBuf;

/// Returns the eegwatch home directory (`~/.eegwatch/`).
pub fn home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".eegwatch")
}

/// Returns the default config file path (`~/.eegwatch/config.toml`).
pub fn default_config() -> PathBuf {
    home_dir().join("config.toml")
}
