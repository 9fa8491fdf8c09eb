//! `[telemetry]` configuration sections.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::application::telemetry::{FlushPolicy, RetentionPolicy, RetryPolicy, TelemetryConfig};
use crate::error::ConfigError;

/// Stream reconnection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReconnectionConfig {
    /// Consecutive failures allowed before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Fixed delay between attempts (milliseconds).
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_delay_ms() -> u64 {
    3000 // 3 seconds
}

impl Default for ReconnectionConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_delay_ms(),
        }
    }
}

/// Ingest buffer settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BufferConfig {
    /// Samples held between flushes. The oldest is dropped on overflow.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    4096
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

/// Flush cadence and batch sizes per alert mode.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FlushConfig {
    #[serde(default = "default_calm_interval_ms")]
    pub calm_interval_ms: u64,
    #[serde(default = "default_alert_interval_ms")]
    pub alert_interval_ms: u64,
    #[serde(default = "default_calm_batch_size")]
    pub calm_batch_size: usize,
    #[serde(default = "default_alert_batch_size")]
    pub alert_batch_size: usize,
}

fn default_calm_interval_ms() -> u64 {
    2000
}

fn default_alert_interval_ms() -> u64 {
    1000
}

fn default_calm_batch_size() -> usize {
    1024
}

fn default_alert_batch_size() -> usize {
    4096
}

impl Default for FlushConfig {
    fn default() -> Self {
        Self {
            calm_interval_ms: default_calm_interval_ms(),
            alert_interval_ms: default_alert_interval_ms(),
            calm_batch_size: default_calm_batch_size(),
            alert_batch_size: default_alert_batch_size(),
        }
    }
}

/// Visible sample retention.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetentionConfig {
    /// Samples older than this (relative to flush time) are dropped.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    /// Hard cap on visible samples.
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,
}

fn default_window_secs() -> u64 {
    5
}

fn default_max_samples() -> usize {
    2048
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            max_samples: default_max_samples(),
        }
    }
}

/// The `[telemetry]` table.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub reconnection: ReconnectionConfig,
    #[serde(default)]
    pub buffer: BufferConfig,
    #[serde(default)]
    pub flush: FlushConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
}

impl TelemetrySettings {
    /// Convert into the client's runtime parameters.
    #[must_use]
    pub fn to_config(&self) -> TelemetryConfig {
        TelemetryConfig {
            retry: RetryPolicy {
                max_attempts: self.reconnection.max_attempts,
                delay: Duration::from_millis(self.reconnection.delay_ms),
            },
            buffer_capacity: self.buffer.capacity,
            flush: FlushPolicy {
                calm_interval: Duration::from_millis(self.flush.calm_interval_ms),
                alert_interval: Duration::from_millis(self.flush.alert_interval_ms),
                calm_batch_size: self.flush.calm_batch_size,
                alert_batch_size: self.flush.alert_batch_size,
            },
            retention: RetentionPolicy {
                window: Duration::from_secs(self.retention.window_secs),
                max_samples: self.retention.max_samples,
            },
            ..TelemetryConfig::default()
        }
    }

    #[allow(clippy::result_large_err)]
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        self.to_config().validate()
    }
}
