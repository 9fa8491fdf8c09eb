//! Validated parameters for a telemetry client.

use std::time::Duration;

use super::policy::FlushPolicy;
use super::retry::RetryPolicy;
use super::window::RetentionPolicy;
use crate::error::ConfigError;

/// Everything a [`TelemetryClient`](super::TelemetryClient) needs besides its
/// stream factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub retry: RetryPolicy,
    pub buffer_capacity: usize,
    pub flush: FlushPolicy,
    pub retention: RetentionPolicy,
    /// How long teardown waits for a session task before aborting it.
    pub teardown_grace: Duration,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            buffer_capacity: 4096,
            flush: FlushPolicy::default(),
            retention: RetentionPolicy::default(),
            teardown_grace: Duration::from_secs(2),
        }
    }
}

impl TelemetryConfig {
    /// Reject parameter combinations the session cannot run with.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_attempts",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.retry.delay.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "delay_ms",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.buffer_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "capacity",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.flush.calm_interval.is_zero() || self.flush.alert_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "flush_interval",
                reason: "intervals must be greater than 0".to_string(),
            });
        }
        if self.flush.alert_interval > self.flush.calm_interval {
            return Err(ConfigError::InvalidValue {
                field: "alert_interval_ms",
                reason: "must be <= calm_interval_ms".to_string(),
            });
        }
        if self.flush.calm_batch_size == 0 || self.flush.alert_batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "batch_size",
                reason: "batch sizes must be greater than 0".to_string(),
            });
        }
        if self.retention.window.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "window_secs",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.retention.max_samples == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_samples",
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}
