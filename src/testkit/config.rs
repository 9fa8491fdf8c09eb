//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.
//! Avoids each test module defining its own slightly-different defaults.

use std::time::Duration;

use crate::application::telemetry::{FlushPolicy, RetentionPolicy, RetryPolicy, TelemetryConfig};

/// Calm flush cadence used by [`telemetry`].
pub const CALM: Duration = Duration::from_millis(200);

/// Alert flush cadence used by [`telemetry`].
pub const ALERT: Duration = Duration::from_millis(100);

/// Reconnect delay used by [`telemetry`].
pub const RETRY_DELAY: Duration = Duration::from_millis(100);

/// Retry policy with `max_attempts` and [`RETRY_DELAY`].
pub fn retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        delay: RETRY_DELAY,
    }
}

/// Short-cadence telemetry config.
///
/// Three attempts, 100 ms retry delay, 200/100 ms cadences, batches of
/// 16 (calm) and 64 (alert), 64-sample buffer and a 60 s retention window
/// so wall-clock drift never expires samples mid-test.
pub fn telemetry() -> TelemetryConfig {
    TelemetryConfig {
        retry: retry(3),
        buffer_capacity: 64,
        flush: FlushPolicy {
            calm_interval: CALM,
            alert_interval: ALERT,
            calm_batch_size: 16,
            alert_batch_size: 64,
        },
        retention: RetentionPolicy {
            window: Duration::from_secs(60),
            max_samples: 1000,
        },
        teardown_grace: Duration::from_millis(500),
    }
}
