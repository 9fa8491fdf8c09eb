//! Alert-mode driven flush policy.
//!
//! The alert flag of the most recently ingested sample is read once per tick
//! into an [`AlertMode`]; both the batch size and the cadence are then taken
//! from the same mode so a single tick never mixes the two.

use std::time::Duration;

/// Operating mode derived from the upstream alert flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AlertMode {
    #[default]
    Calm,
    Alert,
}

impl AlertMode {
    #[must_use]
    pub const fn from_flag(alert: bool) -> Self {
        if alert {
            Self::Alert
        } else {
            Self::Calm
        }
    }

    #[must_use]
    pub const fn is_alert(self) -> bool {
        matches!(self, Self::Alert)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Calm => "calm",
            Self::Alert => "alert",
        }
    }
}

/// Cadence and batch size per alert mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushPolicy {
    pub calm_interval: Duration,
    pub alert_interval: Duration,
    pub calm_batch_size: usize,
    pub alert_batch_size: usize,
}

impl FlushPolicy {
    /// Same cadence and batch size regardless of alert state.
    ///
    /// Used for dense sample-rate feeds that flush at a fixed high frequency.
    #[must_use]
    pub const fn fixed(interval: Duration, batch_size: usize) -> Self {
        Self {
            calm_interval: interval,
            alert_interval: interval,
            calm_batch_size: batch_size,
            alert_batch_size: batch_size,
        }
    }

    #[must_use]
    pub const fn cadence(&self, mode: AlertMode) -> Duration {
        match mode {
            AlertMode::Calm => self.calm_interval,
            AlertMode::Alert => self.alert_interval,
        }
    }

    #[must_use]
    pub const fn batch_size(&self, mode: AlertMode) -> usize {
        match mode {
            AlertMode::Calm => self.calm_batch_size,
            AlertMode::Alert => self.alert_batch_size,
        }
    }
}

impl Default for FlushPolicy {
    fn default() -> Self {
        Self {
            calm_interval: Duration::from_millis(2000),
            alert_interval: Duration::from_millis(1000),
            calm_batch_size: 1024,
            alert_batch_size: 4096,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_mode_selects_faster_cadence_and_larger_batch() {
        let policy = FlushPolicy::default();

        assert_eq!(policy.cadence(AlertMode::Calm), Duration::from_secs(2));
        assert_eq!(policy.cadence(AlertMode::Alert), Duration::from_secs(1));
        assert!(policy.batch_size(AlertMode::Alert) > policy.batch_size(AlertMode::Calm));
    }

    #[test]
    fn fixed_policy_ignores_mode() {
        let policy = FlushPolicy::fixed(Duration::from_millis(50), 256);

        assert_eq!(
            policy.cadence(AlertMode::Calm),
            policy.cadence(AlertMode::Alert)
        );
        assert_eq!(policy.batch_size(AlertMode::Alert), 256);
    }

    #[test]
    fn mode_from_flag() {
        assert_eq!(AlertMode::from_flag(true), AlertMode::Alert);
        assert!(!AlertMode::from_flag(false).is_alert());
        assert_eq!(AlertMode::default().as_str(), "calm");
    }
}
