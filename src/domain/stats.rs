//! Summary statistics over the visible sample window.
//!
//! Computed over the primary (first) channel of each sample, which is the
//! trace the monitoring views chart.

use std::fmt;

use serde::Serialize;

use super::sample::Sample;

/// Standard deviation above which activity is flagged as moderate risk.
pub const MODERATE_STD_DEV: f64 = 30.0;

/// Descriptive statistics for one window of samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WindowStats {
    /// Samples that contributed a primary reading.
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Population variance.
    pub variance: f64,
    pub std_dev: f64,
}

impl WindowStats {
    /// Compute statistics over the primary readings of `samples`.
    ///
    /// Samples without channel data are skipped. An empty window yields all
    /// zeros.
    #[must_use]
    pub fn from_samples<'a>(samples: impl IntoIterator<Item = &'a Sample>) -> Self {
        let readings: Vec<f64> = samples
            .into_iter()
            .filter_map(Sample::primary_reading)
            .collect();

        if readings.is_empty() {
            return Self::default();
        }

        let count = readings.len();
        let mean = readings.iter().sum::<f64>() / count as f64;
        let min = readings.iter().copied().fold(f64::INFINITY, f64::min);
        let max = readings.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let variance = readings.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

        Self {
            count,
            mean,
            min,
            max,
            variance,
            std_dev: variance.sqrt(),
        }
    }
}

/// Coarse risk classification shown next to the live trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Good,
    Moderate,
    Critical,
}

impl RiskLevel {
    /// Classify from the upstream alert flag and window variability.
    ///
    /// The alert flag always wins; variability alone can only raise the
    /// level to `Moderate`.
    #[must_use]
    pub fn assess(alert: bool, stats: &WindowStats) -> Self {
        if alert {
            Self::Critical
        } else if stats.std_dev > MODERATE_STD_DEV {
            Self::Moderate
        } else {
            Self::Good
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Good => "good",
            Self::Moderate => "moderate",
            Self::Critical => "critical",
        })
    }
}
