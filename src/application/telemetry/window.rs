//! Retention of the consumer-visible sample list.
//!
//! Retention is a time window relative to the wall clock at flush time,
//! backed by a hard count cap. Samples stay in arrival order; nothing is
//! re-sorted by timestamp, so near-simultaneous samples never swap places.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::domain::Sample;

/// Bounds applied to the visible sample list at every flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Samples with a timestamp older than `now - window` are dropped.
    pub window: Duration,
    /// Upper bound on the number of visible samples.
    pub max_samples: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(5),
            max_samples: 2048,
        }
    }
}

/// The visible sample list.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples: VecDeque<Sample>,
    policy: RetentionPolicy,
}

impl SampleWindow {
    #[must_use]
    pub fn new(policy: RetentionPolicy) -> Self {
        Self {
            samples: VecDeque::new(),
            policy,
        }
    }

    /// Append a flushed batch and apply retention as of `now`.
    ///
    /// Returns how many samples retention removed.
    pub fn extend(&mut self, batch: Vec<Sample>, now: DateTime<Utc>) -> usize {
        self.samples.extend(batch);
        self.retain(now)
    }

    /// Apply retention as of `now` without adding samples.
    pub fn retain(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.samples.len();

        // Window lengths beyond chrono's range disable the time bound.
        if let Some(cutoff) = TimeDelta::from_std(self.policy.window)
            .ok()
            .and_then(|window| now.checked_sub_signed(window))
        {
            self.samples.retain(|s| s.timestamp() >= cutoff);
        }

        let max = self.policy.max_samples.max(1);
        if self.samples.len() > max {
            let excess = self.samples.len() - max;
            self.samples.drain(..excess);
        }

        before - self.samples.len()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Sample> {
        self.samples.iter().cloned().collect()
    }

    #[must_use]
    pub const fn policy(&self) -> RetentionPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::domain::{patient, reading, reading_at};

    fn policy(window_secs: u64, max_samples: usize) -> RetentionPolicy {
        RetentionPolicy {
            window: Duration::from_secs(window_secs),
            max_samples,
        }
    }

    #[test]
    fn drops_samples_older_than_window() {
        let now = Utc::now();
        let p = patient(1);
        let mut window = SampleWindow::new(policy(5, 100));

        let removed = window.extend(
            vec![
                reading_at(p, 1.0, now - TimeDelta::seconds(10)),
                reading_at(p, 2.0, now - TimeDelta::seconds(4)),
                reading_at(p, 3.0, now),
            ],
            now,
        );

        assert_eq!(removed, 1);
        let kept: Vec<f64> = window
            .to_vec()
            .iter()
            .filter_map(Sample::primary_reading)
            .collect();
        assert_eq!(kept, vec![2.0, 3.0]);
    }

    #[test]
    fn count_cap_evicts_oldest_by_arrival() {
        let now = Utc::now();
        let p = patient(1);
        let mut window = SampleWindow::new(policy(60, 3));

        // Out-of-order timestamps must not be re-sorted.
        let batch = vec![
            reading_at(p, 1.0, now),
            reading_at(p, 2.0, now - TimeDelta::milliseconds(5)),
            reading_at(p, 3.0, now),
            reading_at(p, 4.0, now - TimeDelta::milliseconds(1)),
        ];
        window.extend(batch, now);

        let kept: Vec<f64> = window
            .to_vec()
            .iter()
            .filter_map(Sample::primary_reading)
            .collect();
        assert_eq!(kept, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn retain_expires_without_new_samples() {
        let start = Utc::now();
        let mut window = SampleWindow::new(policy(5, 100));
        window.extend(vec![reading_at(patient(1), 1.0, start)], start);

        assert_eq!(window.retain(start + TimeDelta::seconds(3)), 0);
        assert_eq!(window.retain(start + TimeDelta::seconds(6)), 1);
        assert!(window.is_empty());
    }

    #[test]
    fn long_running_stream_stays_bounded() {
        let p = patient(1);
        let mut window = SampleWindow::new(policy(5, 50));
        let start = Utc::now();

        for step in 0..1_000 {
            let now = start + TimeDelta::milliseconds(step * 20);
            window.extend(vec![reading_at(p, step as f64, now)], now);
            assert!(window.len() <= 50);
        }
        window.extend(vec![reading(p, 0.0)], Utc::now());
        assert!(window.len() <= 50);
    }
}
