//! Builders for domain primitives used across tests.
//!
//! Provides concise factory functions for [`PatientId`], [`Sample`] and raw
//! wire frames so tests focus on assertions rather than construction
//! boilerplate.

use chrono::{DateTime, Utc};

use crate::adapter::outbound::websocket::EegDataMessage;
use crate::domain::{PatientId, Sample};

/// Create a [`PatientId`]. Panics on non-positive ids.
pub fn patient(id: i64) -> PatientId {
    PatientId::try_new(id).expect("test patient id must be positive")
}

/// Single-channel sample stamped now.
pub fn reading(patient: PatientId, value: f64) -> Sample {
    reading_at(patient, value, Utc::now())
}

/// Single-channel sample with an explicit timestamp.
pub fn reading_at(patient: PatientId, value: f64, timestamp: DateTime<Utc>) -> Sample {
    Sample::try_new(patient, timestamp, vec![value]).expect("test readings must be finite")
}

/// Single-channel sample flagged by the upstream detector.
pub fn alert_reading(patient: PatientId, value: f64) -> Sample {
    reading(patient, value).with_alert(true)
}

/// `n` consecutive readings valued `1.0..=n`.
pub fn readings(patient: PatientId, n: usize) -> Vec<Sample> {
    (1..=n).map(|i| reading(patient, i as f64)).collect()
}

/// JSON text frame as the backend would send it.
pub fn frame(sample: &Sample) -> String {
    serde_json::to_string(&EegDataMessage::from(sample)).expect("message serializes")
}

/// First-channel values of `samples`, in order.
pub fn values(samples: &[Sample]) -> Vec<f64> {
    samples.iter().filter_map(Sample::primary_reading).collect()
}
