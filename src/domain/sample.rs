//! Telemetry samples.
//!
//! A [`Sample`] is one inbound EEG reading: a timestamp recorded by the
//! sender, a vector of channel readings and the upstream detector's alert
//! flag. Samples are immutable once built.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;

use super::error::DomainError;
use super::id::PatientId;

/// One timestamped unit of inbound telemetry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    patient: PatientId,
    timestamp: DateTime<Utc>,
    channels: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    voltage: Option<Vec<f64>>,
    alert: bool,
}

impl Sample {
    /// Build a sample without an alert flag or voltage trace.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NonFiniteReading`] if any channel reading is NaN
    /// or infinite.
    pub fn try_new(
        patient: PatientId,
        timestamp: DateTime<Utc>,
        channels: Vec<f64>,
    ) -> Result<Self, DomainError> {
        if let Some(channel) = channels.iter().position(|v| !v.is_finite()) {
            return Err(DomainError::NonFiniteReading { channel });
        }
        Ok(Self {
            patient,
            timestamp,
            channels,
            voltage: None,
            alert: false,
        })
    }

    /// Set the upstream alert flag.
    #[must_use]
    pub fn with_alert(mut self, alert: bool) -> Self {
        self.alert = alert;
        self
    }

    /// Attach the optional voltage trace.
    #[must_use]
    pub fn with_voltage(mut self, voltage: Option<Vec<f64>>) -> Self {
        self.voltage = voltage;
        self
    }

    #[must_use]
    pub const fn patient(&self) -> PatientId {
        self.patient
    }

    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Channel readings in sender order.
    #[must_use]
    pub fn channels(&self) -> &[f64] {
        &self.channels
    }

    /// First channel reading, the one charted by the dashboard.
    #[must_use]
    pub fn primary_reading(&self) -> Option<f64> {
        self.channels.first().copied()
    }

    #[must_use]
    pub fn voltage(&self) -> Option<&[f64]> {
        self.voltage.as_deref()
    }

    /// Whether the upstream detector classified this moment as anomalous.
    #[must_use]
    pub const fn is_alert(&self) -> bool {
        self.alert
    }
}

/// Parse an ISO-8601 timestamp as sent by the backend.
///
/// RFC 3339 strings with an offset are used as-is. The device simulator
/// emits naive local timestamps (`2024-05-01T10:00:00.123456`), which are
/// interpreted in the local timezone.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DomainError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|ts| ts.with_timezone(&Utc))
        .ok_or_else(|| DomainError::InvalidTimestamp {
            raw: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient() -> PatientId {
        PatientId::try_new(1).unwrap()
    }

    #[test]
    fn rejects_non_finite_readings() {
        let err = Sample::try_new(patient(), Utc::now(), vec![1.0, f64::NAN]).unwrap_err();
        assert_eq!(err, DomainError::NonFiniteReading { channel: 1 });
    }

    #[test]
    fn primary_reading_is_first_channel() {
        let sample = Sample::try_new(patient(), Utc::now(), vec![4.5, -2.0]).unwrap();
        assert_eq!(sample.primary_reading(), Some(4.5));

        let empty = Sample::try_new(patient(), Utc::now(), vec![]).unwrap();
        assert_eq!(empty.primary_reading(), None);
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        let ts = parse_timestamp("2024-05-01T10:00:00+02:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-05-01T08:00:00+00:00");
    }

    #[test]
    fn parses_naive_timestamp_as_local_time() {
        let raw = "2024-05-01T10:00:00.250000";
        let ts = parse_timestamp(raw).unwrap();
        let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").unwrap();
        let expected = Local.from_local_datetime(&naive).earliest().unwrap();
        assert_eq!(ts, expected.with_timezone(&Utc));
        assert_eq!(ts.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn rejects_garbage_timestamp() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(DomainError::InvalidTimestamp { .. })
        ));
    }
}
