//! Wire format of the live EEG feed.
//!
//! The backend pushes one JSON object per reading:
//! ```json
//! {"patient_id": 1, "timestamp": "2024-05-01T10:00:00.123456", "channel_data": [12.5, -3.1], "seizure_detected": false}
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::domain::sample::parse_timestamp;
use crate::domain::{PatientId, Sample};
use crate::port::StreamEvent;

/// One reading as received over the WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EegDataMessage {
    #[serde(alias = "subscription_key")]
    pub patient_id: i64,
    pub timestamp: String,
    pub channel_data: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seizure_detected: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage: Option<Vec<f64>>,
}

impl EegDataMessage {
    /// Validate and convert into a domain [`Sample`].
    pub fn into_sample(self) -> Result<Sample, DomainError> {
        let patient = PatientId::try_new(self.patient_id)?;
        let timestamp = parse_timestamp(&self.timestamp)?;
        Ok(Sample::try_new(patient, timestamp, self.channel_data)?
            .with_alert(self.seizure_detected.unwrap_or(false))
            .with_voltage(self.voltage))
    }
}

impl From<&Sample> for EegDataMessage {
    fn from(sample: &Sample) -> Self {
        Self {
            patient_id: sample.patient().get(),
            timestamp: sample.timestamp().to_rfc3339(),
            channel_data: sample.channels().to_vec(),
            seizure_detected: Some(sample.is_alert()),
            voltage: sample.voltage().map(<[f64]>::to_vec),
        }
    }
}

/// Decode one text frame into a stream event.
///
/// Never fails: anything that is not a valid reading becomes
/// [`StreamEvent::Malformed`] so the connection survives bad payloads.
#[must_use]
pub fn decode_frame(text: &str) -> StreamEvent {
    let message = match serde_json::from_str::<EegDataMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            return StreamEvent::Malformed {
                reason: e.to_string(),
            }
        }
    };

    match message.into_sample() {
        Ok(sample) => StreamEvent::Sample(sample),
        Err(e) => StreamEvent::Malformed {
            reason: e.to_string(),
        },
    }
}
