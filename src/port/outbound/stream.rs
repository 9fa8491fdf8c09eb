//! Telemetry stream port.
//!
//! The session driver talks to the backend only through [`TelemetryStream`].
//! The WebSocket adapter implements it for production and the testkit
//! provides scripted implementations.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{PatientId, Sample};
use crate::error::Error;

/// Close code sent and recognised as an intentional, non-error close.
pub const CLOSE_NORMAL: u16 = 1000;

/// Close code reported when the connection dropped without a close frame.
pub const CLOSE_ABNORMAL: u16 = 1006;

/// How a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseKind {
    /// Intentional close (code 1000). Never retried.
    Clean,
    /// Network drop, protocol error or a non-normal close code.
    Error {
        /// Close code from the frame, or [`CLOSE_ABNORMAL`] when none was received.
        code: u16,
        /// Human-readable reason, possibly empty.
        reason: String,
    },
}

impl CloseKind {
    /// Classify a close frame code.
    #[must_use]
    pub fn from_code(code: u16, reason: impl Into<String>) -> Self {
        if code == CLOSE_NORMAL {
            Self::Clean
        } else {
            Self::Error {
                code,
                reason: reason.into(),
            }
        }
    }

    /// Connection dropped with no close handshake.
    #[must_use]
    pub fn abnormal(reason: impl Into<String>) -> Self {
        Self::Error {
            code: CLOSE_ABNORMAL,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub const fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }
}

/// One decoded inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A well-formed sample.
    Sample(Sample),
    /// A payload that could not be decoded. The stream stays open.
    Malformed {
        /// Decoder error description.
        reason: String,
    },
    /// The connection ended.
    Closed(CloseKind),
}

/// A live telemetry connection for one subscription key.
///
/// One instance is created per subscription session; [`connect`](Self::connect)
/// is called again on the same instance for each reconnect attempt.
#[async_trait]
pub trait TelemetryStream: Send {
    /// Open the stream for `patient`. Replaces any previous connection.
    async fn connect(&mut self, patient: PatientId) -> Result<(), Error>;

    /// Receive the next event.
    ///
    /// Must be cancel-safe: the session races it against its timers.
    /// Returns `None` if the connection ended without a close frame.
    async fn next_event(&mut self) -> Option<StreamEvent>;

    /// Close the connection with [`CLOSE_NORMAL`]. No-op when not connected.
    async fn close(&mut self, reason: &str) -> Result<(), Error>;

    /// Transport name for logging.
    fn transport_name(&self) -> &'static str;
}

#[async_trait]
impl TelemetryStream for Box<dyn TelemetryStream> {
    async fn connect(&mut self, patient: PatientId) -> Result<(), Error> {
        (**self).connect(patient).await
    }

    async fn next_event(&mut self) -> Option<StreamEvent> {
        (**self).next_event().await
    }

    async fn close(&mut self, reason: &str) -> Result<(), Error> {
        (**self).close(reason).await
    }

    fn transport_name(&self) -> &'static str {
        (**self).transport_name()
    }
}

/// Factory creating one stream per subscription session.
pub type StreamFactory = Arc<dyn Fn() -> Box<dyn TelemetryStream> + Send + Sync>;
