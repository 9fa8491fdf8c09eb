//! Domain validation errors for core domain types.
//!
//! These errors are returned by `try_new` constructors and parsers that
//! validate inbound telemetry before it becomes a [`Sample`](super::sample::Sample).
//!
//! # Examples
//!
//! ```
//! use eegwatch::domain::error::DomainError;
//! use eegwatch::domain::id::PatientId;
//!
//! assert!(matches!(
//!     PatientId::try_new(0),
//!     Err(DomainError::NonPositivePatientId { id: 0 })
//! ));
//! ```

use thiserror::Error;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Patient identifiers are positive database keys.
    #[error("patient id must be positive, got {id}")]
    NonPositivePatientId {
        /// The rejected identifier.
        id: i64,
    },

    /// Timestamp was not ISO-8601 (with or without offset).
    #[error("invalid timestamp '{raw}'")]
    InvalidTimestamp {
        /// The raw timestamp string as received.
        raw: String,
    },

    /// Channel readings must be finite numbers.
    #[error("channel {channel} reading is not finite")]
    NonFiniteReading {
        /// Zero-based channel index.
        channel: usize,
    },
}
