//! Transport-agnostic telemetry domain.

pub mod error;
pub mod id;
pub mod sample;
pub mod stats;
pub mod status;

pub use id::PatientId;
pub use sample::Sample;
pub use stats::{RiskLevel, WindowStats};
pub use status::ConnectionStatus;
