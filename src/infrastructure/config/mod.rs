//! Infrastructure configuration modules.

pub mod endpoint;
pub mod logging;
pub mod settings;
pub mod telemetry;
