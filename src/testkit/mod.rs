//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`stream`] - Mock [`TelemetryStream`](crate::port::TelemetryStream)
//!   implementations: `ScriptedStream`, `ChannelStream`.
//! - [`domain`] - Builders for patients, samples and wire frames.
//! - [`config`] - Canonical test configurations with short timings.

pub mod config;
pub mod domain;
pub mod stream;
