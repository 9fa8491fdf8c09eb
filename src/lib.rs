//! eegwatch - realtime EEG telemetry ingestion.
//!
//! Subscribes to a per-patient live feed over WebSocket, buffers inbound
//! samples and publishes them to consumers in bounded batches on an adaptive
//! cadence: fast while the upstream detector flags the stream, slow when
//! calm.
//!
//! # Architecture
//!
//! - [`domain`] - Patient ids, samples, connection status, window statistics
//! - [`port`] - The [`TelemetryStream`](port::TelemetryStream) seam
//! - [`adapter`] - WebSocket stream and the CLI
//! - [`application`] - Buffer, flush scheduler, retry policy, session driver
//!   and [`TelemetryClient`](application::telemetry::TelemetryClient)
//! - [`infrastructure`] - TOML configuration, logging, factories
//!
//! # Example
//!
//! ```no_run
//! use eegwatch::application::telemetry::TelemetryClient;
//! use eegwatch::domain::PatientId;
//! use eegwatch::infrastructure::config::settings::Config;
//! use eegwatch::infrastructure::factory::stream::build_stream_factory;
//!
//! # async fn run() -> eegwatch::error::Result<()> {
//! let config = Config::load("config.toml")?;
//! let factory = build_stream_factory(&config.endpoint)?;
//! let mut client = TelemetryClient::new(config.telemetry_config(), factory)?;
//!
//! client.update(Some(PatientId::try_new(7)?), true).await;
//! let mut changes = client.changes();
//! while changes.changed().await.is_ok() {
//!     println!("{} samples, {}", client.samples().len(), client.status());
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
