//! Realtime telemetry ingestion.
//!
//! ```text
//! stream ──▶ IngestBuffer ──(FlushScheduler tick)──▶ SampleWindow ──▶ snapshot()
//!   ▲                                                                    │
//!   └──────────── RetryState (bounded, fixed delay) ◀── close ───────────┘
//! ```
//!
//! [`TelemetryClient`] is the entry point. Each subscription runs as one
//! session task; samples reach the visible list only through a flush.

pub mod buffer;
mod client;
pub mod config;
pub mod policy;
pub mod retry;
pub mod scheduler;
mod session;
pub mod state;
pub mod window;

pub use buffer::IngestBuffer;
pub use client::TelemetryClient;
pub use config::TelemetryConfig;
pub use policy::{AlertMode, FlushPolicy};
pub use retry::{RetryDecision, RetryPolicy, RetryState};
pub use scheduler::FlushScheduler;
pub use session::{ExitReason, SessionExit, TEARDOWN_REASON};
pub use state::{IngestCounters, TelemetrySnapshot};
pub use window::{RetentionPolicy, SampleWindow};
