//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!     ┌──────────────┤  Domain + Port          │
//!     │              └─────────────────────────┘
//!     ▼
//! ┌───────────┐
//! │ WebSocket │
//! │  Adapter  │
//! └───────────┘
//! ```
//!
//! # Available Ports
//!
//! - [`TelemetryStream`] - live per-patient telemetry feed

pub mod outbound;

pub use outbound::stream::{
    CloseKind, StreamEvent, StreamFactory, TelemetryStream, CLOSE_ABNORMAL, CLOSE_NORMAL,
};
