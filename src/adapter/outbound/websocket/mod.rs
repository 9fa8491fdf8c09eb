//! Live EEG feed over WebSocket.

pub mod dto;
mod stream;

pub use dto::{decode_frame, EegDataMessage};
pub use stream::{patient_endpoint, WebSocketTelemetryStream};
