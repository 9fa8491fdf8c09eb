//! Outbound adapters (driven side).

pub mod websocket;
