//! Stream factory for the live EEG feed.

use std::sync::Arc;

use tracing::info;

use crate::adapter::outbound::websocket::WebSocketTelemetryStream;
use crate::error::Result;
use crate::infrastructure::config::endpoint::EndpointConfig;
use crate::port::{StreamFactory, TelemetryStream};

/// Build a factory handing out WebSocket streams against the configured
/// base URL. Each subscription gets its own stream.
///
/// # Errors
///
/// Returns an error if `ws_url` is not a valid `ws`/`wss` URL.
pub fn build_stream_factory(endpoint: &EndpointConfig) -> Result<StreamFactory> {
    let base = endpoint.stream_url()?;
    info!(url = %base, "Using WebSocket telemetry stream");
    Ok(Arc::new(move || -> Box<dyn TelemetryStream> {
        Box::new(WebSocketTelemetryStream::new(base.clone()))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_websocket_streams() {
        let factory = build_stream_factory(&EndpointConfig::default()).unwrap();
        let stream = factory();
        assert_eq!(stream.transport_name(), "websocket");
    }

    #[test]
    fn rejects_invalid_url() {
        let endpoint = EndpointConfig {
            ws_url: "not a url".into(),
            ..EndpointConfig::default()
        };
        assert!(build_stream_factory(&endpoint).is_err());
    }
}
