//! WebSocket implementation of [`TelemetryStream`].
//!
//! # Connection Lifecycle
//!
//! 1. **Connect**: open `<base_url>/<patient_id>` via `connect()`
//! 2. **Message Loop**: `next_event()` decodes text frames into samples,
//!    answers pings, and reports the close kind when the connection ends
//! 3. **Close**: `close()` sends a normal (1000) close frame
//!
//! This type does NOT reconnect on its own. The telemetry session owns the
//! retry policy and calls `connect()` again on the same instance.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};
use url::Url;

use super::dto::decode_frame;
use crate::domain::PatientId;
use crate::error::{Error, Result};
use crate::port::{CloseKind, StreamEvent, TelemetryStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Close code used when the server closes without a status.
const CLOSE_NO_STATUS: u16 = 1005;

/// Build the per-patient stream endpoint by appending the id as the last
/// path segment of `base`.
///
/// # Errors
///
/// Returns an error if `base` cannot carry a path (e.g. `data:` URLs).
pub fn patient_endpoint(base: &Url, patient: PatientId) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| Error::Parse(format!("URL '{base}' cannot have path segments")))?
        .pop_if_empty()
        .push(&patient.to_string());
    Ok(url)
}

/// Live EEG feed over WebSocket.
pub struct WebSocketTelemetryStream {
    base_url: Url,
    ws: Option<WsStream>,
}

impl WebSocketTelemetryStream {
    /// Create a disconnected stream against `base_url`.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self { base_url, ws: None }
    }

    /// Whether a connection is currently open.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.ws.is_some()
    }
}

#[async_trait]
impl TelemetryStream for WebSocketTelemetryStream {
    async fn connect(&mut self, patient: PatientId) -> Result<()> {
        // Dropping the old stream closes the socket without a handshake.
        self.ws = None;

        let url = patient_endpoint(&self.base_url, patient)?;
        info!(url = %url, patient = %patient, "Connecting to WebSocket");

        let (ws_stream, response) = connect_async(url.as_str()).await?;
        info!(status = %response.status(), patient = %patient, "WebSocket connected");

        self.ws = Some(ws_stream);
        Ok(())
    }

    async fn next_event(&mut self) -> Option<StreamEvent> {
        let ws = self.ws.as_mut()?;

        loop {
            let Some(frame) = ws.next().await else {
                warn!("WebSocket stream ended without close frame");
                self.ws = None;
                return None;
            };

            match frame {
                Ok(Message::Text(text)) => {
                    trace!(bytes = text.len(), "Received WebSocket text frame");
                    return Some(decode_frame(&text));
                }
                Ok(Message::Binary(data)) => {
                    trace!(bytes = data.len(), "Received WebSocket binary frame");
                    return Some(match std::str::from_utf8(&data) {
                        Ok(text) => decode_frame(text),
                        Err(e) => StreamEvent::Malformed {
                            reason: format!("binary frame is not UTF-8: {e}"),
                        },
                    });
                }
                Ok(Message::Ping(data)) => {
                    trace!("Received WebSocket ping");
                    if let Err(e) = ws.send(Message::Pong(data)).await {
                        self.ws = None;
                        return Some(StreamEvent::Closed(CloseKind::abnormal(format!(
                            "failed to send pong: {e}"
                        ))));
                    }
                }
                Ok(Message::Close(frame)) => {
                    info!(frame = ?frame, "WebSocket closed by server");
                    self.ws = None;
                    let kind = match frame {
                        Some(f) => CloseKind::from_code(u16::from(f.code), f.reason.to_string()),
                        None => CloseKind::from_code(CLOSE_NO_STATUS, ""),
                    };
                    return Some(StreamEvent::Closed(kind));
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "WebSocket error");
                    self.ws = None;
                    return Some(StreamEvent::Closed(CloseKind::abnormal(e.to_string())));
                }
            }
        }
    }

    async fn close(&mut self, reason: &str) -> Result<()> {
        let Some(mut ws) = self.ws.take() else {
            return Ok(());
        };

        debug!(reason, "Closing WebSocket");
        ws.close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: reason.to_owned().into(),
        }))
        .await?;
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "websocket"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    fn patient(id: i64) -> PatientId {
        PatientId::try_new(id).unwrap()
    }

    #[test]
    fn endpoint_appends_patient_segment() {
        let url = patient_endpoint(&base("ws://localhost:8000/api/v1/ws/live_eeg"), patient(7));
        assert_eq!(
            url.unwrap().as_str(),
            "ws://localhost:8000/api/v1/ws/live_eeg/7"
        );
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let url = patient_endpoint(&base("wss://eeg.example/live/"), patient(42));
        assert_eq!(url.unwrap().as_str(), "wss://eeg.example/live/42");
    }

    #[test]
    fn endpoint_rejects_cannot_be_a_base_urls() {
        assert!(patient_endpoint(&base("data:text/plain,hi"), patient(1)).is_err());
    }

    #[tokio::test]
    async fn new_stream_is_disconnected() {
        let mut stream = WebSocketTelemetryStream::new(base("ws://localhost:1/live"));

        assert!(!stream.is_connected());
        assert_eq!(stream.transport_name(), "websocket");
        assert!(stream.next_event().await.is_none());
        assert!(stream.close("noop").await.is_ok());
    }

    #[tokio::test]
    async fn connect_failure_surfaces_error() {
        // Port 9 (discard) is almost never listening for WebSocket upgrades.
        let mut stream = WebSocketTelemetryStream::new(base("ws://127.0.0.1:9/live"));
        assert!(stream.connect(patient(1)).await.is_err());
        assert!(!stream.is_connected());
    }
}
