//! Mock [`TelemetryStream`] implementations for testing.
//!
//! Two mock stream types for different testing needs:
//!
//! - [`ScriptedStream`] - Pre-loaded connect results and events.
//!   Best for: retry budget, reconnection and malformed-payload tests.
//!
//! - [`ChannelStream`] - Channel-backed stream with external control handle.
//!   Best for: tests needing precise, on-demand event delivery.
//!
//! Both pend forever in `next_event()` while disconnected or out of events,
//! like a quiet live connection.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::adapter::outbound::websocket::decode_frame;
use crate::domain::{PatientId, Sample};
use crate::error::{Error, Result};
use crate::port::{CloseKind, StreamEvent, StreamFactory, TelemetryStream};

/// Connection refused error for scripted connect results.
pub fn refused() -> Error {
    Error::Connection("connection refused".to_string())
}

/// Non-clean close event with code 1011.
pub fn server_error() -> StreamEvent {
    StreamEvent::Closed(CloseKind::from_code(1011, "internal error"))
}

/// Clean close event with code 1000.
pub fn clean_close() -> StreamEvent {
    StreamEvent::Closed(CloseKind::Clean)
}

/// Shared call counters of a mock stream.
#[derive(Debug, Clone, Default)]
pub struct StreamProbe {
    connects: Arc<AtomicU32>,
    patients: Arc<Mutex<Vec<PatientId>>>,
    closes: Arc<Mutex<Vec<String>>>,
}

impl StreamProbe {
    /// How many times `connect()` was called.
    pub fn connect_count(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }

    /// Patients passed to `connect()`, in call order.
    pub fn connected_patients(&self) -> Vec<PatientId> {
        self.patients.lock().unwrap().clone()
    }

    /// Reasons passed to `close()` while connected.
    pub fn close_reasons(&self) -> Vec<String> {
        self.closes.lock().unwrap().clone()
    }

    fn record_connect(&self, patient: PatientId) {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.patients.lock().unwrap().push(patient);
    }

    fn record_close(&self, reason: &str) {
        self.closes.lock().unwrap().push(reason.to_string());
    }
}

// ---------------------------------------------------------------------------
// ScriptedStream
// ---------------------------------------------------------------------------

/// A mock stream with scripted connect results and a fixed event queue.
///
/// Each call to `connect()` pops the next result (defaults to `Ok(())` when
/// exhausted, or pends forever after [`with_stalled_handshakes`]). Events
/// are delivered in order while connected; a `Closed`
/// event disconnects the stream and later events wait for the next
/// successful `connect()`.
///
/// [`with_stalled_handshakes`]: Self::with_stalled_handshakes
pub struct ScriptedStream {
    connect_results: VecDeque<Result<()>>,
    events: VecDeque<StreamEvent>,
    stall_when_exhausted: bool,
    connected: bool,
    probe: StreamProbe,
}

impl ScriptedStream {
    pub fn new() -> Self {
        Self {
            connect_results: VecDeque::new(),
            events: VecDeque::new(),
            stall_when_exhausted: false,
            connected: false,
            probe: StreamProbe::default(),
        }
    }

    pub fn with_connect_results(mut self, results: Vec<Result<()>>) -> Self {
        self.connect_results = results.into();
        self
    }

    pub fn with_events(mut self, events: Vec<StreamEvent>) -> Self {
        self.events = events.into();
        self
    }

    /// Hang every `connect()` once the scripted results run out.
    pub fn with_stalled_handshakes(mut self) -> Self {
        self.stall_when_exhausted = true;
        self
    }

    /// Shared counters that stay readable after the stream is boxed.
    pub fn probe(&self) -> StreamProbe {
        self.probe.clone()
    }
}

impl Default for ScriptedStream {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TelemetryStream for ScriptedStream {
    async fn connect(&mut self, patient: PatientId) -> Result<()> {
        self.probe.record_connect(patient);
        let result = match self.connect_results.pop_front() {
            Some(result) => result,
            None if self.stall_when_exhausted => std::future::pending().await,
            None => Ok(()),
        };
        self.connected = result.is_ok();
        result
    }

    async fn next_event(&mut self) -> Option<StreamEvent> {
        if self.connected {
            if let Some(event) = self.events.pop_front() {
                if matches!(event, StreamEvent::Closed(_)) {
                    self.connected = false;
                }
                return Some(event);
            }
        }
        std::future::pending().await
    }

    async fn close(&mut self, reason: &str) -> Result<()> {
        if self.connected {
            self.connected = false;
            self.probe.record_close(reason);
        }
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// ChannelStream
// ---------------------------------------------------------------------------

/// A mock stream controlled externally via a [`ChannelStreamHandle`].
///
/// Events sent through the handle are read by the session via
/// `next_event()`. No real network I/O.
pub struct ChannelStream {
    event_rx: mpsc::UnboundedReceiver<StreamEvent>,
    connect_results: Arc<Mutex<VecDeque<Result<()>>>>,
    connected: bool,
    probe: StreamProbe,
}

/// Control handle for a [`ChannelStream`].
#[derive(Clone)]
pub struct ChannelStreamHandle {
    event_tx: mpsc::UnboundedSender<StreamEvent>,
    connect_results: Arc<Mutex<VecDeque<Result<()>>>>,
    probe: StreamProbe,
}

impl ChannelStreamHandle {
    /// Send a raw event to the stream.
    pub fn send(&self, event: StreamEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Send a decoded sample.
    pub fn send_sample(&self, sample: Sample) {
        self.send(StreamEvent::Sample(sample));
    }

    /// Send a text frame through the wire decoder.
    pub fn send_text(&self, text: &str) {
        self.send(decode_frame(text));
    }

    /// Close the connection from the server side with `code`.
    pub fn drop_connection(&self, code: u16) {
        self.send(StreamEvent::Closed(CloseKind::from_code(code, "dropped")));
    }

    /// Queue results for upcoming `connect()` calls.
    pub fn push_connect_results(&self, results: impl IntoIterator<Item = Result<()>>) {
        self.connect_results.lock().unwrap().extend(results);
    }

    pub fn probe(&self) -> &StreamProbe {
        &self.probe
    }
}

/// Create a [`ChannelStream`] and its control [`ChannelStreamHandle`].
pub fn channel_stream() -> (ChannelStream, ChannelStreamHandle) {
    let (tx, rx) = mpsc::unbounded_channel();
    let results = Arc::new(Mutex::new(VecDeque::new()));
    let probe = StreamProbe::default();
    (
        ChannelStream {
            event_rx: rx,
            connect_results: Arc::clone(&results),
            connected: false,
            probe: probe.clone(),
        },
        ChannelStreamHandle {
            event_tx: tx,
            connect_results: results,
            probe,
        },
    )
}

#[async_trait]
impl TelemetryStream for ChannelStream {
    async fn connect(&mut self, patient: PatientId) -> Result<()> {
        self.probe.record_connect(patient);
        let next = self.connect_results.lock().unwrap().pop_front();
        let result = next.unwrap_or(Ok(()));
        self.connected = result.is_ok();
        result
    }

    async fn next_event(&mut self) -> Option<StreamEvent> {
        if !self.connected {
            return std::future::pending().await;
        }
        let event = self.event_rx.recv().await?;
        if matches!(event, StreamEvent::Closed(_)) {
            self.connected = false;
        }
        Some(event)
    }

    async fn close(&mut self, reason: &str) -> Result<()> {
        if self.connected {
            self.connected = false;
            self.probe.record_close(reason);
        }
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// Factories
// ---------------------------------------------------------------------------

/// Factory handing out `streams` in order, then idle [`ScriptedStream`]s.
pub fn queued_factory(streams: Vec<Box<dyn TelemetryStream>>) -> StreamFactory {
    let queue = Mutex::new(VecDeque::from(streams));
    Arc::new(move || -> Box<dyn TelemetryStream> {
        match queue.lock().unwrap().pop_front() {
            Some(stream) => stream,
            None => Box::new(ScriptedStream::new()),
        }
    })
}

/// Factory for a single [`ScriptedStream`].
pub fn scripted_factory(stream: ScriptedStream) -> StreamFactory {
    queued_factory(vec![Box::new(stream)])
}

/// Factory for a single [`ChannelStream`].
pub fn channel_factory(stream: ChannelStream) -> StreamFactory {
    queued_factory(vec![Box::new(stream)])
}
