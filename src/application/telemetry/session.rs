//! Driver task for one subscription.
//!
//! A session owns the stream, the ingest buffer, the flush scheduler and the
//! retry counter for exactly one patient. Its event loop interleaves stream
//! events, flush ticks, the reconnect timer and the pending handshake; each
//! handler runs to completion before the next event is taken. The flush
//! timer keeps ticking in every phase once the first connect succeeds.
//!
//! ```text
//! Connecting ──ok──▶ Connected ──clean close──▶ Closed
//!     ▲   │              │
//!     │   └──err──┐      └──error close──┐
//!     │           ▼                      ▼
//!     └──delay── Waiting ◀──budget left── failure ──budget spent──▶ Failed
//! ```

use std::pin::Pin;

use chrono::Utc;
use futures_util::future::BoxFuture;
use tokio::sync::oneshot;
use tokio::time::{sleep, Instant, Sleep};
use tracing::{debug, error, info, trace, warn};

use super::buffer::IngestBuffer;
use super::config::TelemetryConfig;
use super::policy::{AlertMode, FlushPolicy};
use super::retry::{RetryDecision, RetryState};
use super::scheduler::FlushScheduler;
use super::state::{IngestCounters, StateWriter};
use crate::domain::{ConnectionStatus, PatientId, Sample};
use crate::error::Error;
use crate::port::{CloseKind, StreamEvent, TelemetryStream};

/// Reason sent with the normal close frame on teardown.
pub const TEARDOWN_REASON: &str = "subscription closed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Connecting,
    Connected,
    Waiting,
    Closed,
    Failed,
}

impl Phase {
    const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }
}

/// Why a session loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The owning client asked the session to stop.
    Shutdown,
    /// A newer subscription took over the shared state.
    Superseded,
    /// The server closed the stream cleanly and the buffer was flushed.
    ClosedClean,
    /// The retry budget ran out and the buffer was flushed.
    Failed,
}

/// Result of a finished session, after teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionExit {
    pub reason: ExitReason,
    /// Samples left in the ingest buffer after teardown.
    pub buffered: usize,
    pub counters: IngestCounters,
}

/// In-flight `connect()`; owns the stream until the handshake resolves.
type Handshake = BoxFuture<'static, (Box<dyn TelemetryStream>, Result<(), Error>)>;

fn handshake(mut stream: Box<dyn TelemetryStream>, patient: PatientId) -> Handshake {
    Box::pin(async move {
        let result = stream.connect(patient).await;
        (stream, result)
    })
}

enum Step {
    Shutdown,
    Connect(Box<dyn TelemetryStream>, Result<(), Error>),
    Event(Option<StreamEvent>),
    Tick(Instant),
    RetryDue,
}

/// One subscription's connection manager and flush loop.
pub(crate) struct Session {
    patient: PatientId,
    transport: &'static str,
    /// `None` while a handshake owns the stream.
    stream: Option<Box<dyn TelemetryStream>>,
    handshake: Option<Handshake>,
    buffer: IngestBuffer,
    scheduler: FlushScheduler,
    retry: RetryState,
    policy: FlushPolicy,
    reconnect: Option<Pin<Box<Sleep>>>,
    counters: IngestCounters,
    state: StateWriter,
    phase: Phase,
}

impl Session {
    pub(crate) fn new(
        patient: PatientId,
        stream: Box<dyn TelemetryStream>,
        config: &TelemetryConfig,
        state: StateWriter,
    ) -> Self {
        Self {
            patient,
            transport: stream.transport_name(),
            stream: Some(stream),
            handshake: None,
            buffer: IngestBuffer::new(config.buffer_capacity),
            scheduler: FlushScheduler::new(config.flush.cadence(AlertMode::Calm)),
            retry: RetryState::new(config.retry),
            policy: config.flush,
            reconnect: None,
            counters: IngestCounters::default(),
            state,
            phase: Phase::Connecting,
        }
    }

    /// Drive the subscription until shutdown, supersession or a terminal
    /// close, then tear it down.
    pub(crate) async fn run(mut self, mut shutdown: oneshot::Receiver<()>) -> SessionExit {
        info!(
            patient = %self.patient,
            transport = self.transport,
            "Telemetry session started"
        );

        let reason = loop {
            if self.phase.is_terminal() && self.buffer.is_empty() {
                break if self.phase == Phase::Failed {
                    ExitReason::Failed
                } else {
                    ExitReason::ClosedClean
                };
            }

            let step = match self.phase {
                Phase::Connecting => {
                    if self.handshake.is_none() {
                        let patient = self.patient;
                        self.handshake = self.stream.take().map(|s| handshake(s, patient));
                    }
                    match self.handshake.as_mut() {
                        Some(pending) => tokio::select! {
                            biased;
                            _ = &mut shutdown => Step::Shutdown,
                            at = self.scheduler.tick() => Step::Tick(at),
                            (stream, result) = pending => Step::Connect(stream, result),
                        },
                        None => {
                            error!(patient = %self.patient, "No stream available to connect");
                            break ExitReason::Failed;
                        }
                    }
                }
                Phase::Connected => match self.stream.as_mut() {
                    Some(stream) => tokio::select! {
                        biased;
                        _ = &mut shutdown => Step::Shutdown,
                        at = self.scheduler.tick() => Step::Tick(at),
                        event = stream.next_event() => Step::Event(event),
                    },
                    None => Step::Event(None),
                },
                Phase::Waiting => match self.reconnect.as_mut() {
                    Some(delay) => tokio::select! {
                        biased;
                        _ = &mut shutdown => Step::Shutdown,
                        at = self.scheduler.tick() => Step::Tick(at),
                        () = delay.as_mut() => Step::RetryDue,
                    },
                    None => Step::RetryDue,
                },
                Phase::Closed | Phase::Failed => tokio::select! {
                    biased;
                    _ = &mut shutdown => Step::Shutdown,
                    at = self.scheduler.tick() => Step::Tick(at),
                },
            };

            let current = match step {
                Step::Shutdown => break ExitReason::Shutdown,
                Step::Connect(stream, result) => {
                    self.handshake = None;
                    self.stream = Some(stream);
                    self.on_connect(result)
                }
                Step::Event(event) => self.on_event(event),
                Step::Tick(at) => self.on_tick(at),
                Step::RetryDue => self.on_retry_due(),
            };
            if !current {
                break ExitReason::Superseded;
            }
        };

        self.teardown().await;

        let exit = SessionExit {
            reason,
            buffered: self.buffer.len(),
            counters: self.counters,
        };
        info!(patient = %self.patient, reason = ?exit.reason, "Telemetry session ended");
        exit
    }

    /// Ordered teardown: reconnect timer and pending handshake, flush timer,
    /// clean close, buffer.
    async fn teardown(&mut self) {
        self.reconnect = None;
        self.handshake = None;
        self.scheduler.cancel();
        if let Some(stream) = self.stream.as_mut() {
            if let Err(e) = stream.close(TEARDOWN_REASON).await {
                debug!(patient = %self.patient, error = %e, "Close during teardown failed");
            }
        }
        self.buffer.clear();
    }

    fn on_connect(&mut self, result: Result<(), Error>) -> bool {
        match result {
            Ok(()) => {
                info!(patient = %self.patient, "Telemetry stream connected");
                self.retry.reset();
                self.phase = Phase::Connected;
                self.scheduler.start();
                self.state.apply(|s| {
                    s.status = ConnectionStatus::Connected;
                    s.last_error = None;
                    s.reconnect_attempts = 0;
                })
            }
            Err(e) => self.on_failure(&format!("connect failed: {e}")),
        }
    }

    fn on_event(&mut self, event: Option<StreamEvent>) -> bool {
        match event {
            Some(StreamEvent::Sample(sample)) => {
                self.ingest(sample);
                true
            }
            Some(StreamEvent::Malformed { reason }) => {
                self.counters.malformed += 1;
                warn!(patient = %self.patient, reason = %reason, "Dropping malformed message");
                true
            }
            Some(StreamEvent::Closed(kind)) => self.on_closed(kind),
            None => self.on_closed(CloseKind::abnormal("stream ended without close frame")),
        }
    }

    fn ingest(&mut self, sample: Sample) {
        if sample.patient() != self.patient {
            self.counters.mismatched += 1;
            debug!(
                patient = %self.patient,
                received = %sample.patient(),
                "Dropping sample for another patient"
            );
            return;
        }

        trace!(patient = %self.patient, alert = sample.is_alert(), "Buffered sample");
        self.counters.received += 1;
        if self.buffer.push(sample).is_some() {
            self.counters.evicted += 1;
        }
    }

    fn on_closed(&mut self, kind: CloseKind) -> bool {
        match kind {
            CloseKind::Clean => {
                info!(patient = %self.patient, "Telemetry stream closed cleanly");
                self.phase = Phase::Closed;
                let counters = self.counters;
                self.state.apply(|s| {
                    s.status = ConnectionStatus::Disconnected;
                    s.last_error = None;
                    s.counters = counters;
                })
            }
            CloseKind::Error { code, reason } => {
                self.on_failure(&format!("connection closed (code {code}): {reason}"))
            }
        }
    }

    fn on_failure(&mut self, cause: &str) -> bool {
        let max = self.retry.policy().max_attempts;
        let counters = self.counters;
        match self.retry.record_failure() {
            RetryDecision::Retry { attempt, delay } => {
                warn!(
                    patient = %self.patient,
                    attempt,
                    max_attempts = max,
                    delay_ms = delay.as_millis() as u64,
                    cause,
                    "Telemetry stream lost, scheduling reconnect"
                );
                self.phase = Phase::Waiting;
                self.reconnect = Some(Box::pin(sleep(delay)));
                self.state.apply(|s| {
                    s.status = ConnectionStatus::Disconnected;
                    s.last_error = Some(format!("reconnecting (attempt {attempt}/{max})"));
                    s.reconnect_attempts = attempt;
                    s.counters = counters;
                })
            }
            RetryDecision::GiveUp { attempts } => {
                error!(
                    patient = %self.patient,
                    attempts,
                    cause,
                    "Telemetry stream failed, giving up"
                );
                self.phase = Phase::Failed;
                self.state.apply(|s| {
                    s.status = ConnectionStatus::Failed;
                    s.last_error = Some(format!(
                        "failed to connect after {attempts} attempts; re-enable the subscription to retry"
                    ));
                    s.reconnect_attempts = attempts;
                    s.counters = counters;
                })
            }
        }
    }

    fn on_retry_due(&mut self) -> bool {
        self.reconnect = None;
        self.phase = Phase::Connecting;
        debug!(patient = %self.patient, attempt = self.retry.failures(), "Reconnecting");
        self.state.apply(|s| s.status = ConnectionStatus::Connecting)
    }

    fn on_tick(&mut self, at: Instant) -> bool {
        if !self.scheduler.should_flush(at) {
            trace!(patient = %self.patient, "Skipping early flush tick");
            return true;
        }
        if !self.scheduler.try_begin() {
            trace!(patient = %self.patient, "Flush already in progress");
            return true;
        }

        let mode = AlertMode::from_flag(self.buffer.latest_alert());
        let batch = self.buffer.drain_batch(self.policy.batch_size(mode));
        let cadence = self.policy.cadence(mode);
        let flushed = batch.len();
        self.counters.flushed += flushed as u64;
        let counters = self.counters;
        let now = Utc::now();

        let current = self.state.apply(|s| {
            let expired = s.window.extend(batch, now);
            s.alert = mode.is_alert();
            s.cadence = cadence;
            s.flushes += 1;
            s.counters = counters;
            trace!(
                patient = %self.patient,
                batch = flushed,
                expired,
                visible = s.window.len(),
                mode = mode.as_str(),
                "Flushed samples"
            );
        });
        self.scheduler.finish(at);

        if current && cadence != self.scheduler.cadence() {
            info!(
                patient = %self.patient,
                mode = mode.as_str(),
                cadence_ms = cadence.as_millis() as u64,
                "Flush cadence changed"
            );
            self.scheduler.reschedule(cadence);
        }
        current
    }
}

#[cfg(test)]
mod tests;
