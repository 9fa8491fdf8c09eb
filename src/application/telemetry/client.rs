//! Consumer-facing telemetry client.

use std::sync::Arc;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::config::TelemetryConfig;
use super::policy::AlertMode;
use super::session::{Session, SessionExit};
use super::state::{SharedState, TelemetrySnapshot};
use crate::domain::{ConnectionStatus, PatientId, Sample};
use crate::error::Result;
use crate::port::StreamFactory;

struct ActiveSession {
    patient: PatientId,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<SessionExit>,
}

/// Live telemetry for at most one patient at a time.
///
/// Starts idle. [`update`](Self::update) applies a `(patient, enabled)` pair:
/// an unchanged pair is a no-op, anything else tears down the running
/// subscription and, when enabled with a patient, starts a new one.
///
/// All failures surface through [`snapshot`](Self::snapshot); no method
/// returns a stream error.
///
/// [`dispose`](Self::dispose) is the only clean teardown. Dropping the client
/// aborts the session task, so the socket goes away without a close frame
/// and the server sees an abnormal close (1006).
pub struct TelemetryClient {
    config: TelemetryConfig,
    factory: StreamFactory,
    shared: Arc<SharedState>,
    applied: (Option<PatientId>, bool),
    active: Option<ActiveSession>,
}

impl TelemetryClient {
    /// Create an idle client.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn new(config: TelemetryConfig, factory: StreamFactory) -> Result<Self> {
        config.validate()?;
        let shared = SharedState::new(config.retention, config.flush.cadence(AlertMode::Calm));
        Ok(Self {
            config,
            factory,
            shared,
            applied: (None, false),
            active: None,
        })
    }

    /// Re-evaluate the subscription for `patient` and `enabled`.
    pub async fn update(&mut self, patient: Option<PatientId>, enabled: bool) {
        if self.applied == (patient, enabled) {
            return;
        }
        self.applied = (patient, enabled);

        let next = patient.filter(|_| enabled);
        let epoch = self.shared.supersede(next);
        self.stop_active().await;

        if let Some(patient) = next {
            let stream = (self.factory)();
            let session = Session::new(
                patient,
                stream,
                &self.config,
                self.shared.writer(epoch),
            );
            let (shutdown_tx, shutdown_rx) = oneshot::channel();
            let handle = tokio::spawn(session.run(shutdown_rx));
            info!(patient = %patient, epoch, "Telemetry subscription started");
            self.active = Some(ActiveSession {
                patient,
                shutdown: Some(shutdown_tx),
                handle,
            });
        }
    }

    /// Tear down the running subscription, if any.
    pub async fn dispose(&mut self) {
        self.update(None, false).await;
    }

    #[must_use]
    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.shared.snapshot()
    }

    #[must_use]
    pub fn samples(&self) -> Vec<Sample> {
        self.shared.read(|s| s.window.to_vec())
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.shared.read(|s| s.status)
    }

    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.shared.read(|s| s.last_error.clone())
    }

    /// Patient of the running subscription.
    #[must_use]
    pub fn patient(&self) -> Option<PatientId> {
        self.active.as_ref().map(|active| active.patient)
    }

    /// Discard the visible samples without touching the connection.
    pub fn reset(&self) {
        self.shared.reset_samples();
    }

    /// Version counter bumped on every state change.
    #[must_use]
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.shared.subscribe()
    }

    async fn stop_active(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };

        if let Some(shutdown) = active.shutdown.take() {
            // Err means the session already finished on its own.
            let _ = shutdown.send(());
        }

        match tokio::time::timeout(self.config.teardown_grace, &mut active.handle).await {
            Ok(Ok(exit)) => debug!(
                patient = %active.patient,
                reason = ?exit.reason,
                buffered = exit.buffered,
                "Telemetry session stopped"
            ),
            Ok(Err(e)) => warn!(patient = %active.patient, error = %e, "Telemetry session task failed"),
            Err(_) => {
                warn!(patient = %active.patient, "Telemetry session did not stop in time, aborting");
                active.handle.abort();
            }
        }
    }
}

impl Drop for TelemetryClient {
    /// Abort without the close handshake; call `dispose` first for a 1000 close.
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.handle.abort();
        }
    }
}
