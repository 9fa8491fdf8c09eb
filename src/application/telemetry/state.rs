//! Consumer-visible telemetry state.
//!
//! The state is shared between the client and its session task behind a
//! [`RwLock`]. Each subscription gets an epoch; a session writes through a
//! [`StateWriter`] bound to its epoch and every write is dropped once a newer
//! subscription has superseded it.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::watch;

use super::window::{RetentionPolicy, SampleWindow};
use crate::domain::{ConnectionStatus, PatientId, Sample};

/// Per-subscription ingest counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestCounters {
    /// Samples accepted into the ingest buffer.
    pub received: u64,
    /// Payloads that failed to decode.
    pub malformed: u64,
    /// Samples addressed to a different patient.
    pub mismatched: u64,
    /// Samples dropped from a full ingest buffer.
    pub evicted: u64,
    /// Samples moved into the visible list.
    pub flushed: u64,
}

/// Point-in-time copy of the exposed state.
#[derive(Debug, Clone)]
pub struct TelemetrySnapshot {
    pub patient: Option<PatientId>,
    pub samples: Vec<Sample>,
    pub status: ConnectionStatus,
    pub last_error: Option<String>,
    /// Running flush cadence.
    pub cadence: Duration,
    /// Alert mode applied at the last flush.
    pub alert: bool,
    /// Flush ticks applied so far. Never decreases within a subscription.
    pub flushes: u64,
    /// Consecutive failed connection cycles.
    pub reconnect_attempts: u32,
    pub counters: IngestCounters,
}

#[derive(Debug)]
pub(crate) struct TelemetryState {
    pub(crate) epoch: u64,
    pub(crate) patient: Option<PatientId>,
    pub(crate) window: SampleWindow,
    pub(crate) status: ConnectionStatus,
    pub(crate) last_error: Option<String>,
    pub(crate) cadence: Duration,
    pub(crate) alert: bool,
    pub(crate) flushes: u64,
    pub(crate) reconnect_attempts: u32,
    pub(crate) counters: IngestCounters,
}

impl TelemetryState {
    fn idle(epoch: u64, retention: RetentionPolicy, cadence: Duration) -> Self {
        Self {
            epoch,
            patient: None,
            window: SampleWindow::new(retention),
            status: ConnectionStatus::Disconnected,
            last_error: None,
            cadence,
            alert: false,
            flushes: 0,
            reconnect_attempts: 0,
            counters: IngestCounters::default(),
        }
    }

    fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            patient: self.patient,
            samples: self.window.to_vec(),
            status: self.status,
            last_error: self.last_error.clone(),
            cadence: self.cadence,
            alert: self.alert,
            flushes: self.flushes,
            reconnect_attempts: self.reconnect_attempts,
            counters: self.counters,
        }
    }
}

/// State shared by a client and its sessions.
#[derive(Debug)]
pub(crate) struct SharedState {
    inner: RwLock<TelemetryState>,
    version: watch::Sender<u64>,
    retention: RetentionPolicy,
    initial_cadence: Duration,
}

impl SharedState {
    pub(crate) fn new(retention: RetentionPolicy, initial_cadence: Duration) -> Arc<Self> {
        let (version, _) = watch::channel(0);
        Arc::new(Self {
            inner: RwLock::new(TelemetryState::idle(0, retention, initial_cadence)),
            version,
            retention,
            initial_cadence,
        })
    }

    /// Invalidate the current subscription and start `next`, atomically.
    ///
    /// Visible samples are cleared before the lock is released, so no reader
    /// can observe the old subscription's data under the new one. Returns the
    /// new epoch.
    pub(crate) fn supersede(&self, next: Option<PatientId>) -> u64 {
        let epoch = {
            let mut state = self.inner.write();
            let epoch = state.epoch.wrapping_add(1);
            *state = TelemetryState::idle(epoch, self.retention, self.initial_cadence);
            if next.is_some() {
                state.patient = next;
                state.status = ConnectionStatus::Connecting;
            }
            epoch
        };
        self.bump();
        epoch
    }

    /// Clear the visible samples only.
    pub(crate) fn reset_samples(&self) {
        self.inner.write().window.clear();
        self.bump();
    }

    pub(crate) fn snapshot(&self) -> TelemetrySnapshot {
        self.inner.read().snapshot()
    }

    pub(crate) fn read<T>(&self, f: impl FnOnce(&TelemetryState) -> T) -> T {
        f(&self.inner.read())
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    pub(crate) fn writer(self: &Arc<Self>, epoch: u64) -> StateWriter {
        StateWriter {
            shared: Arc::clone(self),
            epoch,
        }
    }

    fn bump(&self) {
        self.version.send_modify(|v| *v = v.wrapping_add(1));
    }
}

/// Epoch-fenced write handle held by one session.
#[derive(Debug, Clone)]
pub(crate) struct StateWriter {
    shared: Arc<SharedState>,
    epoch: u64,
}

impl StateWriter {
    /// Apply `f` if this writer's subscription is still current.
    ///
    /// Returns false, leaving the state untouched, once superseded.
    pub(crate) fn apply(&self, f: impl FnOnce(&mut TelemetryState)) -> bool {
        {
            let mut state = self.shared.inner.write();
            if state.epoch != self.epoch {
                return false;
            }
            f(&mut state);
        }
        self.shared.bump();
        true
    }

    pub(crate) fn is_current(&self) -> bool {
        self.shared.inner.read().epoch == self.epoch
    }

    #[cfg(test)]
    pub(crate) const fn epoch(&self) -> u64 {
        self.epoch
    }
}
