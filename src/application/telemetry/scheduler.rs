//! Cancellable recurring flush timer with adaptive cadence.
//!
//! [`FlushScheduler`] owns at most one [`Interval`]. [`reschedule`](FlushScheduler::reschedule)
//! drops the running interval before creating the next one, so two cadences
//! can never fire side by side.

use std::future;
use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::debug;

/// Recurring flush timer.
#[derive(Debug)]
pub struct FlushScheduler {
    interval: Option<Interval>,
    cadence: Duration,
    last_flush: Instant,
    flushing: bool,
}

impl FlushScheduler {
    /// Create a stopped scheduler at `cadence`.
    #[must_use]
    pub fn new(cadence: Duration) -> Self {
        Self {
            interval: None,
            cadence,
            last_flush: Instant::now(),
            flushing: false,
        }
    }

    /// Start ticking at the current cadence. No-op if already running.
    pub fn start(&mut self) {
        if self.interval.is_none() {
            self.last_flush = Instant::now();
            self.interval = Some(Self::build(self.cadence));
        }
    }

    /// Cancel the running timer and restart it at `cadence`.
    pub fn reschedule(&mut self, cadence: Duration) {
        debug!(
            from_ms = self.cadence.as_millis() as u64,
            to_ms = cadence.as_millis() as u64,
            "Rescheduling flush timer"
        );
        self.interval = None;
        self.cadence = cadence;
        self.interval = Some(Self::build(cadence));
    }

    /// Stop ticking. Pending [`tick`](Self::tick) calls never resolve.
    pub fn cancel(&mut self) {
        self.interval = None;
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    #[must_use]
    pub const fn cadence(&self) -> Duration {
        self.cadence
    }

    /// Wait for the next tick and return its scheduled instant.
    ///
    /// Pends forever while stopped. Cancel-safe.
    pub async fn tick(&mut self) -> Instant {
        match self.interval.as_mut() {
            Some(interval) => interval.tick().await,
            None => future::pending().await,
        }
    }

    /// Whether a full cadence has elapsed between the last flush and `at`.
    #[must_use]
    pub fn should_flush(&self, at: Instant) -> bool {
        at.saturating_duration_since(self.last_flush) >= self.cadence
    }

    /// Claim the flush guard. Returns false while a flush is applying.
    ///
    /// The session applies a batch without awaiting, so the guard is never
    /// contended there; it only comes into play once a flush can yield.
    pub fn try_begin(&mut self) -> bool {
        if self.flushing {
            return false;
        }
        self.flushing = true;
        true
    }

    /// Release the flush guard and record `at` as the last flush instant.
    pub fn finish(&mut self, at: Instant) {
        self.flushing = false;
        self.last_flush = at;
    }

    fn build(cadence: Duration) -> Interval {
        // tokio panics on a zero period.
        let period = cadence.max(Duration::from_millis(1));
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    }
}
