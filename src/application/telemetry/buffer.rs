//! Bounded ingest buffer between message arrival and the next flush.

use std::collections::VecDeque;

use crate::domain::Sample;

/// Drop-oldest FIFO of samples awaiting flush.
///
/// Every mutation completes synchronously, so the buffer is never observed
/// half-updated across an await point of the owning session.
#[derive(Debug)]
pub struct IngestBuffer {
    samples: VecDeque<Sample>,
    capacity: usize,
    latest_alert: bool,
}

impl IngestBuffer {
    /// Create an empty buffer. A zero capacity is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            latest_alert: false,
        }
    }

    /// Append `sample`, evicting the oldest buffered sample when full.
    ///
    /// Returns the evicted sample, if any.
    pub fn push(&mut self, sample: Sample) -> Option<Sample> {
        self.latest_alert = sample.is_alert();
        let evicted = if self.samples.len() >= self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    /// Remove and return up to `max` of the oldest samples, in arrival order.
    pub fn drain_batch(&mut self, max: usize) -> Vec<Sample> {
        let n = max.min(self.samples.len());
        self.samples.drain(..n).collect()
    }

    /// Alert flag of the most recently pushed sample.
    #[must_use]
    pub const fn latest_alert(&self) -> bool {
        self.latest_alert
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.latest_alert = false;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }
}
