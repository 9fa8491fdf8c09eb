//! Bounded fixed-delay reconnection budget.

use std::time::Duration;

/// Reconnection parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Consecutive failed connection cycles tolerated before giving up.
    pub max_attempts: u32,
    /// Fixed wait between a failure and the next connection attempt.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_millis(3000),
        }
    }
}

/// What to do after a failed connection cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait `delay`, then attempt again. `attempt` is 1-based.
    Retry { attempt: u32, delay: Duration },
    /// Budget exhausted after `attempts` consecutive failures.
    GiveUp { attempts: u32 },
}

/// Consecutive-failure counter for one subscription.
#[derive(Debug, Clone)]
pub struct RetryState {
    policy: RetryPolicy,
    consecutive_failures: u32,
}

impl RetryState {
    #[must_use]
    pub const fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            consecutive_failures: 0,
        }
    }

    /// Record a failed handshake or a non-clean close.
    pub fn record_failure(&mut self) -> RetryDecision {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if self.consecutive_failures >= self.policy.max_attempts {
            RetryDecision::GiveUp {
                attempts: self.consecutive_failures,
            }
        } else {
            RetryDecision::Retry {
                attempt: self.consecutive_failures,
                delay: self.policy.delay,
            }
        }
    }

    /// Called on every successful connection.
    pub fn reset(&mut self) {
        self.consecutive_failures = 0;
    }

    #[must_use]
    pub const fn failures(&self) -> u32 {
        self.consecutive_failures
    }

    #[must_use]
    pub const fn policy(&self) -> RetryPolicy {
        self.policy
    }
}
