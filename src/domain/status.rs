//! Connection lifecycle as observed by consumers.

use std::fmt;

use serde::Serialize;

/// Status of the live stream for the active subscription.
///
/// `Disconnected` covers both "no subscription" and "waiting to reconnect";
/// the latter is distinguished by an informational `last_error`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// A connection attempt is in flight.
    Connecting,
    /// The stream is open and delivering samples.
    Connected,
    /// No live connection.
    #[default]
    Disconnected,
    /// Retry budget exhausted; requires the consumer to re-enable or switch key.
    Failed,
}

impl ConnectionStatus {
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Terminal for the current subscription: no automatic attempts follow.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Failed)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
