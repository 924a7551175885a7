//! Connection lifecycle.

use std::fmt;

/// Where the link to the vehicle stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Nothing sent yet
    Disconnected,
    /// Waiting for `ok` on the given attempt (1-based)
    Handshaking {
        /// Attempt number
        attempt: usize,
        /// Wait for this attempt
        timeout_ms: u64,
    },
    /// Command mode entered, receiver running
    Connected,
    /// Handshake failed, session torn down, or the receiver died
    Closed,
}

impl ConnectionState {
    /// Whether `next` is a legal successor of `self`
    ///
    /// # Examples
    ///
    /// ```
    /// use tello_bridge::link::ConnectionState;
    ///
    /// let hs = ConnectionState::Handshaking { attempt: 1, timeout_ms: 8 };
    /// assert!(ConnectionState::Disconnected.can_transition_to(hs));
    /// assert!(!ConnectionState::Disconnected.can_transition_to(ConnectionState::Connected));
    /// ```
    #[must_use]
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        match (self, next) {
            (Disconnected, Handshaking { attempt: 1, .. }) => true,
            (Handshaking { attempt: a, .. }, Handshaking { attempt: b, .. }) => b == a + 1,
            (Handshaking { .. }, Connected) => true,
            (Handshaking { .. }, Closed) => true,
            (Connected, Closed) => true,
            _ => false,
        }
    }

    /// Move to `next`, refusing illegal transitions
    pub fn advance(&mut self, next: ConnectionState) -> bool {
        if self.can_transition_to(next) {
            tracing::debug!("Connection state {} -> {}", self, next);
            *self = next;
            true
        } else {
            tracing::warn!("Ignoring illegal connection transition {} -> {}", self, next);
            false
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => f.write_str("disconnected"),
            ConnectionState::Handshaking { attempt, timeout_ms } => {
                write!(f, "handshaking (attempt {}, {} ms)", attempt, timeout_ms)
            }
            ConnectionState::Connected => f.write_str("connected"),
            ConnectionState::Closed => f.write_str("closed"),
        }
    }
}
