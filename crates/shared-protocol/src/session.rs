//! Session lifecycle

use serde::{Deserialize, Serialize};

use crate::{ProtocolError, ProtocolResult};

/// Which side of the connection we are
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionRole {
    /// Dialed the peer
    Client,
    /// Accepted the connection
    Server,
}

/// Session state
///
/// ```text
/// Connected -> Handshaking -> Secure
///     \             \           \
///      +-------------+-----------+--> Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Raw stream established, nothing exchanged yet
    Connected,
    /// Public keys are being exchanged
    Handshaking,
    /// Shared key derived, application data may flow
    Secure,
    /// Stream closed or the session failed
    Closed,
}

impl SessionState {
    /// Whether `self -> to` is an edge of the state machine
    pub fn can_transition(self, to: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, to),
            (Connected, Handshaking) | (Handshaking, Secure) | (Connected | Handshaking | Secure, Closed)
        )
    }

    /// Move to `to`, or fail if the edge does not exist
    pub fn transition(&mut self, to: SessionState) -> ProtocolResult<()> {
        if !self.can_transition(to) {
            return Err(ProtocolError::InvalidStateTransition { from: *self, to });
        }
        *self = to;
        Ok(())
    }

    /// Application data may be exchanged
    pub fn is_secure(self) -> bool {
        self == SessionState::Secure
    }
}

impl std::fmt::Display for SessionRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionRole::Client => write!(f, "client"),
            SessionRole::Server => write!(f, "server"),
        }
    }
}
