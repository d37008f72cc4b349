//! Session identity and state machine.
//!
//! # Responsibilities
//! - Give each session an ID for log correlation
//! - Track the session through its forwarding states
//!
//! ```text
//! Idle → Connecting → Forwarding → Relaying → Closed
//!            │             │           │
//!            └─────────────┴───────────┴──→ Error → Closed
//! ```
//!
//! Any state may move straight to `Closed` (client abort, parse failure).

use uuid::Uuid;

/// Unique identifier for a session.
///
/// Random rather than counted, so sessions share nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The first group is plenty for correlating log lines.
        let simple = self.0.simple().to_string();
        write!(f, "{}", &simple[..8])
    }
}

/// Forwarding state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Reading and parsing the client request.
    Idle,
    /// Opening the upstream connection.
    Connecting,
    /// Sending the rewritten request upstream.
    Forwarding,
    /// Streaming the upstream response to the client.
    Relaying,
    /// An upstream failure is being reported to the client.
    Error,
    /// Both sockets released.
    Closed,
}

impl SessionState {
    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Idle, Connecting)
                | (Connecting, Forwarding)
                | (Forwarding, Relaying)
                | (Connecting | Forwarding | Relaying, Error)
                | (Idle | Connecting | Forwarding | Relaying | Error, Closed)
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Connecting => "connecting",
            SessionState::Forwarding => "forwarding",
            SessionState::Relaying => "relaying",
            SessionState::Error => "error",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Current state plus transition bookkeeping.
#[derive(Debug)]
pub struct StateMachine {
    state: SessionState,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
        }
    }

    /// Move to `next`. Illegal transitions are logged and ignored.
    pub fn advance(&mut self, next: SessionState) {
        if self.state.can_transition_to(next) {
            tracing::trace!(from = %self.state, to = %next, "Session state change");
            self.state = next;
        } else {
            tracing::warn!(from = %self.state, to = %next, "Ignoring illegal session state change");
        }
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_unique() {
        let id1 = SessionId::new();
        let id2 = SessionId::new();
        assert_ne!(id1, id2);
        assert_eq!(id1.to_string().len(), 8);
    }

    #[test]
    fn happy_path() {
        let mut machine = StateMachine::new();
        for next in [
            SessionState::Connecting,
            SessionState::Forwarding,
            SessionState::Relaying,
            SessionState::Closed,
        ] {
            machine.advance(next);
            assert_eq!(machine.state, next);
        }
    }

    #[test]
    fn error_reachable_only_from_upstream_states() {
        assert!(!SessionState::Idle.can_transition_to(SessionState::Error));
        assert!(SessionState::Connecting.can_transition_to(SessionState::Error));
        assert!(SessionState::Relaying.can_transition_to(SessionState::Error));
        assert!(SessionState::Error.can_transition_to(SessionState::Closed));
    }

    #[test]
    fn closed_is_terminal() {
        let mut machine = StateMachine::new();
        machine.advance(SessionState::Closed);
        machine.advance(SessionState::Connecting);
        assert_eq!(machine.state, SessionState::Closed);
    }

    #[test]
    fn no_skipping_ahead() {
        let mut machine = StateMachine::new();
        machine.advance(SessionState::Relaying);
        assert_eq!(machine.state, SessionState::Idle);
    }
}
