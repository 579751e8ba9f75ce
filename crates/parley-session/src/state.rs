//! Session state machine with validated transitions.
//!
//! Allowed transitions:
//! - Idle -> Listening (user starts listening)
//! - Listening -> Idle (end of utterance, or recognition failure)
//! - Idle -> Speaking, Listening -> Speaking (synthesizer reports start)
//! - Speaking -> Idle (speech finished or cancelled)
//! - Speaking -> Listening (user starts listening over an answer; speech is cancelled first)

use std::fmt;

use parley_core::error::ParleyError;
use serde::{Deserialize, Serialize};

/// Operational state of a dialogue session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Neither listening nor speaking.
    #[default]
    Idle,
    /// The recognizer is capturing an utterance.
    Listening,
    /// The synthesizer is speaking an answer.
    Speaking,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::Listening => write!(f, "Listening"),
            SessionState::Speaking => write!(f, "Speaking"),
        }
    }
}

impl SessionState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &SessionState) -> bool {
        matches!(
            (self, target),
            (SessionState::Idle, SessionState::Listening)
                | (SessionState::Listening, SessionState::Idle)
                | (SessionState::Idle, SessionState::Speaking)
                | (SessionState::Listening, SessionState::Speaking)
                | (SessionState::Speaking, SessionState::Idle)
                | (SessionState::Speaking, SessionState::Listening)
        )
    }
}

/// Owner of the current [`SessionState`].
///
/// Only the session controller holds one, and it is only touched from the
/// controller's event loop, so no locking is involved.
#[derive(Debug, Clone, Default)]
pub struct StateMachine {
    state: SessionState,
}

impl StateMachine {
    /// Create a new state machine initialized to `Idle`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state.
    pub fn current(&self) -> SessionState {
        self.state
    }

    /// Attempt to transition to the target state.
    ///
    /// Returns a `ParleyError::Session` and leaves the state unchanged if the
    /// transition is not allowed from the current state.
    pub fn transition(&mut self, target: SessionState) -> Result<(), ParleyError> {
        if self.state.can_transition_to(&target) {
            tracing::debug!("Session state: {} -> {}", self.state, target);
            self.state = target;
            Ok(())
        } else {
            Err(ParleyError::Session(format!(
                "Invalid state transition: {} -> {}",
                self.state, target
            )))
        }
    }

    /// Force the state machine back to Idle (used for error recovery).
    pub fn reset(&mut self) {
        if self.state != SessionState::Idle {
            tracing::warn!("Session state machine reset to Idle from {}", self.state);
        }
        self.state = SessionState::Idle;
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::Idle.to_string(), "Idle");
        assert_eq!(SessionState::Listening.to_string(), "Listening");
        assert_eq!(SessionState::Speaking.to_string(), "Speaking");
    }

    #[test]
    fn test_valid_transitions() {
        assert!(SessionState::Idle.can_transition_to(&SessionState::Listening));
        assert!(SessionState::Listening.can_transition_to(&SessionState::Idle));
        assert!(SessionState::Idle.can_transition_to(&SessionState::Speaking));
        assert!(SessionState::Listening.can_transition_to(&SessionState::Speaking));
        assert!(SessionState::Speaking.can_transition_to(&SessionState::Idle));
        assert!(SessionState::Speaking.can_transition_to(&SessionState::Listening));
    }

    #[test]
    fn test_self_transitions_are_invalid() {
        assert!(!SessionState::Idle.can_transition_to(&SessionState::Idle));
        assert!(!SessionState::Listening.can_transition_to(&SessionState::Listening));
        assert!(!SessionState::Speaking.can_transition_to(&SessionState::Speaking));
    }

    #[test]
    fn test_state_machine_full_turn() {
        let mut sm = StateMachine::new();
        assert_eq!(sm.current(), SessionState::Idle);

        sm.transition(SessionState::Listening).unwrap();
        sm.transition(SessionState::Idle).unwrap();
        sm.transition(SessionState::Speaking).unwrap();
        sm.transition(SessionState::Idle).unwrap();
        assert_eq!(sm.current(), SessionState::Idle);
    }

    #[test]
    fn test_state_machine_invalid_transition_keeps_state() {
        let mut sm = StateMachine::new();
        let result = sm.transition(SessionState::Idle);
        match result {
            Err(ParleyError::Session(msg)) => {
                assert!(msg.contains("Idle -> Idle"));
            }
            _ => panic!("Expected Session error variant"),
        }
        assert_eq!(sm.current(), SessionState::Idle);
    }

    #[test]
    fn test_state_machine_reset() {
        let mut sm = StateMachine::new();
        sm.transition(SessionState::Speaking).unwrap();
        sm.reset();
        assert_eq!(sm.current(), SessionState::Idle);

        // Resetting an idle machine is a no-op.
        sm.reset();
        assert_eq!(sm.current(), SessionState::Idle);
    }

    #[test]
    fn test_state_serializes_snake_case() {
        let json = serde_json::to_string(&SessionState::Listening).unwrap();
        assert_eq!(json, "\"listening\"");
    }
}
