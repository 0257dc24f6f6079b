// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Publisher state machine with typed state transitions.
//!
//! Implements the region lifecycle: Uninitialized → Open(w, h) → Closed.
//! Invalid transitions result in StateTransitionError.

use serde::{Deserialize, Serialize};

use crate::error::StateTransitionError;
use crate::types::FrameDimensions;

/// Publisher lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublisherState {
    /// No region is mapped. Initial state, and the state after a failed open.
    Uninitialized,

    /// A region sized for these dimensions is mapped.
    Open(FrameDimensions),

    /// Shut down. Terminal.
    Closed,
}

impl PublisherState {
    /// Get the state name for error messages.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "Uninitialized",
            Self::Open(_) => "Open",
            Self::Closed => "Closed",
        }
    }

    /// Check if transition to the target state is valid.
    pub fn can_transition_to(&self, target: PublisherState) -> bool {
        matches!(
            (self, target),
            // From Uninitialized
            (Self::Uninitialized, Self::Open(_)) |
            (Self::Uninitialized, Self::Closed) |
            // From Open: resize, failed reopen, shutdown
            (Self::Open(_), Self::Open(_)) |
            (Self::Open(_), Self::Uninitialized) |
            (Self::Open(_), Self::Closed)
        )
    }

    /// Whether no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl std::fmt::Display for PublisherState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open(dims) => write!(f, "Open({})", dims),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// State machine for the publisher lifecycle.
/// Enforces valid state transitions and counts them.
#[derive(Debug)]
pub struct PublisherStateMachine {
    current_state: PublisherState,
    transition_count: u64,
}

impl PublisherStateMachine {
    pub fn new() -> Self {
        Self {
            current_state: PublisherState::Uninitialized,
            transition_count: 0,
        }
    }

    /// Get the current state.
    pub fn state(&self) -> PublisherState {
        self.current_state
    }

    /// Get total number of transitions.
    pub fn transition_count(&self) -> u64 {
        self.transition_count
    }

    /// Attempt to transition to a new state.
    pub fn transition_to(&mut self, target: PublisherState) -> Result<(), StateTransitionError> {
        if self.current_state.is_terminal() {
            return Err(StateTransitionError::TerminalState {
                state: self.current_state.name(),
            });
        }

        if !self.current_state.can_transition_to(target) {
            return Err(StateTransitionError::InvalidTransition {
                from: self.current_state.name(),
                to: target.name(),
            });
        }

        tracing::debug!(
            from = %self.current_state,
            to = %target,
            "State transition"
        );

        self.current_state = target;
        self.transition_count += 1;

        Ok(())
    }

    /// Dimensions of the open region, if any.
    pub fn open_dimensions(&self) -> Option<FrameDimensions> {
        match self.current_state {
            PublisherState::Open(dims) => Some(dims),
            _ => None,
        }
    }
}

impl Default for PublisherStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(w: u32, h: u32) -> PublisherState {
        PublisherState::Open(FrameDimensions::new(w, h).unwrap())
    }

    #[test]
    fn test_initial_state() {
        let sm = PublisherStateMachine::new();
        assert_eq!(sm.state(), PublisherState::Uninitialized);
        assert_eq!(sm.transition_count(), 0);
        assert!(sm.open_dimensions().is_none());
    }

    #[test]
    fn test_valid_transitions() {
        let mut sm = PublisherStateMachine::new();

        // Uninitialized → Open
        assert!(sm.transition_to(open(640, 480)).is_ok());
        assert_eq!(sm.state(), open(640, 480));

        // Open → Open (resize)
        assert!(sm.transition_to(open(1280, 720)).is_ok());
        assert_eq!(sm.open_dimensions().unwrap().width(), 1280);

        // Open → Uninitialized (reopen failed)
        assert!(sm.transition_to(PublisherState::Uninitialized).is_ok());

        // Uninitialized → Open → Closed
        assert!(sm.transition_to(open(2, 2)).is_ok());
        assert!(sm.transition_to(PublisherState::Closed).is_ok());
        assert_eq!(sm.transition_count(), 5);
    }

    #[test]
    fn test_closed_is_terminal() {
        let mut sm = PublisherStateMachine::new();
        sm.transition_to(PublisherState::Closed).unwrap();

        assert!(matches!(
            sm.transition_to(open(2, 2)),
            Err(StateTransitionError::TerminalState { .. })
        ));
        assert_eq!(sm.state(), PublisherState::Closed);
    }

    #[test]
    fn test_invalid_transition() {
        let mut sm = PublisherStateMachine::new();
        assert!(sm.transition_to(PublisherState::Uninitialized).is_err());
    }

    #[test]
    fn test_open_state_deserialize_validates_dimensions() {
        let state: PublisherState = serde_yaml::from_str("!Open\nwidth: 2\nheight: 2").unwrap();
        assert_eq!(state, open(2, 2));

        assert!(serde_yaml::from_str::<PublisherState>("!Open\nwidth: 0\nheight: 7").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(open(640, 480).to_string(), "Open(640x480)");
        assert_eq!(PublisherState::Closed.to_string(), "Closed");
    }
}
