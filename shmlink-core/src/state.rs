// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Region handle lifecycle: Ready → Destroying → Closed.
//!
//! A handle only exists once create/attach succeeded, so it starts in
//! `Ready`. There is no transition back to `Ready`.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::StateTransitionError;
use crate::types::RegionName;

/// Handle lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandleState {
    /// Mapped and usable.
    Ready,

    /// Teardown in progress.
    Destroying,

    /// Unmapped, or the backing objects were found gone. Terminal.
    Closed,
}

impl HandleState {
    /// Get the state name for error messages.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Ready => "Ready",
            Self::Destroying => "Destroying",
            Self::Closed => "Closed",
        }
    }

    /// Check if transition to the target state is valid.
    pub fn can_transition_to(&self, target: HandleState) -> bool {
        matches!(
            (self, target),
            (Self::Ready, Self::Destroying)
                | (Self::Ready, Self::Closed)
                | (Self::Destroying, Self::Closed)
        )
    }

    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl std::fmt::Display for HandleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// State machine for one region handle.
#[derive(Debug)]
pub struct HandleStateMachine {
    name: RegionName,
    current_state: HandleState,
    last_transition: Instant,
}

impl HandleStateMachine {
    pub fn new(name: RegionName) -> Self {
        Self {
            name,
            current_state: HandleState::Ready,
            last_transition: Instant::now(),
        }
    }

    pub fn state(&self) -> HandleState {
        self.current_state
    }

    /// Time since the last transition.
    pub fn time_in_current_state(&self) -> std::time::Duration {
        self.last_transition.elapsed()
    }

    /// Attempt to transition to a new state.
    pub fn transition_to(&mut self, target: HandleState) -> Result<(), StateTransitionError> {
        if !self.current_state.can_transition_to(target) {
            return Err(StateTransitionError::InvalidTransition {
                name: self.name.to_string(),
                from: self.current_state.name(),
                to: target.name(),
            });
        }

        self.current_state = target;
        self.last_transition = Instant::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> HandleStateMachine {
        HandleStateMachine::new(RegionName::new("state-test").unwrap())
    }

    #[test]
    fn test_initial_state() {
        let sm = machine();
        assert_eq!(sm.state(), HandleState::Ready);
        assert!(sm.state().is_usable());
    }

    #[test]
    fn test_teardown_path() {
        let mut sm = machine();
        assert!(sm.transition_to(HandleState::Destroying).is_ok());
        assert!(!sm.state().is_usable());
        assert!(sm.transition_to(HandleState::Closed).is_ok());
        assert_eq!(sm.state(), HandleState::Closed);
    }

    #[test]
    fn test_orphaned_path() {
        let mut sm = machine();
        assert!(sm.transition_to(HandleState::Closed).is_ok());
    }

    #[test]
    fn test_closed_is_terminal() {
        let mut sm = machine();
        sm.transition_to(HandleState::Closed).unwrap();
        for target in [
            HandleState::Ready,
            HandleState::Destroying,
            HandleState::Closed,
        ] {
            assert!(sm.transition_to(target).is_err());
        }
    }

    #[test]
    fn test_no_return_to_ready() {
        let mut sm = machine();
        sm.transition_to(HandleState::Destroying).unwrap();
        let err = sm.transition_to(HandleState::Ready).unwrap_err();
        assert!(err.to_string().contains("Destroying"));
    }
}
