//! SessionStatus enum for tracking the lifecycle of a simulation session.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Lifecycle status of a simulation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Accepting trainee turns.
    #[default]
    Active,
    /// The terminal phase's exit condition fired.
    Complete,
    /// The caller ended the session before the terminal phase finished.
    Ended,
}

impl SessionStatus {
    /// Returns true if the session accepts new turns.
    pub fn accepts_turns(&self) -> bool {
        matches!(self, SessionStatus::Active)
    }
}

impl StateMachine for SessionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SessionStatus::*;
        matches!((self, target), (Active, Complete) | (Active, Ended))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            SessionStatus::Active => vec![SessionStatus::Complete, SessionStatus::Ended],
            SessionStatus::Complete | SessionStatus::Ended => vec![],
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Active => "Active",
            SessionStatus::Complete => "Complete",
            SessionStatus::Ended => "Ended",
        };
        write!(f, "{}", s)
    }
}
