//! Rubric dimensions and critical error flags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest score a single message can earn on a dimension.
pub const MIN_DIMENSION_SCORE: f64 = 0.0;

/// Highest score a single message can earn on a dimension.
pub const MAX_DIMENSION_SCORE: f64 = 5.0;

/// One scored axis of trainee performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RubricDimension {
    /// Acknowledging the persona's feelings.
    Empathy,
    /// Plain language and concrete next steps.
    Clarity,
    /// Reflecting back and inviting the persona to say more.
    ActiveListening,
    /// Lowering the temperature of the encounter.
    DeEscalation,
    /// Courtesy, introductions, respectful register.
    Professionalism,
}

impl RubricDimension {
    /// Returns all dimensions in canonical order.
    pub fn all() -> &'static [RubricDimension] {
        &[
            RubricDimension::Empathy,
            RubricDimension::Clarity,
            RubricDimension::ActiveListening,
            RubricDimension::DeEscalation,
            RubricDimension::Professionalism,
        ]
    }

    /// Returns the display label.
    pub fn label(&self) -> &'static str {
        match self {
            RubricDimension::Empathy => "Empathy",
            RubricDimension::Clarity => "Clarity",
            RubricDimension::ActiveListening => "Active listening",
            RubricDimension::DeEscalation => "De-escalation",
            RubricDimension::Professionalism => "Professionalism",
        }
    }
}

impl fmt::Display for RubricDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A session-level mistake recorded independently of numeric scores.
///
/// Flags are monotonic: once raised for a session they are never cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalErrorFlag {
    /// The trainee used a phrase the vignette forbids.
    DisallowedLanguage,
    /// The trainee asserted something the vignette's facts contradict.
    FactContradiction,
}

impl CriticalErrorFlag {
    /// Returns a short description for debrief reports.
    pub fn description(&self) -> &'static str {
        match self {
            CriticalErrorFlag::DisallowedLanguage => "Used language the scenario disallows",
            CriticalErrorFlag::FactContradiction => "Disclosed information contradicting the case facts",
        }
    }
}
