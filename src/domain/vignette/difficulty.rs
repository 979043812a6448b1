//! Trainee difficulty levels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Difficulty at which a trainee plays a vignette.
///
/// Difficulty shapes the persona's traits, how strictly messages are
/// scored, and which model backend voices the persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    /// Returns all difficulty levels, easiest first.
    pub fn all() -> &'static [Difficulty] {
        &[
            Difficulty::Beginner,
            Difficulty::Intermediate,
            Difficulty::Advanced,
        ]
    }

    /// Multiplier applied to raw rubric contributions.
    ///
    /// Beginners get a little credit for partial attempts; advanced trainees
    /// need stronger evidence to earn the same score.
    pub fn scoring_factor(&self) -> f64 {
        match self {
            Difficulty::Beginner => 1.1,
            Difficulty::Intermediate => 1.0,
            Difficulty::Advanced => 0.9,
        }
    }

    /// Returns the display label.
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Difficulty {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            other => Err(ValidationError::invalid_format(
                "difficulty",
                format!("unknown level '{}'", other),
            )),
        }
    }
}
