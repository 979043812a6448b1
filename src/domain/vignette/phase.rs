//! Phases of a scripted encounter and their exit conditions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::foundation::PhaseId;

use super::RubricDimension;

/// An ordered stage of the encounter with its own pedagogical goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub id: PhaseId,
    pub order: u32,
    /// What the trainee is meant to accomplish; fed to the persona prompt.
    pub goal: String,
    pub exit_condition: ExitCondition,
    /// Dimensions this phase is meant to exercise.
    #[serde(default)]
    pub rubric_focus: BTreeSet<RubricDimension>,
    /// Scales emotional stimulus while this phase is active.
    #[serde(default = "default_sensitivity")]
    pub escalation_sensitivity: f64,
}

fn default_sensitivity() -> f64 {
    1.0
}

impl Phase {
    /// Creates a phase with no rubric focus and neutral sensitivity.
    pub fn new(
        id: PhaseId,
        order: u32,
        goal: impl Into<String>,
        exit_condition: ExitCondition,
    ) -> Self {
        Self {
            id,
            order,
            goal: goal.into(),
            exit_condition,
            rubric_focus: BTreeSet::new(),
            escalation_sensitivity: default_sensitivity(),
        }
    }

    /// Sets the dimensions this phase exercises.
    pub fn with_rubric_focus(mut self, focus: impl IntoIterator<Item = RubricDimension>) -> Self {
        self.rubric_focus = focus.into_iter().collect();
        self
    }

    /// Sets the escalation sensitivity.
    pub fn with_escalation_sensitivity(mut self, sensitivity: f64) -> Self {
        self.escalation_sensitivity = sensitivity;
        self
    }
}

/// Policies that decide when a phase is finished.
///
/// Evaluated in a fixed priority order: turn ceiling, then score
/// threshold, then emotion threshold. The ceiling is mandatory so a phase
/// cannot run forever.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitCondition {
    /// Trainee turns after which the phase ends regardless of performance.
    pub max_turns: u32,
    #[serde(default)]
    pub score_threshold: Option<ScoreThreshold>,
    #[serde(default)]
    pub emotion_threshold: Option<EmotionThreshold>,
}

impl ExitCondition {
    /// Creates a condition with only a turn ceiling.
    pub fn after_turns(max_turns: u32) -> Self {
        Self {
            max_turns,
            score_threshold: None,
            emotion_threshold: None,
        }
    }

    /// Adds a score threshold.
    pub fn with_score_threshold(mut self, threshold: ScoreThreshold) -> Self {
        self.score_threshold = Some(threshold);
        self
    }

    /// Adds an emotion threshold.
    pub fn with_emotion_threshold(mut self, threshold: EmotionThreshold) -> Self {
        self.emotion_threshold = Some(threshold);
        self
    }
}

/// Fires once the running mean on a dimension reaches `min_score`.
///
/// Only samples taken in the phase being evaluated count, so a strong
/// score in an earlier phase does not end a later one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreThreshold {
    pub dimension: RubricDimension,
    pub min_score: f64,
    /// Samples required before the mean is trusted.
    #[serde(default = "default_min_samples")]
    pub min_samples: u32,
}

fn default_min_samples() -> u32 {
    1
}

impl ScoreThreshold {
    /// Creates a threshold needing a single sample.
    pub fn new(dimension: RubricDimension, min_score: f64) -> Self {
        Self {
            dimension,
            min_score,
            min_samples: default_min_samples(),
        }
    }
}

/// Fires when the persona's emotional value crosses a bound.
///
/// Authored as `{ direction: below, bound: 0.3 }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "direction", content = "bound", rename_all = "snake_case")]
pub enum EmotionThreshold {
    /// Strictly below the value (de-escalation reached).
    Below(f64),
    /// Strictly above the value (escalation reached).
    Above(f64),
}

impl EmotionThreshold {
    /// Returns true if the emotional value satisfies this threshold.
    pub fn is_crossed_by(&self, value: f64) -> bool {
        match self {
            EmotionThreshold::Below(bound) => value < *bound,
            EmotionThreshold::Above(bound) => value > *bound,
        }
    }

    /// Returns the bound value.
    pub fn bound(&self) -> f64 {
        match self {
            EmotionThreshold::Below(bound) | EmotionThreshold::Above(bound) => *bound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emotion_threshold_below_is_strict() {
        let threshold = EmotionThreshold::Below(-0.2);
        assert!(threshold.is_crossed_by(-0.3));
        assert!(!threshold.is_crossed_by(-0.2));
        assert!(!threshold.is_crossed_by(0.5));
    }

    #[test]
    fn emotion_threshold_above_is_strict() {
        let threshold = EmotionThreshold::Above(0.8);
        assert!(threshold.is_crossed_by(0.9));
        assert!(!threshold.is_crossed_by(0.8));
    }

    #[test]
    fn emotion_threshold_deserializes_from_direction_and_bound() {
        let threshold: EmotionThreshold =
            serde_json::from_str(r#"{"direction": "below", "bound": -0.25}"#).unwrap();
        assert_eq!(threshold, EmotionThreshold::Below(-0.25));
    }

    #[test]
    fn emotion_threshold_reads_from_yaml_map() {
        let yaml = "max_turns: 4\nemotion_threshold:\n  direction: above\n  bound: 0.7\n";
        let exit: ExitCondition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(exit.emotion_threshold, Some(EmotionThreshold::Above(0.7)));

        let written = serde_yaml::to_string(&exit).unwrap();
        let reread: ExitCondition = serde_yaml::from_str(&written).unwrap();
        assert_eq!(reread, exit);
    }

    #[test]
    fn phase_defaults_fill_in() {
        let json = r#"{
            "id": "opening",
            "order": 1,
            "goal": "Introduce yourself",
            "exit_condition": { "max_turns": 3 }
        }"#;
        let phase: Phase = serde_json::from_str(json).unwrap();
        assert!(phase.rubric_focus.is_empty());
        assert_eq!(phase.escalation_sensitivity, 1.0);
        assert!(phase.exit_condition.score_threshold.is_none());
    }

    #[test]
    fn score_threshold_defaults_to_one_sample() {
        let threshold: ScoreThreshold =
            serde_json::from_str(r#"{"dimension":"empathy","min_score":3.0}"#).unwrap();
        assert_eq!(threshold.min_samples, 1);
    }
}
