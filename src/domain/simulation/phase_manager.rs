//! Phase progression through a vignette.
//!
//! Phases form a forward-only sequence: a session starts in the first phase,
//! advances one phase at a time, and completes when the last phase's exit
//! condition fires. Exit conditions are checked in a fixed priority order and
//! at most one fires per turn:
//!
//! 1. turn ceiling for the phase (always present, guarantees progress)
//! 2. score threshold on a rubric dimension
//! 3. emotion threshold crossed

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{PhaseId, Timestamp};
use crate::domain::vignette::{Phase, RubricDimension, VignetteConfig};

use super::assessment::AssessmentState;

/// Why a phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransitionReason {
    /// The phase used up its turn allowance.
    TurnCeiling { turns: u32 },
    /// A rubric dimension's running mean reached the threshold.
    ScoreThreshold {
        dimension: RubricDimension,
        score: f64,
    },
    /// The persona's emotion crossed the threshold.
    EmotionThreshold { value: f64 },
}

impl fmt::Display for TransitionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionReason::TurnCeiling { turns } => write!(f, "turn ceiling reached after {} turns", turns),
            TransitionReason::ScoreThreshold { dimension, score } => {
                write!(f, "{} score reached {:.2}", dimension, score)
            }
            TransitionReason::EmotionThreshold { value } => {
                write!(f, "emotion threshold crossed at {:.2}", value)
            }
        }
    }
}

/// A recorded move from one phase to the next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: PhaseId,
    pub to: PhaseId,
    pub reason: TransitionReason,
    /// Session turn number on which the transition happened.
    pub at_turn: u32,
    pub occurred_at: Timestamp,
}

/// Outcome of evaluating the active phase after a turn.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseDecision {
    /// No exit condition fired.
    Remain,
    /// Move to the next phase.
    Advance(PhaseTransition),
    /// The terminal phase ended; the session is complete.
    Complete(TransitionReason),
}

/// Inputs the exit conditions are evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct PhaseProgress<'a> {
    /// Trainee turns spent in the active phase, including this one.
    pub phase_turns: u32,
    /// Session turn number of this turn.
    pub session_turn: u32,
    /// Scores earned in the active phase only.
    pub phase_assessment: &'a AssessmentState,
    pub emotional_value: f64,
}

/// Finite-state machine over a vignette's phase sequence.
///
/// Stateless: every decision is a function of the vignette and the progress
/// handed in.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseManager;

impl PhaseManager {
    /// Creates a new phase manager.
    pub fn new() -> Self {
        Self
    }

    /// Returns the first exit condition of `phase` that is satisfied.
    pub fn exit_reason(&self, phase: &Phase, progress: &PhaseProgress<'_>) -> Option<TransitionReason> {
        let exit = &phase.exit_condition;

        if progress.phase_turns >= exit.max_turns {
            return Some(TransitionReason::TurnCeiling {
                turns: progress.phase_turns,
            });
        }

        if let Some(threshold) = &exit.score_threshold {
            let samples = progress.phase_assessment.samples(threshold.dimension);
            if let Some(score) = progress.phase_assessment.score(threshold.dimension) {
                if samples >= threshold.min_samples && score >= threshold.min_score {
                    return Some(TransitionReason::ScoreThreshold {
                        dimension: threshold.dimension,
                        score,
                    });
                }
            }
        }

        if let Some(threshold) = &exit.emotion_threshold {
            if threshold.is_crossed_by(progress.emotional_value) {
                return Some(TransitionReason::EmotionThreshold {
                    value: progress.emotional_value,
                });
            }
        }

        None
    }

    /// Decides whether the active phase ends this turn and where it goes.
    ///
    /// Returns `None` if `current` is not a phase of the vignette.
    pub fn evaluate(
        &self,
        vignette: &VignetteConfig,
        current: &PhaseId,
        progress: &PhaseProgress<'_>,
    ) -> Option<PhaseDecision> {
        let phase = vignette.phase(current)?;

        let Some(reason) = self.exit_reason(phase, progress) else {
            return Some(PhaseDecision::Remain);
        };

        let decision = match vignette.next_phase(current) {
            Some(next) => PhaseDecision::Advance(PhaseTransition {
                from: current.clone(),
                to: next.id.clone(),
                reason,
                at_turn: progress.session_turn,
                occurred_at: Timestamp::now(),
            }),
            None => PhaseDecision::Complete(reason),
        };
        Some(decision)
    }
}
