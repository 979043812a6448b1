//! Configuration errors raised while loading a vignette.

use crate::domain::foundation::PhaseId;

use super::{Difficulty, RubricDimension};

/// A vignette that cannot be run.
///
/// These are raised at load time only; a vignette that passed validation
/// never produces one mid-session.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VignetteConfigError {
    #[error("Required field missing or empty: {0}")]
    MissingField(&'static str),

    #[error("Vignette declares no difficulty levels")]
    NoDifficultyLevels,

    #[error("Vignette declares no phases")]
    NoPhases,

    #[error("Duplicate phase id: {0}")]
    DuplicatePhaseId(PhaseId),

    #[error("Phase order must strictly increase: {phase} has order {found} after {previous}")]
    NonMonotonicPhaseOrder {
        phase: PhaseId,
        previous: u32,
        found: u32,
    },

    #[error("Phase {0} must have a turn ceiling of at least 1")]
    ZeroTurnCeiling(PhaseId),

    #[error("Phase {phase} has an invalid threshold: {reason}")]
    InvalidThreshold { phase: PhaseId, reason: String },

    #[error("Persona traits reference difficulty {0} which the vignette does not offer")]
    UnknownTraitDifficulty(Difficulty),

    #[error("Invalid model configuration: {0}")]
    InvalidModelConfig(String),

    #[error("Rubric weight for {0} must be finite and non-negative")]
    InvalidRubricWeight(RubricDimension),

    #[error("Failed to parse vignette: {0}")]
    Parse(String),
}
