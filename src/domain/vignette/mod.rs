//! Vignette domain module.
//!
//! A vignette is the authored, read-only definition of a role-play
//! scenario: the persona, grounding facts, escalation triggers, the ordered
//! phases of the encounter and the rubric it is scored against.

mod config;
mod difficulty;
mod errors;
mod model;
mod persona;
mod phase;
mod rubric;

pub use config::VignetteConfig;
pub use difficulty::Difficulty;
pub use errors::VignetteConfigError;
pub use model::{BackendKind, ModelConfig, ModelId};
pub use persona::{Persona, PersonaEmotion, VoiceConfig, VoiceLine};
pub use phase::{EmotionThreshold, ExitCondition, Phase, ScoreThreshold};
pub use rubric::{CriticalErrorFlag, RubricDimension, MAX_DIMENSION_SCORE, MIN_DIMENSION_SCORE};
