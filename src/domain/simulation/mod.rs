//! Simulation domain - the turn-by-turn conversation engine.
//!
//! # Module Organization
//!
//! - `session_state` - Serializable state of one session
//! - `emotion` - Persona emotional scale and its per-turn update
//! - `assessment` - Running rubric means and critical error flags
//! - `phase_manager` - Phase exit evaluation
//! - `prompt` / `context` - What the model is sent each turn
//! - `engine` - Orchestration of a full turn

mod assessment;
mod context;
mod emotion;
mod engine;
mod errors;
mod matching;
mod phase_manager;
mod prompt;
mod scoring;
mod session_state;
mod session_status;

pub use assessment::{
    AssessmentEngine, AssessmentState, AssessmentSummary, AssessmentUpdate, DimensionSummary,
    FULL_CONFIDENCE_SAMPLES,
};
pub use context::{HistoryWindow, WindowedHistory, DEFAULT_WINDOW_TURNS};
pub use emotion::{
    clamp_emotion, decay_toward_neutral, EmotionPolicy, EmotionUpdate, EmotionalBand,
    EmotionalState, EmotionalStateTracker, EmotionalTrend, EMOTION_MAX, EMOTION_MIN,
    EMOTION_NEUTRAL,
};
pub use engine::{
    ConversationEngine, EngineSettings, PreparedTurn, TurnResult, DEFAULT_GENERATION_TIMEOUT,
};
pub use errors::{EngineError, InputError};
pub use matching::{phrase_refs, KeywordTriggerMatcher, TriggerMatcher};
pub use phase_manager::{
    PhaseDecision, PhaseManager, PhaseProgress, PhaseTransition, TransitionReason,
};
pub use prompt::{compose_system_prompt, PromptContext, MAX_REPLY_SENTENCES};
pub use scoring::{KeywordRubricScorer, RubricScorer};
pub use session_state::{Message, SessionState, Speaker};
pub use session_status::SessionStatus;
