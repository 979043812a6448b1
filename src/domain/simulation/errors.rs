//! Engine error taxonomy.

use crate::domain::foundation::{ErrorCode, SessionId, VignetteId};
use crate::domain::vignette::{Difficulty, VignetteConfigError};
use crate::ports::GenerationFailure;

use super::SessionStatus;

/// Input rejected before any component runs. No state changes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("Difficulty {difficulty} is not offered by vignette {vignette_id}")]
    InvalidDifficulty {
        difficulty: Difficulty,
        vignette_id: VignetteId,
    },

    #[error("Session belongs to vignette {session_vignette} v{session_version}, not {vignette} v{version}")]
    VignetteMismatch {
        session_vignette: VignetteId,
        session_version: u32,
        vignette: VignetteId,
        version: u32,
    },
}

/// Errors returned by the conversation engine.
///
/// Each variant tells the caller whether to retry, surface the error, or
/// treat the scenario as over.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    /// Bad input; fix the request, do not retry as-is.
    #[error("Validation failed: {0}")]
    Validation(#[from] InputError),

    /// The session is finished and accepts no more turns.
    #[error("Session {session_id} is {status} and accepts no more turns")]
    SessionComplete {
        session_id: SessionId,
        status: SessionStatus,
    },

    /// The supplied state cannot have been produced by the engine.
    #[error("Session {session_id} is corrupted: {reason}")]
    SessionCorrupted { session_id: SessionId, reason: String },

    /// The model failed; the caller may retry with the original state.
    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationFailure),

    /// The vignette cannot be run.
    #[error("Vignette configuration error: {0}")]
    Configuration(#[from] VignetteConfigError),
}

impl EngineError {
    /// Creates a corrupted-session error.
    pub fn corrupted(session_id: SessionId, reason: impl Into<String>) -> Self {
        Self::SessionCorrupted {
            session_id,
            reason: reason.into(),
        }
    }

    /// Returns the error code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::Validation(InputError::EmptyMessage) => ErrorCode::EmptyMessage,
            EngineError::Validation(InputError::InvalidDifficulty { .. }) => {
                ErrorCode::InvalidDifficulty
            }
            EngineError::Validation(InputError::VignetteMismatch { .. }) => {
                ErrorCode::VignetteMismatch
            }
            EngineError::SessionComplete { .. } => ErrorCode::SessionComplete,
            EngineError::SessionCorrupted { .. } => ErrorCode::SessionCorrupted,
            EngineError::Generation(GenerationFailure::Timeout { .. }) => {
                ErrorCode::GenerationTimeout
            }
            EngineError::Generation(GenerationFailure::RateLimited { .. }) => {
                ErrorCode::RateLimited
            }
            EngineError::Generation(GenerationFailure::UnsupportedModel(_)) => {
                ErrorCode::UnsupportedModel
            }
            EngineError::Generation(_) => ErrorCode::GenerationFailed,
            EngineError::Configuration(_) => ErrorCode::InvalidVignette,
        }
    }

    /// Returns true if retrying the same turn with the same state may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::Generation(failure) => failure.is_retryable(),
            _ => false,
        }
    }

    /// Returns true if this marks the normal end of a scenario.
    pub fn is_session_complete(&self) -> bool {
        matches!(self, EngineError::SessionComplete { .. })
    }

    /// Returns text suitable for showing the trainee.
    ///
    /// Provider details are never exposed.
    pub fn user_message(&self) -> &'static str {
        match self {
            EngineError::Validation(InputError::EmptyMessage) => "Please enter a message.",
            EngineError::Validation(InputError::InvalidDifficulty { .. }) => {
                "That difficulty level is not available for this scenario."
            }
            EngineError::Validation(InputError::VignetteMismatch { .. }) => {
                "This session no longer matches its scenario. Please start a new session."
            }
            EngineError::SessionComplete { .. } => {
                "This scenario has ended. You can review your debrief."
            }
            EngineError::SessionCorrupted { .. } => {
                "This session could not be resumed. Please start a new session."
            }
            EngineError::Generation(_) => "The response could not be generated. Please try again.",
            EngineError::Configuration(_) => "This scenario is currently unavailable.",
        }
    }
}
