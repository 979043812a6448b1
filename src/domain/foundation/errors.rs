//! Error types for the domain layer.

use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
        actual: f64,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an out of range validation error.
    pub fn out_of_range(field: impl Into<String>, min: f64, max: f64, actual: f64) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Stable error codes surfaced to callers.
///
/// Transports map these onto their own status vocabulary; the engine only
/// guarantees the code is stable for a given failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    EmptyMessage,
    InvalidDifficulty,
    VignetteMismatch,

    // Configuration errors
    InvalidVignette,
    VignetteNotFound,
    VignetteInactive,
    UnsupportedModel,

    // Session-state errors
    SessionNotFound,
    SessionComplete,
    SessionCorrupted,
    ConcurrentModification,
    Forbidden,

    // Generation errors
    GenerationFailed,
    RateLimited,
    GenerationTimeout,

    // Infrastructure errors
    StorageError,
    InternalError,
}

impl ErrorCode {
    /// Returns true if the failure class may succeed on a retry of the same call.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::GenerationFailed | ErrorCode::RateLimited | ErrorCode::GenerationTimeout
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::EmptyMessage => "EMPTY_MESSAGE",
            ErrorCode::InvalidDifficulty => "INVALID_DIFFICULTY",
            ErrorCode::VignetteMismatch => "VIGNETTE_MISMATCH",
            ErrorCode::InvalidVignette => "INVALID_VIGNETTE",
            ErrorCode::VignetteNotFound => "VIGNETTE_NOT_FOUND",
            ErrorCode::VignetteInactive => "VIGNETTE_INACTIVE",
            ErrorCode::UnsupportedModel => "UNSUPPORTED_MODEL",
            ErrorCode::SessionNotFound => "SESSION_NOT_FOUND",
            ErrorCode::SessionComplete => "SESSION_COMPLETE",
            ErrorCode::SessionCorrupted => "SESSION_CORRUPTED",
            ErrorCode::ConcurrentModification => "CONCURRENT_MODIFICATION",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::GenerationFailed => "GENERATION_FAILED",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::GenerationTimeout => "GENERATION_TIMEOUT",
            ErrorCode::StorageError => "STORAGE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_messages_name_the_field() {
        let err = ValidationError::empty_field("title");
        assert_eq!(err.to_string(), "Field 'title' cannot be empty");

        let err = ValidationError::out_of_range("temperature", 0.0, 2.0, 3.5);
        assert!(err.to_string().contains("temperature"));
        assert!(err.to_string().contains("3.5"));
    }

    #[test]
    fn error_codes_display_screaming_snake_case() {
        assert_eq!(ErrorCode::SessionComplete.to_string(), "SESSION_COMPLETE");
        assert_eq!(
            ErrorCode::ConcurrentModification.to_string(),
            "CONCURRENT_MODIFICATION"
        );
    }

    #[test]
    fn only_generation_codes_are_retryable() {
        assert!(ErrorCode::GenerationTimeout.is_retryable());
        assert!(ErrorCode::RateLimited.is_retryable());
        assert!(!ErrorCode::SessionComplete.is_retryable());
        assert!(!ErrorCode::ConcurrentModification.is_retryable());
        assert!(!ErrorCode::EmptyMessage.is_retryable());
    }
}
