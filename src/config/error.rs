//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("History window must cover at least one turn")]
    InvalidHistoryWindow,

    #[error("Emotion setting {0} must be within [0, 1]")]
    InvalidEmotionSetting(&'static str),

    #[error("Invalid base URL for {0}")]
    InvalidBaseUrl(&'static str),
}
