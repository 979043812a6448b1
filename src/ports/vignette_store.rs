//! Vignette Store Port - Interface for the scenario content store.
//!
//! Vignettes are authored elsewhere and read-only to the engine. A store
//! validates every vignette it hands out, so a malformed definition fails at
//! load time rather than mid-session.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::{ErrorCode, VignetteId};
use crate::domain::vignette::{VignetteConfig, VignetteConfigError};

/// Errors that can occur looking up a vignette.
#[derive(Debug, Clone, thiserror::Error)]
pub enum VignetteLookupError {
    #[error("Vignette not found: {0}")]
    NotFound(VignetteId),

    #[error("Vignette is inactive: {0}")]
    Inactive(VignetteId),

    #[error("Vignette {id} is invalid: {source}")]
    Invalid {
        id: VignetteId,
        #[source]
        source: VignetteConfigError,
    },

    #[error("Vignette storage error: {0}")]
    Storage(String),
}

impl VignetteLookupError {
    /// Returns the error code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            VignetteLookupError::NotFound(_) => ErrorCode::VignetteNotFound,
            VignetteLookupError::Inactive(_) => ErrorCode::VignetteInactive,
            VignetteLookupError::Invalid { .. } => ErrorCode::InvalidVignette,
            VignetteLookupError::Storage(_) => ErrorCode::StorageError,
        }
    }
}

/// Port for fetching vignettes.
///
/// Returned configs are shared; callers may hold them across sessions.
#[async_trait]
pub trait VignetteStore: Send + Sync {
    /// Fetches an active, validated vignette.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no vignette has this id
    /// - `Inactive` if the vignette exists but refuses new sessions
    /// - `Invalid` if the stored definition fails validation
    async fn get_vignette(&self, id: &VignetteId) -> Result<Arc<VignetteConfig>, VignetteLookupError>;

    /// Lists every active vignette, ordered by id.
    async fn list_active(&self) -> Result<Vec<Arc<VignetteConfig>>, VignetteLookupError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_by_variant() {
        let id = VignetteId::new("upset-daughter").unwrap();
        assert_eq!(
            VignetteLookupError::NotFound(id.clone()).code(),
            ErrorCode::VignetteNotFound
        );
        assert_eq!(
            VignetteLookupError::Inactive(id.clone()).code(),
            ErrorCode::VignetteInactive
        );
        assert_eq!(
            VignetteLookupError::Invalid {
                id,
                source: VignetteConfigError::NoPhases
            }
            .code(),
            ErrorCode::InvalidVignette
        );
    }

    #[test]
    fn invalid_message_includes_cause() {
        let err = VignetteLookupError::Invalid {
            id: VignetteId::new("broken").unwrap(),
            source: VignetteConfigError::NoPhases,
        };
        assert!(err.to_string().contains("broken"));
        assert!(err.to_string().contains("no phases"));
    }
}
