//! Session Repository Port - Interface for persisting session state.
//!
//! Sessions are optimistic-concurrency resources. Every saved state carries a
//! `revision`; a save succeeds only if the stored revision still equals the
//! one the caller read before running the turn. Two concurrent turns on the
//! same session can therefore never both persist.

use async_trait::async_trait;

use crate::domain::foundation::{ErrorCode, SessionId};
use crate::domain::simulation::SessionState;

/// Errors that can occur during session persistence.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionRepositoryError {
    #[error("Session not found: {0}")]
    NotFound(SessionId),

    #[error("Session already exists: {0}")]
    AlreadyExists(SessionId),

    #[error("Session {session_id} was modified concurrently: expected revision {expected}, found {actual}")]
    ConcurrentModification {
        session_id: SessionId,
        expected: u64,
        actual: u64,
    },

    #[error("Failed to serialize session: {0}")]
    Serialization(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl SessionRepositoryError {
    /// Returns the error code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            SessionRepositoryError::NotFound(_) => ErrorCode::SessionNotFound,
            SessionRepositoryError::AlreadyExists(_) => ErrorCode::ConcurrentModification,
            SessionRepositoryError::ConcurrentModification { .. } => {
                ErrorCode::ConcurrentModification
            }
            SessionRepositoryError::Serialization(_) | SessionRepositoryError::Storage(_) => {
                ErrorCode::StorageError
            }
        }
    }
}

/// Port for loading and saving session state.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Stores a brand-new session.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if a session with the same id is stored.
    async fn create(&self, state: &SessionState) -> Result<(), SessionRepositoryError>;

    /// Loads a session.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no session has this id.
    async fn load(&self, session_id: &SessionId) -> Result<SessionState, SessionRepositoryError>;

    /// Replaces a session if its stored revision equals `expected_revision`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the session was never created
    /// - `ConcurrentModification` if another write landed first
    async fn save(
        &self,
        state: &SessionState,
        expected_revision: u64,
    ) -> Result<(), SessionRepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concurrent_modification_message_names_revisions() {
        let err = SessionRepositoryError::ConcurrentModification {
            session_id: SessionId::new(),
            expected: 3,
            actual: 4,
        };
        assert!(err.to_string().contains("expected revision 3, found 4"));
        assert_eq!(err.code(), ErrorCode::ConcurrentModification);
    }

    #[test]
    fn not_found_maps_to_session_not_found() {
        let err = SessionRepositoryError::NotFound(SessionId::new());
        assert_eq!(err.code(), ErrorCode::SessionNotFound);
    }
}
