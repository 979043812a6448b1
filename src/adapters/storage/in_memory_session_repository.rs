//! In-Memory Session Repository Adapter
//!
//! Keeps session state in memory. Useful for tests and single-process runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::SessionId;
use crate::domain::simulation::SessionState;
use crate::ports::{SessionRepository, SessionRepositoryError};

/// In-memory storage for session state
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionRepository {
    sessions: Arc<RwLock<HashMap<SessionId, SessionState>>>,
}

impl InMemorySessionRepository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored sessions (useful for tests)
    pub async fn clear(&self) {
        self.sessions.write().await.clear();
    }

    /// Get the number of stored sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create(&self, state: &SessionState) -> Result<(), SessionRepositoryError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&state.session_id) {
            return Err(SessionRepositoryError::AlreadyExists(state.session_id));
        }
        sessions.insert(state.session_id, state.clone());
        Ok(())
    }

    async fn load(&self, session_id: &SessionId) -> Result<SessionState, SessionRepositoryError> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or(SessionRepositoryError::NotFound(*session_id))
    }

    async fn save(
        &self,
        state: &SessionState,
        expected_revision: u64,
    ) -> Result<(), SessionRepositoryError> {
        // Check and write under one lock so two saves cannot interleave
        let mut sessions = self.sessions.write().await;
        let stored = sessions
            .get_mut(&state.session_id)
            .ok_or(SessionRepositoryError::NotFound(state.session_id))?;

        if stored.revision != expected_revision {
            return Err(SessionRepositoryError::ConcurrentModification {
                session_id: state.session_id,
                expected: expected_revision,
                actual: stored.revision,
            });
        }

        *stored = state.clone();
        Ok(())
    }
}
