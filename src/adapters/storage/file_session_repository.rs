//! File-based Session Repository Adapter
//!
//! Stores each session as a YAML file named by its id. Saves are
//! compare-and-swap on `revision`: the stored file is re-read under a write
//! lock and replaced only if its revision still matches.
//!
//! The lock is per process. Several processes sharing one directory are not
//! coordinated.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;

use crate::domain::foundation::SessionId;
use crate::domain::simulation::SessionState;
use crate::ports::{SessionRepository, SessionRepositoryError};

/// File-based storage for session state
#[derive(Debug, Clone)]
pub struct FileSessionRepository {
    base_path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileSessionRepository {
    /// Create a new file repository rooted at `base_path`
    ///
    /// # Example
    /// ```ignore
    /// let repo = FileSessionRepository::new("./data/sessions");
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Get the file path for a session
    fn session_file_path(&self, session_id: &SessionId) -> PathBuf {
        self.base_path.join(format!("{}.yaml", session_id))
    }

    async fn ensure_dir(&self) -> Result<(), SessionRepositoryError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| SessionRepositoryError::Storage(e.to_string()))
    }

    async fn read_state(&self, session_id: &SessionId) -> Result<SessionState, SessionRepositoryError> {
        let file_path = self.session_file_path(session_id);
        if !file_path.exists() {
            return Err(SessionRepositoryError::NotFound(*session_id));
        }

        let yaml = fs::read_to_string(&file_path)
            .await
            .map_err(|e| SessionRepositoryError::Storage(e.to_string()))?;

        serde_yaml::from_str(&yaml).map_err(|e| SessionRepositoryError::Serialization(e.to_string()))
    }

    /// Writes to a sibling temp file, then renames over the target.
    async fn write_state(&self, state: &SessionState) -> Result<(), SessionRepositoryError> {
        self.ensure_dir().await?;

        let yaml = serde_yaml::to_string(state)
            .map_err(|e| SessionRepositoryError::Serialization(e.to_string()))?;

        let file_path = self.session_file_path(&state.session_id);
        let tmp_path = file_path.with_extension("yaml.tmp");

        fs::write(&tmp_path, yaml)
            .await
            .map_err(|e| SessionRepositoryError::Storage(e.to_string()))?;
        fs::rename(&tmp_path, &file_path)
            .await
            .map_err(|e| SessionRepositoryError::Storage(e.to_string()))
    }
}

#[async_trait]
impl SessionRepository for FileSessionRepository {
    async fn create(&self, state: &SessionState) -> Result<(), SessionRepositoryError> {
        let _guard = self.write_lock.lock().await;

        if self.session_file_path(&state.session_id).exists() {
            return Err(SessionRepositoryError::AlreadyExists(state.session_id));
        }
        self.write_state(state).await
    }

    async fn load(&self, session_id: &SessionId) -> Result<SessionState, SessionRepositoryError> {
        self.read_state(session_id).await
    }

    async fn save(
        &self,
        state: &SessionState,
        expected_revision: u64,
    ) -> Result<(), SessionRepositoryError> {
        let _guard = self.write_lock.lock().await;

        let stored = self.read_state(&state.session_id).await?;
        if stored.revision != expected_revision {
            tracing::warn!(
                session_id = %state.session_id,
                expected = expected_revision,
                actual = stored.revision,
                "Rejected stale session write"
            );
            return Err(SessionRepositoryError::ConcurrentModification {
                session_id: state.session_id,
                expected: expected_revision,
                actual: stored.revision,
            });
        }

        self.write_state(state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{PhaseId, UserId, VignetteId};
    use crate::domain::simulation::Message;
    use crate::domain::vignette::{
        Difficulty, ExitCondition, ModelConfig, ModelId, Persona, PersonaEmotion, Phase,
        VignetteConfig,
    };
    use tempfile::TempDir;

    fn test_state() -> SessionState {
        let vignette = VignetteConfig::new(
            VignetteId::new("v1").unwrap(),
            "Test",
            Persona::new("Maria", "Daughter", PersonaEmotion::Angry),
            vec![Phase::new(
                PhaseId::new("open").unwrap(),
                1,
                "Open",
                ExitCondition::after_turns(3),
            )],
            ModelConfig::new(ModelId::Scripted),
        );
        SessionState::new(&vignette, Difficulty::Advanced, UserId::new("u1").unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_file_repository_create_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileSessionRepository::new(temp_dir.path());
        let state = test_state();

        repo.create(&state).await.unwrap();
        let loaded = repo.load(&state.session_id).await.unwrap();

        assert_eq!(loaded, state);
        assert!(repo.session_file_path(&state.session_id).exists());
    }

    #[tokio::test]
    async fn test_file_repository_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileSessionRepository::new(temp_dir.path().join("nested").join("sessions"));

        repo.create(&test_state()).await.unwrap();
    }

    #[tokio::test]
    async fn test_file_repository_load_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileSessionRepository::new(temp_dir.path());

        let result = repo.load(&SessionId::new()).await;

        assert!(matches!(result, Err(SessionRepositoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_file_repository_save_updates_state() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileSessionRepository::new(temp_dir.path());
        let mut state = test_state();
        repo.create(&state).await.unwrap();

        state.history.push(Message::trainee("Hello"));
        state.revision = 1;
        repo.save(&state, 0).await.unwrap();

        let loaded = repo.load(&state.session_id).await.unwrap();
        assert_eq!(loaded.revision, 1);
        assert_eq!(loaded.history.len(), 1);
    }

    #[tokio::test]
    async fn test_file_repository_rejects_stale_revision() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileSessionRepository::new(temp_dir.path());
        let mut state = test_state();
        repo.create(&state).await.unwrap();

        state.revision = 1;
        repo.save(&state, 0).await.unwrap();
        let result = repo.save(&state, 0).await;

        assert!(matches!(
            result,
            Err(SessionRepositoryError::ConcurrentModification { actual: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_file_repository_save_requires_create() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileSessionRepository::new(temp_dir.path());

        let result = repo.save(&test_state(), 0).await;

        assert!(matches!(result, Err(SessionRepositoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_file_repository_corrupt_file_is_serialization_error() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileSessionRepository::new(temp_dir.path());
        let id = SessionId::new();
        std::fs::write(repo.session_file_path(&id), "not: [valid").unwrap();

        let result = repo.load(&id).await;

        assert!(matches!(result, Err(SessionRepositoryError::Serialization(_))));
    }
}
