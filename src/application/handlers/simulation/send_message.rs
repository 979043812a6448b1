//! SendMessageHandler - Run one trainee turn and persist the result.
//!
//! The session is saved with compare-and-swap on the revision read at the
//! start of the turn. If another turn on the same session was persisted in
//! the meantime, this turn's result is discarded and the caller gets
//! `ConcurrentModification`.

use std::sync::Arc;

use crate::domain::foundation::SessionId;
use crate::domain::simulation::{AssessmentSummary, ConversationEngine, EngineError, TurnResult};
use crate::ports::{
    ModelProvider, SessionRepository, SessionRepositoryError, VignetteLookupError, VignetteStore,
};

/// Command to send a trainee message
#[derive(Debug, Clone)]
pub struct SendMessageCommand {
    pub session_id: SessionId,
    pub message: String,
}

/// Result of sending a message
#[derive(Debug, Clone)]
pub struct SendMessageResult {
    pub turn: TurnResult,
    /// Debrief summary, present once the session has completed.
    pub summary: Option<AssessmentSummary>,
}

/// Error type for sending messages
#[derive(Debug, thiserror::Error)]
pub enum SendMessageError {
    #[error(transparent)]
    Vignette(#[from] VignetteLookupError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Repository(#[from] SessionRepositoryError),
}

impl SendMessageError {
    /// Returns true if resending the same message may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SendMessageError::Engine(err) => err.is_retryable(),
            SendMessageError::Repository(SessionRepositoryError::ConcurrentModification { .. }) => {
                true
            }
            _ => false,
        }
    }
}

/// Handler for trainee messages
pub struct SendMessageHandler<P: ?Sized + ModelProvider> {
    vignettes: Arc<dyn VignetteStore>,
    sessions: Arc<dyn SessionRepository>,
    engine: Arc<ConversationEngine<P>>,
}

impl<P: ?Sized + ModelProvider> SendMessageHandler<P> {
    pub fn new(
        vignettes: Arc<dyn VignetteStore>,
        sessions: Arc<dyn SessionRepository>,
        engine: Arc<ConversationEngine<P>>,
    ) -> Self {
        Self {
            vignettes,
            sessions,
            engine,
        }
    }

    pub async fn handle(
        &self,
        cmd: SendMessageCommand,
    ) -> Result<SendMessageResult, SendMessageError> {
        // 1. Load the session and its vignette
        let state = self.sessions.load(&cmd.session_id).await?;
        let vignette = self.vignettes.get_vignette(&state.vignette_id).await?;

        // 2. Run the turn; on failure nothing is persisted
        let turn = self
            .engine
            .process_message(&vignette, &state, &cmd.message)
            .await?;

        // 3. Persist against the revision we read
        if let Err(err) = self.sessions.save(&turn.state, state.revision).await {
            if matches!(err, SessionRepositoryError::ConcurrentModification { .. }) {
                tracing::warn!(
                    session_id = %cmd.session_id,
                    revision = state.revision,
                    "Discarding turn after concurrent modification"
                );
            }
            return Err(err.into());
        }

        let summary = turn
            .session_complete()
            .then(|| turn.state.assessment.summary(&vignette));

        Ok(SendMessageResult { turn, summary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::adapters::ai::{MockError, MockModelProvider};
    use crate::adapters::storage::{InMemorySessionRepository, InMemoryVignetteStore};
    use crate::domain::foundation::{PhaseId, UserId, VignetteId};
    use crate::domain::simulation::{EngineSettings, SessionState, SessionStatus};
    use crate::domain::vignette::{
        Difficulty, ExitCondition, ModelConfig, ModelId, Persona, PersonaEmotion, Phase,
        VignetteConfig,
    };

    fn vignette() -> VignetteConfig {
        VignetteConfig::new(
            VignetteId::new("upset-daughter").unwrap(),
            "Delayed diagnosis",
            Persona::new("Maria", "Daughter", PersonaEmotion::Upset),
            vec![Phase::new(
                PhaseId::new("only").unwrap(),
                1,
                "Hear her out",
                ExitCondition::after_turns(2),
            )],
            ModelConfig::new(ModelId::Scripted),
        )
    }

    struct Fixture {
        handler: SendMessageHandler<MockModelProvider>,
        sessions: Arc<InMemorySessionRepository>,
        state: SessionState,
    }

    async fn setup(provider: MockModelProvider) -> Fixture {
        let v = vignette();
        let vignettes = Arc::new(InMemoryVignetteStore::new());
        vignettes.insert(v.clone()).await.unwrap();
        let sessions = Arc::new(InMemorySessionRepository::new());
        let engine = Arc::new(ConversationEngine::new(
            Arc::new(provider),
            EngineSettings::default(),
        ));

        let state = engine
            .start_session(&v, Difficulty::Beginner, UserId::new("trainee-1").unwrap())
            .unwrap();
        sessions.create(&state).await.unwrap();

        Fixture {
            handler: SendMessageHandler::new(vignettes, sessions.clone(), engine),
            sessions,
            state,
        }
    }

    fn command(session_id: SessionId, message: &str) -> SendMessageCommand {
        SendMessageCommand {
            session_id,
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn persists_turn() {
        let f = setup(MockModelProvider::new().with_response("Who are you?")).await;

        let result = f
            .handler
            .handle(command(f.state.session_id, "Hello"))
            .await
            .unwrap();

        assert_eq!(result.turn.response_text, "Who are you?");
        assert!(result.summary.is_none());
        let stored = f.sessions.load(&f.state.session_id).await.unwrap();
        assert_eq!(stored.revision, 1);
        assert_eq!(stored.history.len(), 2);
    }

    #[tokio::test]
    async fn generation_failure_persists_nothing() {
        let f = setup(MockModelProvider::new().with_error(MockError::Timeout { timeout_secs: 30 }))
            .await;

        let err = f
            .handler
            .handle(command(f.state.session_id, "Hello"))
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(f.sessions.load(&f.state.session_id).await.unwrap(), f.state);
    }

    #[tokio::test]
    async fn completion_includes_summary() {
        let f = setup(MockModelProvider::new()).await;

        f.handler
            .handle(command(f.state.session_id, "Hello"))
            .await
            .unwrap();
        let result = f
            .handler
            .handle(command(f.state.session_id, "I understand."))
            .await
            .unwrap();

        assert_eq!(result.turn.state.status, SessionStatus::Complete);
        assert!(result.summary.is_some());
    }

    #[tokio::test]
    async fn concurrent_turns_persist_only_one() {
        let f = setup(MockModelProvider::new().with_delay(Duration::from_millis(20))).await;

        // Both turns read revision 0 before either saves
        let (a, b) = tokio::join!(
            f.handler.handle(command(f.state.session_id, "One")),
            f.handler.handle(command(f.state.session_id, "Two")),
        );

        let failures: Vec<_> = [a, b].into_iter().filter_map(Result::err).collect();
        assert_eq!(failures.len(), 1);
        assert!(matches!(
            failures[0],
            SendMessageError::Repository(SessionRepositoryError::ConcurrentModification { .. })
        ));
        assert!(failures[0].is_retryable());

        let stored = f.sessions.load(&f.state.session_id).await.unwrap();
        assert_eq!(stored.revision, 1);
        assert_eq!(stored.history.len(), 2);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let f = setup(MockModelProvider::new()).await;

        let result = f.handler.handle(command(SessionId::new(), "Hello")).await;

        assert!(matches!(
            result,
            Err(SendMessageError::Repository(SessionRepositoryError::NotFound(_)))
        ));
    }
}
