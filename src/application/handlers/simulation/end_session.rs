//! EndSessionHandler - Close a session early and produce its debrief.

use std::sync::Arc;

use crate::domain::foundation::SessionId;
use crate::domain::simulation::{AssessmentSummary, ConversationEngine, EngineError, SessionState};
use crate::ports::{
    ModelProvider, SessionRepository, SessionRepositoryError, VignetteLookupError, VignetteStore,
};

/// Command to end a session
#[derive(Debug, Clone)]
pub struct EndSessionCommand {
    pub session_id: SessionId,
}

/// Result of ending a session
#[derive(Debug, Clone)]
pub struct EndSessionResult {
    pub state: SessionState,
    pub summary: AssessmentSummary,
}

/// Error type for ending sessions
#[derive(Debug, thiserror::Error)]
pub enum EndSessionError {
    #[error(transparent)]
    Vignette(#[from] VignetteLookupError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Repository(#[from] SessionRepositoryError),
}

/// Handler for ending sessions
pub struct EndSessionHandler<P: ?Sized + ModelProvider> {
    vignettes: Arc<dyn VignetteStore>,
    sessions: Arc<dyn SessionRepository>,
    engine: Arc<ConversationEngine<P>>,
}

impl<P: ?Sized + ModelProvider> EndSessionHandler<P> {
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

    pub async fn handle(&self, cmd: EndSessionCommand) -> Result<EndSessionResult, EndSessionError> {
        let state = self.sessions.load(&cmd.session_id).await?;
        let vignette = self.vignettes.get_vignette(&state.vignette_id).await?;

        let ended = self.engine.end_session(&state, &vignette)?;
        self.sessions.save(&ended, state.revision).await?;

        let summary = ended.assessment.summary(&vignette);
        Ok(EndSessionResult {
            state: ended,
            summary,
        })
    }
}
