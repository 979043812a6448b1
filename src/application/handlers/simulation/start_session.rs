//! StartSessionHandler - Look up a vignette and open a new session.

use std::sync::Arc;

use crate::domain::foundation::{UserId, VignetteId};
use crate::domain::simulation::{ConversationEngine, EngineError, SessionState};
use crate::domain::vignette::{Difficulty, VoiceLine};
use crate::ports::{
    ModelProvider, SessionRepository, SessionRepositoryError, VignetteLookupError, VignetteStore,
};

/// Command to start a simulation session
#[derive(Debug, Clone)]
pub struct StartSessionCommand {
    pub vignette_id: VignetteId,
    pub difficulty: Difficulty,
    pub user_id: UserId,
}

/// Result of starting a session
#[derive(Debug, Clone)]
pub struct StartSessionResult {
    pub state: SessionState,
    /// The persona's authored opening line, if any.
    pub opening_line: Option<String>,
}

/// Error type for starting sessions
#[derive(Debug, thiserror::Error)]
pub enum StartSessionError {
    #[error(transparent)]
    Vignette(#[from] VignetteLookupError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Repository(#[from] SessionRepositoryError),
}

/// Handler for starting simulation sessions
pub struct StartSessionHandler<P: ?Sized + ModelProvider> {
    vignettes: Arc<dyn VignetteStore>,
    sessions: Arc<dyn SessionRepository>,
    engine: Arc<ConversationEngine<P>>,
}

impl<P: ?Sized + ModelProvider> StartSessionHandler<P> {
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
        cmd: StartSessionCommand,
    ) -> Result<StartSessionResult, StartSessionError> {
        // 1. Fetch the active, validated vignette
        let vignette = self.vignettes.get_vignette(&cmd.vignette_id).await?;

        // 2. Build the initial state
        let state = self
            .engine
            .start_session(&vignette, cmd.difficulty, cmd.user_id)?;

        // 3. Persist it
        self.sessions.create(&state).await?;

        let opening_line = vignette
            .persona
            .voice
            .as_ref()
            .and_then(|voice| voice.line(VoiceLine::Opening))
            .map(str::to_string);

        Ok(StartSessionResult {
            state,
            opening_line,
        })
    }
}
