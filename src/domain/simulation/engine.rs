//! Conversation engine - orchestrates one simulation turn.
//!
//! Per turn, in order:
//!
//! 1. reject finished sessions and empty messages
//! 2. append the trainee message
//! 3. assess it against the active phase's rubric focus
//! 4. update the persona's emotion
//! 5. evaluate the active phase's exit condition
//! 6. compose the system prompt
//! 7. ask the model provider for the persona reply
//! 8. return the reply with the new session state
//!
//! The engine holds no session state. `process_message` borrows the prior
//! state and only returns a new one on success, so after a generation
//! failure the caller still holds the untouched pre-turn state and can retry
//! with it. Steps 2 to 5 are pure functions of `(state, message)`, which makes
//! such a retry produce exactly the same assessment and emotion updates.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::{StateMachine, Timestamp, UserId};
use crate::domain::vignette::{Difficulty, VignetteConfig};
use crate::ports::{GenerationFailure, GenerationRequest, ModelProvider};

use super::assessment::{AssessmentEngine, AssessmentState, AssessmentUpdate};
use super::context::{HistoryWindow, DEFAULT_WINDOW_TURNS};
use super::emotion::{EmotionPolicy, EmotionUpdate, EmotionalStateTracker};
use super::errors::{EngineError, InputError};
use super::matching::{KeywordTriggerMatcher, TriggerMatcher};
use super::phase_manager::{PhaseDecision, PhaseManager, PhaseProgress, PhaseTransition, TransitionReason};
use super::prompt::{compose_system_prompt, PromptContext};
use super::scoring::{KeywordRubricScorer, RubricScorer};
use super::session_state::{Message, SessionState};
use super::SessionStatus;

/// Default limit on a single model call.
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Engine tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    /// Trainee turns of history sent to the model.
    pub history_window_turns: usize,
    /// Upper bound on one model call.
    pub generation_timeout: Duration,
    pub emotion: EmotionPolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            history_window_turns: DEFAULT_WINDOW_TURNS,
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
            emotion: EmotionPolicy::default(),
        }
    }
}

/// Output of one successful turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnResult {
    pub response_text: String,
    pub emotional_value: f64,
    pub emotional_delta: f64,
    /// Set if the turn moved the session into the next phase.
    pub phase_transition: Option<PhaseTransition>,
    /// Set if the turn finished the terminal phase.
    pub completion: Option<TransitionReason>,
    pub assessment_update: AssessmentUpdate,
    /// The new state for the caller to persist.
    pub state: SessionState,
}

impl TurnResult {
    /// Returns true if this turn completed the session.
    pub fn session_complete(&self) -> bool {
        self.completion.is_some()
    }
}

/// The deterministic part of a turn: everything before the model call.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedTurn {
    /// State with the trainee message, assessment, emotion and phase applied.
    pub state: SessionState,
    pub emotion: EmotionUpdate,
    pub assessment_update: AssessmentUpdate,
    pub phase_transition: Option<PhaseTransition>,
    pub completion: Option<TransitionReason>,
}

/// Orchestrates assessment, emotion, phase progression and generation.
pub struct ConversationEngine<P: ?Sized> {
    provider: Arc<P>,
    tracker: EmotionalStateTracker,
    assessor: AssessmentEngine,
    phases: PhaseManager,
    window: HistoryWindow,
    generation_timeout: Duration,
}

impl<P> ConversationEngine<P>
where
    P: ModelProvider + ?Sized,
{
    /// Creates an engine using keyword matching and keyword rubric scoring.
    pub fn new(provider: Arc<P>, settings: EngineSettings) -> Self {
        Self::with_strategies(
            provider,
            settings,
            Arc::new(KeywordTriggerMatcher::new()),
            Arc::new(KeywordRubricScorer::new()),
        )
    }

    /// Creates an engine with custom matching and scoring strategies.
    pub fn with_strategies(
        provider: Arc<P>,
        settings: EngineSettings,
        matcher: Arc<dyn TriggerMatcher>,
        scorer: Arc<dyn RubricScorer>,
    ) -> Self {
        Self {
            provider,
            tracker: EmotionalStateTracker::new(Arc::clone(&matcher), settings.emotion),
            assessor: AssessmentEngine::new(scorer, matcher),
            phases: PhaseManager::new(),
            window: HistoryWindow::new(settings.history_window_turns),
            generation_timeout: settings.generation_timeout,
        }
    }

    /// Creates the initial state for a new session.
    ///
    /// # Errors
    ///
    /// - `Configuration` if the vignette fails validation
    /// - `Validation(InvalidDifficulty)` if the difficulty is not offered
    /// - `Generation(UnsupportedModel)` if no backend serves the session's model
    pub fn start_session(
        &self,
        vignette: &VignetteConfig,
        difficulty: Difficulty,
        user_id: UserId,
    ) -> Result<SessionState, EngineError> {
        vignette.validate()?;
        let state = SessionState::new(vignette, difficulty, user_id)?;

        let model = vignette.model_config.model_id.for_difficulty(difficulty);
        if !self.provider.supports_model(model) {
            return Err(GenerationFailure::UnsupportedModel(model).into());
        }

        tracing::info!(
            session_id = %state.session_id,
            vignette_id = %vignette.id,
            difficulty = %difficulty,
            phase_id = %state.current_phase_id,
            emotional_value = state.emotional_state.value,
            "Simulation session started"
        );
        Ok(state)
    }

    /// Runs steps 1 to 5 of a turn without calling the model.
    ///
    /// # Errors
    ///
    /// - `SessionComplete` if the session is finished
    /// - `Validation` for an empty message or a state from another vignette
    /// - `SessionCorrupted` if the state fails its integrity check
    pub fn prepare_turn(
        &self,
        vignette: &VignetteConfig,
        state: &SessionState,
        message: &str,
    ) -> Result<PreparedTurn, EngineError> {
        if !state.is_active() {
            return Err(EngineError::SessionComplete {
                session_id: state.session_id,
                status: state.status,
            });
        }
        let message = message.trim();
        if message.is_empty() {
            return Err(InputError::EmptyMessage.into());
        }
        state.check_integrity(vignette)?;

        let phase = vignette
            .phase(&state.current_phase_id)
            .ok_or_else(|| EngineError::corrupted(state.session_id, "active phase vanished"))?;

        let mut next = state.clone();
        next.history.push(Message::trainee(message));
        next.turn_count += 1;
        next.phase_turn_count += 1;

        let (assessment, assessment_update) =
            self.assessor
                .assess(&state.assessment, message, vignette, phase, state.difficulty);
        next.assessment = assessment;
        for (dimension, contribution) in &assessment_update.contributions {
            next.phase_assessment.record(*dimension, *contribution);
        }

        let emotion = self
            .tracker
            .compute(state.emotional_state.value, message, vignette, phase);
        next.emotional_state.record(emotion.value);

        let progress = PhaseProgress {
            phase_turns: next.phase_turn_count,
            session_turn: next.turn_count,
            phase_assessment: &next.phase_assessment,
            emotional_value: next.emotional_state.value,
        };
        let decision = self
            .phases
            .evaluate(vignette, &state.current_phase_id, &progress)
            .ok_or_else(|| EngineError::corrupted(state.session_id, "active phase vanished"))?;

        let mut phase_transition = None;
        let mut completion = None;
        match decision {
            PhaseDecision::Remain => {}
            PhaseDecision::Advance(transition) => {
                next.current_phase_id = transition.to.clone();
                next.phase_turn_count = 0;
                next.phase_assessment = AssessmentState::default();
                next.phase_history.push(transition.clone());
                phase_transition = Some(transition);
            }
            PhaseDecision::Complete(reason) => {
                next.status = next
                    .status
                    .transition_to(SessionStatus::Complete)
                    .map_err(|e| EngineError::corrupted(state.session_id, e.to_string()))?;
                next.completion_reason = Some(reason);
                completion = Some(reason);
            }
        }

        tracing::debug!(
            session_id = %state.session_id,
            turn = next.turn_count,
            emotional_value = emotion.value,
            delta = emotion.delta,
            triggers = emotion.matched_triggers.len(),
            new_flags = assessment_update.new_flags.len(),
            "Turn assessed"
        );

        Ok(PreparedTurn {
            state: next,
            emotion,
            assessment_update,
            phase_transition,
            completion,
        })
    }

    /// Processes one trainee message and returns the persona's reply.
    ///
    /// On error the caller's `state` is untouched and is the state to retry
    /// with.
    ///
    /// # Errors
    ///
    /// Everything [`ConversationEngine::prepare_turn`] returns, plus
    /// `Generation` if the model fails or times out.
    pub async fn process_message(
        &self,
        vignette: &VignetteConfig,
        state: &SessionState,
        message: &str,
    ) -> Result<TurnResult, EngineError> {
        let prepared = self.prepare_turn(vignette, state, message)?;
        let PreparedTurn {
            mut state,
            emotion,
            assessment_update,
            phase_transition,
            completion,
        } = prepared;

        let prompt_phase = vignette
            .phase(&state.current_phase_id)
            .ok_or_else(|| EngineError::corrupted(state.session_id, "active phase vanished"))?;
        let system_prompt = compose_system_prompt(&PromptContext {
            vignette,
            phase: prompt_phase,
            difficulty: state.difficulty,
            emotional_value: emotion.value,
            emotional_delta: emotion.delta,
            closing: completion.is_some(),
        });

        let window = self.window.build(&state.history);
        let request =
            GenerationRequest::for_vignette(&vignette.model_config, state.difficulty, system_prompt)
                .with_history(window.messages);

        let response_text = match self.generate(request).await {
            Ok(text) => text,
            Err(failure) => {
                tracing::warn!(
                    session_id = %state.session_id,
                    turn = state.turn_count,
                    retryable = failure.is_retryable(),
                    error = %failure,
                    "Persona generation failed"
                );
                return Err(failure.into());
            }
        };

        state.history.push(Message::persona(response_text.clone()));
        state.revision += 1;
        state.updated_at = Timestamp::now();

        if let Some(transition) = &phase_transition {
            tracing::info!(
                session_id = %state.session_id,
                from = %transition.from,
                to = %transition.to,
                reason = %transition.reason,
                "Phase advanced"
            );
        }
        if let Some(reason) = &completion {
            tracing::info!(
                session_id = %state.session_id,
                turns = state.turn_count,
                reason = %reason,
                "Simulation session complete"
            );
        }

        Ok(TurnResult {
            response_text,
            emotional_value: emotion.value,
            emotional_delta: emotion.delta,
            phase_transition,
            completion,
            assessment_update,
            state,
        })
    }

    /// Ends a session at the caller's request.
    ///
    /// # Errors
    ///
    /// - `SessionComplete` if the session is already finished
    /// - `Validation` or `SessionCorrupted` if the state fails its integrity
    ///   check against `vignette`
    pub fn end_session(
        &self,
        state: &SessionState,
        vignette: &VignetteConfig,
    ) -> Result<SessionState, EngineError> {
        if !state.is_active() {
            return Err(EngineError::SessionComplete {
                session_id: state.session_id,
                status: state.status,
            });
        }
        state.check_integrity(vignette)?;

        let mut next = state.clone();
        next.status = next
            .status
            .transition_to(SessionStatus::Ended)
            .map_err(|e| EngineError::corrupted(state.session_id, e.to_string()))?;
        next.revision += 1;
        next.updated_at = Timestamp::now();

        tracing::info!(
            session_id = %state.session_id,
            turns = state.turn_count,
            "Simulation session ended by caller"
        );
        Ok(next)
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationFailure> {
        let reply = tokio::time::timeout(self.generation_timeout, self.provider.generate(request))
            .await
            .map_err(|_| GenerationFailure::timeout(self.generation_timeout.as_secs()))??;

        let reply = reply.trim();
        if reply.is_empty() {
            return Err(GenerationFailure::EmptyResponse);
        }
        Ok(reply.to_string())
    }
}
