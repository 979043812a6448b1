//! SessionState - the complete, serializable record of one simulation.
//!
//! The engine never keeps a session in memory between calls. Callers load a
//! `SessionState`, hand it to the engine by reference, and persist the fresh
//! state the engine returns. Every field needed to resume a session (phase,
//! turn counters, emotional history, per-dimension sample counts) lives here
//! and round-trips through serde.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PhaseId, SessionId, Timestamp, UserId, VignetteId};
use crate::domain::vignette::{Difficulty, VignetteConfig, VignetteConfigError};

use super::assessment::AssessmentState;
use super::emotion::EmotionalState;
use super::errors::{EngineError, InputError};
use super::phase_manager::{PhaseTransition, TransitionReason};
use super::SessionStatus;

/// Who said a line of dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Trainee,
    Persona,
}

/// One line of dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Speaker,
    pub text: String,
    pub timestamp: Timestamp,
}

impl Message {
    /// Creates a trainee line stamped now.
    pub fn trainee(text: impl Into<String>) -> Self {
        Self {
            sender: Speaker::Trainee,
            text: text.into(),
            timestamp: Timestamp::now(),
        }
    }

    /// Creates a persona line stamped now.
    pub fn persona(text: impl Into<String>) -> Self {
        Self {
            sender: Speaker::Persona,
            text: text.into(),
            timestamp: Timestamp::now(),
        }
    }
}

/// State of one trainee's run through a vignette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: SessionId,
    pub vignette_id: VignetteId,
    pub vignette_version: u32,
    pub difficulty: Difficulty,
    /// Opaque attribution; the engine performs no authorization.
    pub user_id: UserId,
    pub status: SessionStatus,
    pub history: Vec<Message>,
    pub current_phase_id: PhaseId,
    /// Trainee turns taken in the current phase.
    pub phase_turn_count: u32,
    /// Trainee turns taken in the session.
    pub turn_count: u32,
    /// Every phase advance, in order.
    #[serde(default)]
    pub phase_history: Vec<PhaseTransition>,
    pub emotional_state: EmotionalState,
    pub assessment: AssessmentState,
    /// Scores earned in the current phase only; cleared on every advance.
    #[serde(default)]
    pub phase_assessment: AssessmentState,
    /// Why the terminal phase ended, once it has.
    #[serde(default)]
    pub completion_reason: Option<TransitionReason>,
    /// Optimistic-concurrency token; bumped on every successful change.
    pub revision: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl SessionState {
    /// Creates a fresh session at the vignette's first phase.
    ///
    /// # Errors
    ///
    /// - `Validation(InvalidDifficulty)` if the vignette does not offer `difficulty`
    /// - `Configuration` if the vignette has no phases
    pub fn new(
        vignette: &VignetteConfig,
        difficulty: Difficulty,
        user_id: UserId,
    ) -> Result<Self, EngineError> {
        if !vignette.supports_difficulty(difficulty) {
            return Err(InputError::InvalidDifficulty {
                difficulty,
                vignette_id: vignette.id.clone(),
            }
            .into());
        }
        let initial = vignette
            .initial_phase()
            .ok_or(VignetteConfigError::NoPhases)?;

        let now = Timestamp::now();
        Ok(Self {
            session_id: SessionId::new(),
            vignette_id: vignette.id.clone(),
            vignette_version: vignette.version,
            difficulty,
            user_id,
            status: SessionStatus::Active,
            history: Vec::new(),
            current_phase_id: initial.id.clone(),
            phase_turn_count: 0,
            turn_count: 0,
            phase_history: Vec::new(),
            emotional_state: EmotionalState::from_baseline(vignette.persona.initial_emotion),
            assessment: AssessmentState::default(),
            phase_assessment: AssessmentState::default(),
            completion_reason: None,
            revision: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns true if the session accepts new turns.
    pub fn is_active(&self) -> bool {
        self.status.accepts_turns()
    }

    /// Returns the number of trainee lines in the history.
    pub fn trainee_message_count(&self) -> usize {
        self.history
            .iter()
            .filter(|m| m.sender == Speaker::Trainee)
            .count()
    }

    /// Returns the last persona line, if any.
    pub fn last_persona_message(&self) -> Option<&Message> {
        self.history
            .iter()
            .rev()
            .find(|m| m.sender == Speaker::Persona)
    }

    /// Checks that this state belongs to `vignette` and is internally consistent.
    ///
    /// # Errors
    ///
    /// - `Validation(VignetteMismatch)` if the state was created for another
    ///   vignette or version
    /// - `Validation(InvalidDifficulty)` if the difficulty is not offered
    /// - `SessionCorrupted` if the state could not have been produced by the engine
    pub fn check_integrity(&self, vignette: &VignetteConfig) -> Result<(), EngineError> {
        if self.vignette_id != vignette.id || self.vignette_version != vignette.version {
            return Err(InputError::VignetteMismatch {
                session_vignette: self.vignette_id.clone(),
                session_version: self.vignette_version,
                vignette: vignette.id.clone(),
                version: vignette.version,
            }
            .into());
        }
        if !vignette.supports_difficulty(self.difficulty) {
            return Err(InputError::InvalidDifficulty {
                difficulty: self.difficulty,
                vignette_id: vignette.id.clone(),
            }
            .into());
        }

        let corrupted = |reason: String| -> Result<(), EngineError> {
            Err(EngineError::corrupted(self.session_id, reason))
        };

        let Some(phase) = vignette.phase(&self.current_phase_id) else {
            return corrupted(format!("unknown phase '{}'", self.current_phase_id));
        };
        if self.phase_turn_count > phase.exit_condition.max_turns {
            return corrupted(format!(
                "phase turn count {} exceeds ceiling {}",
                self.phase_turn_count, phase.exit_condition.max_turns
            ));
        }
        if self.phase_turn_count > self.turn_count {
            return corrupted("phase turn count exceeds session turn count".to_string());
        }
        if self.trainee_message_count() != self.turn_count as usize {
            return corrupted(format!(
                "turn count {} disagrees with {} trainee messages",
                self.turn_count,
                self.trainee_message_count()
            ));
        }
        if !self.emotional_state.is_well_formed() {
            return corrupted("emotional state is out of range or inconsistent".to_string());
        }
        if self.emotional_state.history.len() != self.turn_count as usize + 1 {
            return corrupted("emotional history length disagrees with turn count".to_string());
        }
        if !self.assessment.is_consistent() {
            return corrupted("assessment scores and sample counts disagree".to_string());
        }
        if self.assessment.sample_count.values().any(|n| *n > self.turn_count) {
            return corrupted("a dimension has more samples than turns".to_string());
        }
        if !self.phase_assessment.is_consistent()
            || self
                .phase_assessment
                .sample_count
                .values()
                .any(|n| *n > self.phase_turn_count)
        {
            return corrupted("phase scores disagree with the phase turn count".to_string());
        }
        if let Some(position) = vignette.phase_position(&self.current_phase_id) {
            if self.phase_history.len() != position {
                return corrupted(format!(
                    "{} recorded transitions for phase index {}",
                    self.phase_history.len(),
                    position
                ));
            }
        }

        Ok(())
    }
}
