//! The vignette aggregate: an immutable, versioned scenario definition.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::domain::foundation::{PhaseId, VignetteId};

use super::{
    Difficulty, EmotionThreshold, ModelConfig, Persona, Phase, RubricDimension,
    VignetteConfigError, MAX_DIMENSION_SCORE, MIN_DIMENSION_SCORE,
};

/// Static definition of a role-play scenario.
///
/// Supplied by an external content store and treated as read-only by the
/// engine, so one instance can be shared across any number of sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VignetteConfig {
    pub id: VignetteId,
    #[serde(default = "default_version")]
    pub version: u32,
    pub title: String,
    #[serde(default = "default_category")]
    pub category: String,
    /// Inactive vignettes are kept for history but refuse new sessions.
    #[serde(default = "default_active")]
    pub active: bool,
    pub difficulty_levels: BTreeSet<Difficulty>,
    pub persona: Persona,
    /// Grounding context handed to the model, in authored order.
    #[serde(default)]
    pub facts: Vec<String>,
    /// Phrases that intensify the persona's distress.
    #[serde(default)]
    pub escalation_triggers: BTreeSet<String>,
    /// Phrases that soothe the persona.
    #[serde(default)]
    pub deescalation_cues: BTreeSet<String>,
    /// Phrases a trainee must never use.
    #[serde(default)]
    pub disallowed_phrases: Vec<String>,
    /// Statements that contradict `facts` if the trainee asserts them.
    #[serde(default)]
    pub contradicting_claims: Vec<String>,
    pub phases: Vec<Phase>,
    /// Relative weight of each dimension in the overall score.
    #[serde(default)]
    pub rubric_weights: BTreeMap<RubricDimension, f64>,
    pub model_config: ModelConfig,
}

fn default_version() -> u32 {
    1
}

fn default_active() -> bool {
    true
}

fn default_category() -> String {
    "general".to_string()
}

impl VignetteConfig {
    /// Creates a vignette offering every difficulty, with no triggers or facts.
    pub fn new(
        id: VignetteId,
        title: impl Into<String>,
        persona: Persona,
        phases: Vec<Phase>,
        model_config: ModelConfig,
    ) -> Self {
        Self {
            id,
            version: default_version(),
            title: title.into(),
            category: default_category(),
            active: true,
            difficulty_levels: Difficulty::all().iter().copied().collect(),
            persona,
            facts: Vec::new(),
            escalation_triggers: BTreeSet::new(),
            deescalation_cues: BTreeSet::new(),
            disallowed_phrases: Vec::new(),
            contradicting_claims: Vec::new(),
            phases,
            rubric_weights: BTreeMap::new(),
            model_config,
        }
    }

    /// Sets the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Sets the version.
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Restricts the offered difficulty levels.
    pub fn with_difficulty_levels(mut self, levels: impl IntoIterator<Item = Difficulty>) -> Self {
        self.difficulty_levels = levels.into_iter().collect();
        self
    }

    /// Sets the grounding facts.
    pub fn with_facts<S: Into<String>>(mut self, facts: impl IntoIterator<Item = S>) -> Self {
        self.facts = facts.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the escalation triggers.
    pub fn with_escalation_triggers<S: Into<String>>(
        mut self,
        triggers: impl IntoIterator<Item = S>,
    ) -> Self {
        self.escalation_triggers = triggers.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the de-escalation cues.
    pub fn with_deescalation_cues<S: Into<String>>(
        mut self,
        cues: impl IntoIterator<Item = S>,
    ) -> Self {
        self.deescalation_cues = cues.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the disallowed phrases.
    pub fn with_disallowed_phrases<S: Into<String>>(
        mut self,
        phrases: impl IntoIterator<Item = S>,
    ) -> Self {
        self.disallowed_phrases = phrases.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the claims that contradict the facts.
    pub fn with_contradicting_claims<S: Into<String>>(
        mut self,
        claims: impl IntoIterator<Item = S>,
    ) -> Self {
        self.contradicting_claims = claims.into_iter().map(Into::into).collect();
        self
    }

    /// Sets a rubric weight.
    pub fn with_rubric_weight(mut self, dimension: RubricDimension, weight: f64) -> Self {
        self.rubric_weights.insert(dimension, weight);
        self
    }

    /// Marks the vignette inactive.
    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }

    /// Checks every structural invariant the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns the first `VignetteConfigError` found.
    pub fn validate(&self) -> Result<(), VignetteConfigError> {
        if self.title.trim().is_empty() {
            return Err(VignetteConfigError::MissingField("title"));
        }
        if self.persona.name.trim().is_empty() {
            return Err(VignetteConfigError::MissingField("persona.name"));
        }
        if self.persona.role.trim().is_empty() {
            return Err(VignetteConfigError::MissingField("persona.role"));
        }
        if self.difficulty_levels.is_empty() {
            return Err(VignetteConfigError::NoDifficultyLevels);
        }
        if let Some(unknown) = self
            .persona
            .traits
            .keys()
            .find(|d| !self.difficulty_levels.contains(d))
        {
            return Err(VignetteConfigError::UnknownTraitDifficulty(*unknown));
        }

        self.validate_phases()?;
        self.validate_model_config()?;

        if let Some((dimension, _)) = self
            .rubric_weights
            .iter()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(VignetteConfigError::InvalidRubricWeight(*dimension));
        }

        Ok(())
    }

    fn validate_phases(&self) -> Result<(), VignetteConfigError> {
        if self.phases.is_empty() {
            return Err(VignetteConfigError::NoPhases);
        }

        let mut seen = HashSet::new();
        let mut previous_order: Option<u32> = None;

        for phase in &self.phases {
            if !seen.insert(&phase.id) {
                return Err(VignetteConfigError::DuplicatePhaseId(phase.id.clone()));
            }
            if let Some(previous) = previous_order {
                if phase.order <= previous {
                    return Err(VignetteConfigError::NonMonotonicPhaseOrder {
                        phase: phase.id.clone(),
                        previous,
                        found: phase.order,
                    });
                }
            }
            previous_order = Some(phase.order);

            if phase.goal.trim().is_empty() {
                return Err(VignetteConfigError::MissingField("phase.goal"));
            }
            if phase.exit_condition.max_turns == 0 {
                return Err(VignetteConfigError::ZeroTurnCeiling(phase.id.clone()));
            }
            if !phase.escalation_sensitivity.is_finite() || phase.escalation_sensitivity < 0.0 {
                return Err(VignetteConfigError::InvalidThreshold {
                    phase: phase.id.clone(),
                    reason: "escalation_sensitivity must be finite and non-negative".to_string(),
                });
            }
            if let Some(score) = &phase.exit_condition.score_threshold {
                if !(MIN_DIMENSION_SCORE..=MAX_DIMENSION_SCORE).contains(&score.min_score) {
                    return Err(VignetteConfigError::InvalidThreshold {
                        phase: phase.id.clone(),
                        reason: format!(
                            "min_score {} outside [{}, {}]",
                            score.min_score, MIN_DIMENSION_SCORE, MAX_DIMENSION_SCORE
                        ),
                    });
                }
            }
            if let Some(emotion) = &phase.exit_condition.emotion_threshold {
                let bound = emotion.bound();
                if !(-1.0..=1.0).contains(&bound) {
                    return Err(VignetteConfigError::InvalidThreshold {
                        phase: phase.id.clone(),
                        reason: format!("emotion bound {} outside [-1, 1]", bound),
                    });
                }
                if matches!(emotion, EmotionThreshold::Below(b) if *b <= -1.0)
                    || matches!(emotion, EmotionThreshold::Above(b) if *b >= 1.0)
                {
                    return Err(VignetteConfigError::InvalidThreshold {
                        phase: phase.id.clone(),
                        reason: "emotion bound can never be crossed".to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    fn validate_model_config(&self) -> Result<(), VignetteConfigError> {
        let model = &self.model_config;
        if model.max_response_tokens == 0 {
            return Err(VignetteConfigError::InvalidModelConfig(
                "max_response_tokens must be positive".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&model.temperature) {
            return Err(VignetteConfigError::InvalidModelConfig(format!(
                "temperature {} outside [0, 2]",
                model.temperature
            )));
        }
        Ok(())
    }

    /// Returns true if trainees may play at this difficulty.
    pub fn supports_difficulty(&self, difficulty: Difficulty) -> bool {
        self.difficulty_levels.contains(&difficulty)
    }

    /// Returns the phase a new session starts in.
    pub fn initial_phase(&self) -> Option<&Phase> {
        self.phases.first()
    }

    /// Returns the last phase of the encounter.
    pub fn terminal_phase(&self) -> Option<&Phase> {
        self.phases.last()
    }

    /// Looks up a phase by id.
    pub fn phase(&self, id: &PhaseId) -> Option<&Phase> {
        self.phases.iter().find(|p| &p.id == id)
    }

    /// Returns the index of a phase in the ordered sequence.
    pub fn phase_position(&self, id: &PhaseId) -> Option<usize> {
        self.phases.iter().position(|p| &p.id == id)
    }

    /// Returns the phase after the given one, if any.
    pub fn next_phase(&self, id: &PhaseId) -> Option<&Phase> {
        self.phase_position(id)
            .and_then(|idx| self.phases.get(idx + 1))
    }

    /// Returns true if the given phase is the last one.
    pub fn is_terminal_phase(&self, id: &PhaseId) -> bool {
        self.terminal_phase().is_some_and(|p| &p.id == id)
    }

    /// Returns the weight of a dimension in the overall score (default 1.0).
    pub fn rubric_weight(&self, dimension: RubricDimension) -> f64 {
        self.rubric_weights.get(&dimension).copied().unwrap_or(1.0)
    }
}
