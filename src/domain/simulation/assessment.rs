//! Rubric assessment of trainee messages.
//!
//! Each turn scores the trainee's message on the active phase's focus
//! dimensions and folds the result into a per-dimension running mean. Critical
//! error flags are tracked separately from the numbers and only ever grow.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::domain::vignette::{
    CriticalErrorFlag, Difficulty, Phase, RubricDimension, VignetteConfig, MAX_DIMENSION_SCORE,
    MIN_DIMENSION_SCORE,
};

use super::matching::{phrase_refs, TriggerMatcher};
use super::scoring::RubricScorer;

/// Samples after which a dimension's mean is fully trusted in the summary.
pub const FULL_CONFIDENCE_SAMPLES: u32 = 3;

/// Accumulated assessment for a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssessmentState {
    /// Running mean of every contribution made to each dimension.
    pub per_dimension_score: BTreeMap<RubricDimension, f64>,
    /// Number of contributions behind each mean.
    pub sample_count: BTreeMap<RubricDimension, u32>,
    pub flags: BTreeSet<CriticalErrorFlag>,
}

impl AssessmentState {
    /// Returns the running mean for a dimension, if it has been scored.
    pub fn score(&self, dimension: RubricDimension) -> Option<f64> {
        self.per_dimension_score.get(&dimension).copied()
    }

    /// Returns the number of samples for a dimension.
    pub fn samples(&self, dimension: RubricDimension) -> u32 {
        self.sample_count.get(&dimension).copied().unwrap_or(0)
    }

    /// Folds one contribution into the running mean and returns the new mean.
    pub fn record(&mut self, dimension: RubricDimension, contribution: f64) -> f64 {
        let n = self.samples(dimension) + 1;
        let old = self.score(dimension).unwrap_or(0.0);
        let mean = old + (contribution - old) / f64::from(n);

        self.per_dimension_score.insert(dimension, mean);
        self.sample_count.insert(dimension, n);
        mean
    }

    /// Raises a flag. Returns true if it was not already set.
    pub fn raise(&mut self, flag: CriticalErrorFlag) -> bool {
        self.flags.insert(flag)
    }

    /// Returns true if scores and counts describe the same dimensions with
    /// positive counts and in-range means.
    pub fn is_consistent(&self) -> bool {
        let same_keys = self
            .per_dimension_score
            .keys()
            .eq(self.sample_count.keys());
        let counts_positive = self.sample_count.values().all(|n| *n > 0);
        let scores_in_range = self
            .per_dimension_score
            .values()
            .all(|s| s.is_finite() && (MIN_DIMENSION_SCORE..=MAX_DIMENSION_SCORE).contains(s));
        same_keys && counts_positive && scores_in_range
    }

    /// Builds a confidence-weighted summary using the vignette's weights.
    pub fn summary(&self, vignette: &VignetteConfig) -> AssessmentSummary {
        let dimensions: Vec<DimensionSummary> = self
            .per_dimension_score
            .iter()
            .map(|(dimension, mean)| {
                let samples = self.samples(*dimension);
                DimensionSummary {
                    dimension: *dimension,
                    mean: *mean,
                    samples,
                    confidence: confidence(samples),
                    weight: vignette.rubric_weight(*dimension),
                }
            })
            .collect();

        let (weighted, total) = dimensions.iter().fold((0.0, 0.0), |(sum, total), d| {
            let w = d.weight * d.confidence;
            (sum + d.mean * w, total + w)
        });
        let overall = if total > 0.0 { Some(weighted / total) } else { None };

        AssessmentSummary {
            overall,
            dimensions,
            flags: self.flags.clone(),
        }
    }
}

fn confidence(samples: u32) -> f64 {
    (f64::from(samples) / f64::from(FULL_CONFIDENCE_SAMPLES)).min(1.0)
}

/// Debrief view of a session's assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSummary {
    /// Weighted overall score; `None` until something has been scored.
    pub overall: Option<f64>,
    pub dimensions: Vec<DimensionSummary>,
    pub flags: BTreeSet<CriticalErrorFlag>,
}

/// One dimension's line in the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionSummary {
    pub dimension: RubricDimension,
    pub mean: f64,
    pub samples: u32,
    /// `min(samples / 3, 1)`.
    pub confidence: f64,
    pub weight: f64,
}

/// What one turn did to the assessment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssessmentUpdate {
    /// Score this message earned on each focus dimension.
    pub contributions: BTreeMap<RubricDimension, f64>,
    /// Change in each dimension's running mean (from 0.0 on first sample).
    pub dimension_deltas: BTreeMap<RubricDimension, f64>,
    /// Flags raised for the first time this turn.
    pub new_flags: BTreeSet<CriticalErrorFlag>,
    /// Every flag set on the session after this turn.
    pub flags: BTreeSet<CriticalErrorFlag>,
}

/// Scores trainee messages and maintains the running assessment.
#[derive(Clone)]
pub struct AssessmentEngine {
    scorer: Arc<dyn RubricScorer>,
    matcher: Arc<dyn TriggerMatcher>,
}

impl AssessmentEngine {
    /// Creates an engine from scoring and matching strategies.
    pub fn new(scorer: Arc<dyn RubricScorer>, matcher: Arc<dyn TriggerMatcher>) -> Self {
        Self { scorer, matcher }
    }

    /// Returns the difficulty-adjusted contribution for one dimension.
    pub fn contribution(&self, dimension: RubricDimension, message: &str, difficulty: Difficulty) -> f64 {
        let raw = self
            .scorer
            .score(dimension, message)
            .clamp(MIN_DIMENSION_SCORE, MAX_DIMENSION_SCORE);
        (raw * difficulty.scoring_factor()).clamp(MIN_DIMENSION_SCORE, MAX_DIMENSION_SCORE)
    }

    /// Returns the critical error flags a message triggers.
    pub fn detect_flags(&self, message: &str, vignette: &VignetteConfig) -> BTreeSet<CriticalErrorFlag> {
        let mut flags = BTreeSet::new();
        if !self
            .matcher
            .find_matches(message, &phrase_refs(&vignette.disallowed_phrases))
            .is_empty()
        {
            flags.insert(CriticalErrorFlag::DisallowedLanguage);
        }
        if !self
            .matcher
            .find_matches(message, &phrase_refs(&vignette.contradicting_claims))
            .is_empty()
        {
            flags.insert(CriticalErrorFlag::FactContradiction);
        }
        flags
    }

    /// Assesses one message against the prior state.
    ///
    /// Pure: returns the next state instead of mutating `prior`, so assessing
    /// the same message against the same prior twice yields the same result.
    pub fn assess(
        &self,
        prior: &AssessmentState,
        message: &str,
        vignette: &VignetteConfig,
        phase: &Phase,
        difficulty: Difficulty,
    ) -> (AssessmentState, AssessmentUpdate) {
        let mut next = prior.clone();
        let mut update = AssessmentUpdate::default();

        for dimension in &phase.rubric_focus {
            let contribution = self.contribution(*dimension, message, difficulty);
            let before = prior.score(*dimension).unwrap_or(0.0);
            let after = next.record(*dimension, contribution);

            update.contributions.insert(*dimension, contribution);
            update.dimension_deltas.insert(*dimension, after - before);
        }

        for flag in self.detect_flags(message, vignette) {
            if next.raise(flag) {
                update.new_flags.insert(flag);
            }
        }
        update.flags = next.flags.clone();

        (next, update)
    }
}

impl fmt::Debug for AssessmentEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssessmentEngine").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{PhaseId, VignetteId};
    use crate::domain::simulation::{KeywordRubricScorer, KeywordTriggerMatcher};
    use crate::domain::vignette::{ExitCondition, ModelConfig, ModelId, Persona, PersonaEmotion};

    fn engine() -> AssessmentEngine {
        AssessmentEngine::new(
            Arc::new(KeywordRubricScorer::new()),
            Arc::new(KeywordTriggerMatcher::new()),
        )
    }

    fn phase(focus: &[RubricDimension]) -> Phase {
        Phase::new(
            PhaseId::new("explore").unwrap(),
            1,
            "Explore concerns",
            ExitCondition::after_turns(5),
        )
        .with_rubric_focus(focus.iter().copied())
    }

    fn vignette() -> VignetteConfig {
        VignetteConfig::new(
            VignetteId::new("v1").unwrap(),
            "Test",
            Persona::new("Maria", "Daughter", PersonaEmotion::Upset),
            vec![phase(&[])],
            ModelConfig::new(ModelId::Scripted),
        )
        .with_disallowed_phrases(["shut up"])
        .with_contradicting_claims(["the surgery went perfectly"])
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    mod running_mean {
        use super::*;

        #[test]
        fn mean_of_contributions() {
            let mut state = AssessmentState::default();
            state.record(RubricDimension::Empathy, 1.0);
            state.record(RubricDimension::Empathy, 4.0);
            state.record(RubricDimension::Empathy, 4.0);

            assert!(approx(state.score(RubricDimension::Empathy).unwrap(), 3.0));
            assert_eq!(state.samples(RubricDimension::Empathy), 3);
        }

        #[test]
        fn unscored_dimension_has_no_mean() {
            let state = AssessmentState::default();
            assert_eq!(state.score(RubricDimension::Clarity), None);
            assert_eq!(state.samples(RubricDimension::Clarity), 0);
        }

        #[test]
        fn mismatched_counts_are_inconsistent() {
            let mut state = AssessmentState::default();
            state.per_dimension_score.insert(RubricDimension::Clarity, 2.0);
            assert!(!state.is_consistent());

            state.sample_count.insert(RubricDimension::Clarity, 1);
            assert!(state.is_consistent());
        }
    }

    mod assess {
        use super::*;

        #[test]
        fn only_focus_dimensions_are_scored() {
            let (state, update) = engine().assess(
                &AssessmentState::default(),
                "I'm sorry. The next step is a scan.",
                &vignette(),
                &phase(&[RubricDimension::Empathy]),
                Difficulty::Intermediate,
            );

            assert_eq!(update.contributions.len(), 1);
            assert!(state.score(RubricDimension::Clarity).is_none());
            assert!(approx(state.score(RubricDimension::Empathy).unwrap(), 2.5));
        }

        #[test]
        fn difficulty_scales_contribution() {
            let e = engine();
            let message = "I'm sorry.";
            let beginner = e.contribution(RubricDimension::Empathy, message, Difficulty::Beginner);
            let advanced = e.contribution(RubricDimension::Empathy, message, Difficulty::Advanced);
            assert!(approx(beginner, 2.75));
            assert!(approx(advanced, 2.25));
        }

        #[test]
        fn scaled_contribution_stays_in_range() {
            let message =
                "I understand, I'm sorry, that must be hard, I hear you, it sounds like, I can see";
            let c = engine().contribution(RubricDimension::Empathy, message, Difficulty::Beginner);
            assert_eq!(c, MAX_DIMENSION_SCORE);
        }

        #[test]
        fn deltas_are_relative_to_prior_mean() {
            let e = engine();
            let p = phase(&[RubricDimension::Empathy]);
            let (first, _) = e.assess(
                &AssessmentState::default(),
                "I'm sorry.",
                &vignette(),
                &p,
                Difficulty::Intermediate,
            );
            let (_, update) = e.assess(&first, "Okay.", &vignette(), &p, Difficulty::Intermediate);
            // mean goes from 2.5 to (2.5 + 1.0) / 2
            assert!(approx(update.dimension_deltas[&RubricDimension::Empathy], -0.75));
        }

        #[test]
        fn prior_state_is_untouched() {
            let prior = AssessmentState::default();
            let _ = engine().assess(
                &prior,
                "I'm sorry.",
                &vignette(),
                &phase(&[RubricDimension::Empathy]),
                Difficulty::Intermediate,
            );
            assert_eq!(prior, AssessmentState::default());
        }
    }

    mod flags {
        use super::*;

        #[test]
        fn disallowed_phrase_raises_flag() {
            let (state, update) = engine().assess(
                &AssessmentState::default(),
                "Please just shut up for a second.",
                &vignette(),
                &phase(&[]),
                Difficulty::Intermediate,
            );
            assert!(update.new_flags.contains(&CriticalErrorFlag::DisallowedLanguage));
            assert!(state.flags.contains(&CriticalErrorFlag::DisallowedLanguage));
        }

        #[test]
        fn contradicting_claim_raises_flag() {
            let flags =
                engine().detect_flags("Honestly, the surgery went perfectly.", &vignette());
            assert_eq!(
                flags,
                BTreeSet::from([CriticalErrorFlag::FactContradiction])
            );
        }

        #[test]
        fn flags_persist_without_repetition() {
            let e = engine();
            let p = phase(&[]);
            let (after_violation, _) = e.assess(
                &AssessmentState::default(),
                "shut up",
                &vignette(),
                &p,
                Difficulty::Intermediate,
            );
            let (later, update) =
                e.assess(&after_violation, "I'm sorry.", &vignette(), &p, Difficulty::Intermediate);

            assert!(update.new_flags.is_empty());
            assert!(update.flags.contains(&CriticalErrorFlag::DisallowedLanguage));
            assert!(later.flags.contains(&CriticalErrorFlag::DisallowedLanguage));
        }

        #[test]
        fn repeated_violation_is_not_new() {
            let e = engine();
            let p = phase(&[]);
            let (first, _) = e.assess(
                &AssessmentState::default(),
                "shut up",
                &vignette(),
                &p,
                Difficulty::Intermediate,
            );
            let (_, update) = e.assess(&first, "shut up", &vignette(), &p, Difficulty::Intermediate);
            assert!(update.new_flags.is_empty());
        }
    }

    mod summary {
        use super::*;

        #[test]
        fn empty_assessment_has_no_overall() {
            let summary = AssessmentState::default().summary(&vignette());
            assert_eq!(summary.overall, None);
        }

        #[test]
        fn low_sample_dimensions_count_less() {
            let mut state = AssessmentState::default();
            for _ in 0..3 {
                state.record(RubricDimension::Empathy, 4.0);
            }
            state.record(RubricDimension::Clarity, 1.0);

            let summary = state.summary(&vignette());
            // weights: empathy 1.0 * 1.0, clarity 1.0 * 1/3
            let expected = (4.0 * 1.0 + 1.0 * (1.0 / 3.0)) / (1.0 + 1.0 / 3.0);
            assert!(approx(summary.overall.unwrap(), expected));
        }

        #[test]
        fn rubric_weights_apply() {
            let mut state = AssessmentState::default();
            for _ in 0..3 {
                state.record(RubricDimension::Empathy, 4.0);
                state.record(RubricDimension::Clarity, 1.0);
            }
            let weighted = vignette().with_rubric_weight(RubricDimension::Clarity, 0.0);

            let summary = state.summary(&weighted);
            assert!(approx(summary.overall.unwrap(), 4.0));
        }
    }
}
