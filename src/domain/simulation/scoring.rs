//! Per-dimension rubric heuristics.
//!
//! Scores are keyword based and approximate. The scorer is a strategy so it
//! can be swapped for a trained classifier without changing the assessment
//! engine's contract.

use crate::domain::vignette::{RubricDimension, MAX_DIMENSION_SCORE, MIN_DIMENSION_SCORE};

use super::matching::{KeywordTriggerMatcher, TriggerMatcher};

/// Produces a raw score for one dimension of one trainee message.
pub trait RubricScorer: Send + Sync {
    /// Returns a score in `[MIN_DIMENSION_SCORE, MAX_DIMENSION_SCORE]`.
    fn score(&self, dimension: RubricDimension, message: &str) -> f64;
}

/// Score a message earns on a dimension with no evidence either way.
const BASE_SCORE: f64 = 1.0;

/// Points per distinct piece of positive evidence.
const EVIDENCE_POINTS: f64 = 1.5;

/// Points lost per distinct piece of negative evidence.
const PENALTY_POINTS: f64 = 1.5;

const EMPATHY_CUES: &[&str] = &[
    "i understand",
    "i'm sorry",
    "i am sorry",
    "that must be",
    "i hear",
    "it sounds like",
    "i can see",
    "i can imagine",
];

const CLARITY_CUES: &[&str] = &[
    "next step",
    "we will",
    "i will",
    "plan",
    "going to",
    "first",
    "then",
];

const CLARITY_PENALTIES: &[&str] = &[
    "etiology",
    "idiopathic",
    "contraindicated",
    "nosocomial",
    "iatrogenic",
    "hemodynamic",
];

const LISTENING_CUES: &[&str] = &[
    "?",
    "you said",
    "you mentioned",
    "tell me more",
    "what worries you",
    "help me understand",
];

const DEESCALATION_CUES: &[&str] = &[
    "let's",
    "together",
    "take a moment",
    "i'm here",
    "we can",
    "safe",
];

const DEESCALATION_PENALTIES: &[&str] = &["calm down", "relax", "overreacting"];

const PROFESSIONALISM_CUES: &[&str] = &["please", "thank you", "my name is", "i'm dr", "i am dr"];

const PROFESSIONALISM_PENALTIES: &[&str] = &["whatever", "not my problem", "not my job"];

/// Keyword heuristics for every rubric dimension.
///
/// A message starts at a base of 1.0, gains 1.5 per distinct cue found and
/// loses 1.5 per distinct penalty phrase, clamped to the score range.
#[derive(Debug, Clone, Default)]
pub struct KeywordRubricScorer {
    matcher: KeywordTriggerMatcher,
}

impl KeywordRubricScorer {
    /// Creates a new scorer.
    pub fn new() -> Self {
        Self::default()
    }

    fn cues(dimension: RubricDimension) -> (&'static [&'static str], &'static [&'static str]) {
        match dimension {
            RubricDimension::Empathy => (EMPATHY_CUES, &[]),
            RubricDimension::Clarity => (CLARITY_CUES, CLARITY_PENALTIES),
            RubricDimension::ActiveListening => (LISTENING_CUES, &[]),
            RubricDimension::DeEscalation => (DEESCALATION_CUES, DEESCALATION_PENALTIES),
            RubricDimension::Professionalism => (PROFESSIONALISM_CUES, PROFESSIONALISM_PENALTIES),
        }
    }
}

impl RubricScorer for KeywordRubricScorer {
    fn score(&self, dimension: RubricDimension, message: &str) -> f64 {
        let (positive, negative) = Self::cues(dimension);
        let hits = self.matcher.find_matches(message, positive).len() as f64;
        let misses = self.matcher.find_matches(message, negative).len() as f64;

        (BASE_SCORE + hits * EVIDENCE_POINTS - misses * PENALTY_POINTS)
            .clamp(MIN_DIMENSION_SCORE, MAX_DIMENSION_SCORE)
    }
}
