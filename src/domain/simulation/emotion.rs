//! Emotional state tracking for the persona.
//!
//! The persona's emotion is a single scalar in `[-1.0, 1.0]`. Positive values
//! are escalated (distressed, angry), negative values are calm, and `0.0` is
//! neutral. Each turn the value first regresses a fixed step toward neutral,
//! then every matched escalation trigger and de-escalation cue contributes a
//! fixed increment. Increments are summed, scaled by the active phase's
//! sensitivity and clamped once, so the result does not depend on the order
//! in which matches are found.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::domain::vignette::{Phase, PersonaEmotion, VignetteConfig};

use super::matching::{phrase_refs, TriggerMatcher};

/// Lower bound of the emotional scale (fully calm).
pub const EMOTION_MIN: f64 = -1.0;

/// Upper bound of the emotional scale (maximally distressed).
pub const EMOTION_MAX: f64 = 1.0;

/// Neutral point the value decays toward.
pub const EMOTION_NEUTRAL: f64 = 0.0;

/// Deltas smaller than this are reported as steady.
const STEADY_EPSILON: f64 = 1e-9;

/// The persona's emotional trajectory within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalState {
    /// Current value in `[EMOTION_MIN, EMOTION_MAX]`.
    pub value: f64,
    /// Every value the session has held, starting with the baseline.
    pub history: Vec<f64>,
}

impl EmotionalState {
    /// Starts a trajectory at the persona's authored baseline.
    pub fn from_baseline(emotion: PersonaEmotion) -> Self {
        let value = emotion.baseline();
        Self {
            value,
            history: vec![value],
        }
    }

    /// Records a new value.
    pub fn record(&mut self, value: f64) {
        self.value = value;
        self.history.push(value);
    }

    /// Returns true if the value and every historic value are finite and in range.
    pub fn is_well_formed(&self) -> bool {
        let in_range = |v: &f64| v.is_finite() && (EMOTION_MIN..=EMOTION_MAX).contains(v);
        in_range(&self.value)
            && !self.history.is_empty()
            && self.history.iter().all(in_range)
            && self.history.last() == Some(&self.value)
    }

    /// Returns the qualitative band for the current value.
    pub fn band(&self) -> EmotionalBand {
        EmotionalBand::for_value(self.value)
    }
}

/// Qualitative reading of the emotional value, used in prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionalBand {
    Calm,
    Settled,
    Uneasy,
    Distressed,
    Agitated,
}

impl EmotionalBand {
    /// Maps a value onto a band.
    pub fn for_value(value: f64) -> Self {
        if value < -0.3 {
            EmotionalBand::Calm
        } else if value < 0.1 {
            EmotionalBand::Settled
        } else if value < 0.4 {
            EmotionalBand::Uneasy
        } else if value < 0.7 {
            EmotionalBand::Distressed
        } else {
            EmotionalBand::Agitated
        }
    }

    /// Describes how the persona feels in this band.
    pub fn description(&self) -> &'static str {
        match self {
            EmotionalBand::Calm => "calm and receptive",
            EmotionalBand::Settled => "composed but attentive",
            EmotionalBand::Uneasy => "uneasy and guarded",
            EmotionalBand::Distressed => "distressed and struggling to listen",
            EmotionalBand::Agitated => "highly agitated, close to losing control",
        }
    }
}

impl fmt::Display for EmotionalBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Direction the emotion moved this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionalTrend {
    Escalating,
    Steady,
    Easing,
}

impl EmotionalTrend {
    /// Classifies a delta.
    pub fn for_delta(delta: f64) -> Self {
        if delta > STEADY_EPSILON {
            EmotionalTrend::Escalating
        } else if delta < -STEADY_EPSILON {
            EmotionalTrend::Easing
        } else {
            EmotionalTrend::Steady
        }
    }
}

/// Tunable knobs of the emotion update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionPolicy {
    /// Step toward neutral applied every turn before stimulus.
    pub decay_step: f64,
    /// Increase per matched escalation trigger.
    pub trigger_increment: f64,
    /// Decrease per matched de-escalation cue.
    pub cue_increment: f64,
}

impl Default for EmotionPolicy {
    fn default() -> Self {
        Self {
            decay_step: 0.05,
            trigger_increment: 0.25,
            cue_increment: 0.15,
        }
    }
}

/// Result of one emotion update.
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionUpdate {
    pub previous: f64,
    pub value: f64,
    /// `value - previous`.
    pub delta: f64,
    pub matched_triggers: BTreeSet<String>,
    pub matched_cues: BTreeSet<String>,
}

impl EmotionUpdate {
    /// Returns the direction of this update.
    pub fn trend(&self) -> EmotionalTrend {
        EmotionalTrend::for_delta(self.delta)
    }
}

/// Computes the persona's next emotional value.
#[derive(Clone)]
pub struct EmotionalStateTracker {
    matcher: Arc<dyn TriggerMatcher>,
    policy: EmotionPolicy,
}

impl EmotionalStateTracker {
    /// Creates a tracker with the given matcher and policy.
    pub fn new(matcher: Arc<dyn TriggerMatcher>, policy: EmotionPolicy) -> Self {
        Self { matcher, policy }
    }

    /// Returns the policy in effect.
    pub fn policy(&self) -> &EmotionPolicy {
        &self.policy
    }

    /// Computes the update for one trainee message.
    ///
    /// Pure: the same inputs always produce the same update.
    pub fn compute(
        &self,
        current: f64,
        message: &str,
        vignette: &VignetteConfig,
        phase: &Phase,
    ) -> EmotionUpdate {
        let decayed = decay_toward_neutral(current, self.policy.decay_step);

        let matched_triggers = self
            .matcher
            .find_matches(message, &phrase_refs(&vignette.escalation_triggers));
        let matched_cues = self
            .matcher
            .find_matches(message, &phrase_refs(&vignette.deescalation_cues));

        let stimulus = matched_triggers.len() as f64 * self.policy.trigger_increment
            - matched_cues.len() as f64 * self.policy.cue_increment;
        let value = clamp_emotion(decayed + stimulus * phase.escalation_sensitivity);

        EmotionUpdate {
            previous: current,
            value,
            delta: value - current,
            matched_triggers,
            matched_cues,
        }
    }
}

impl fmt::Debug for EmotionalStateTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmotionalStateTracker")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Moves `value` up to `step` toward neutral without crossing it.
pub fn decay_toward_neutral(value: f64, step: f64) -> f64 {
    if value > EMOTION_NEUTRAL {
        (value - step).max(EMOTION_NEUTRAL)
    } else if value < EMOTION_NEUTRAL {
        (value + step).min(EMOTION_NEUTRAL)
    } else {
        value
    }
}

/// Clamps a value onto the emotional scale.
pub fn clamp_emotion(value: f64) -> f64 {
    value.clamp(EMOTION_MIN, EMOTION_MAX)
}
