//! Conversation engine configuration

use serde::Deserialize;
use std::time::Duration;

use crate::domain::simulation::{EmotionPolicy, EngineSettings};

use super::error::ValidationError;

/// Engine tuning loaded from the environment
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Trainee turns of history sent to the model
    #[serde(default = "default_history_window")]
    pub history_window_turns: usize,

    /// Upper bound on one model call, in seconds
    #[serde(default = "default_generation_timeout")]
    pub generation_timeout_secs: u64,

    /// Step toward neutral applied every turn
    #[serde(default = "default_decay_step")]
    pub decay_step: f64,

    /// Increase per matched escalation trigger
    #[serde(default = "default_trigger_increment")]
    pub trigger_increment: f64,

    /// Decrease per matched de-escalation cue
    #[serde(default = "default_cue_increment")]
    pub cue_increment: f64,
}

impl EngineConfig {
    /// Builds the engine settings from this section
    pub fn settings(&self) -> EngineSettings {
        EngineSettings {
            history_window_turns: self.history_window_turns,
            generation_timeout: Duration::from_secs(self.generation_timeout_secs),
            emotion: EmotionPolicy {
                decay_step: self.decay_step,
                trigger_increment: self.trigger_increment,
                cue_increment: self.cue_increment,
            },
        }
    }

    /// Validate engine configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.history_window_turns == 0 {
            return Err(ValidationError::InvalidHistoryWindow);
        }
        if self.generation_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        for (name, value) in [
            ("decay_step", self.decay_step),
            ("trigger_increment", self.trigger_increment),
            ("cue_increment", self.cue_increment),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::InvalidEmotionSetting(name));
            }
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_window_turns: default_history_window(),
            generation_timeout_secs: default_generation_timeout(),
            decay_step: default_decay_step(),
            trigger_increment: default_trigger_increment(),
            cue_increment: default_cue_increment(),
        }
    }
}

fn default_history_window() -> usize {
    10
}

fn default_generation_timeout() -> u64 {
    30
}

fn default_decay_step() -> f64 {
    0.05
}

fn default_trigger_increment() -> f64 {
    0.25
}

fn default_cue_increment() -> f64 {
    0.15
}
