//! Model selection for persona voicing.
//!
//! Models are a closed set. An unknown model name fails when the vignette is
//! deserialized, so a bad `model_id` is a configuration error rather than a
//! mid-session surprise.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Difficulty;

/// Backend family that serves a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Anthropic,
    OpenAI,
    /// Deterministic scripted backend used in tests and offline demos.
    Scripted,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BackendKind::Anthropic => "anthropic",
            BackendKind::OpenAI => "openai",
            BackendKind::Scripted => "scripted",
        };
        write!(f, "{}", s)
    }
}

/// Supported persona models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelId {
    #[serde(rename = "claude-opus")]
    ClaudeOpus,
    #[serde(rename = "claude-sonnet")]
    ClaudeSonnet,
    #[serde(rename = "claude-haiku")]
    ClaudeHaiku,
    #[serde(rename = "gpt-4o")]
    Gpt4o,
    #[serde(rename = "gpt-4o-mini")]
    Gpt4oMini,
    #[serde(rename = "scripted")]
    Scripted,
}

impl ModelId {
    /// Returns the backend family that serves this model.
    pub fn backend(&self) -> BackendKind {
        match self {
            ModelId::ClaudeOpus | ModelId::ClaudeSonnet | ModelId::ClaudeHaiku => {
                BackendKind::Anthropic
            }
            ModelId::Gpt4o | ModelId::Gpt4oMini => BackendKind::OpenAI,
            ModelId::Scripted => BackendKind::Scripted,
        }
    }

    /// Returns the provider's wire name for the model.
    pub fn api_name(&self) -> &'static str {
        match self {
            ModelId::ClaudeOpus => "claude-opus-4-20250514",
            ModelId::ClaudeSonnet => "claude-sonnet-4-20250514",
            ModelId::ClaudeHaiku => "claude-3-5-haiku-20241022",
            ModelId::Gpt4o => "gpt-4o",
            ModelId::Gpt4oMini => "gpt-4o-mini",
            ModelId::Scripted => "scripted",
        }
    }

    /// Returns the model actually used at the given difficulty.
    ///
    /// Advanced sessions route the lighter models of each family to the
    /// more capable sibling; everything else is used as authored.
    pub fn for_difficulty(&self, difficulty: Difficulty) -> ModelId {
        match (self, difficulty) {
            (ModelId::ClaudeHaiku, Difficulty::Advanced) => ModelId::ClaudeSonnet,
            (ModelId::Gpt4oMini, Difficulty::Advanced) => ModelId::Gpt4o,
            (model, _) => *model,
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.api_name())
    }
}

/// Generation settings authored on the vignette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model_id: ModelId,
    #[serde(default = "default_max_response_tokens")]
    pub max_response_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl ModelConfig {
    /// Creates a config for the given model with default limits.
    pub fn new(model_id: ModelId) -> Self {
        Self {
            model_id,
            max_response_tokens: default_max_response_tokens(),
            temperature: default_temperature(),
        }
    }
}

fn default_max_response_tokens() -> u32 {
    300
}

fn default_temperature() -> f32 {
    0.8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_model_fails_to_deserialize() {
        let result: Result<ModelId, _> = serde_json::from_str("\"llama-70b\"");
        assert!(result.is_err());
    }

    #[test]
    fn known_models_deserialize() {
        let model: ModelId = serde_json::from_str("\"gpt-4o-mini\"").unwrap();
        assert_eq!(model, ModelId::Gpt4oMini);
        assert_eq!(model.backend(), BackendKind::OpenAI);
    }

    #[test]
    fn advanced_difficulty_upgrades_light_models() {
        assert_eq!(
            ModelId::ClaudeHaiku.for_difficulty(Difficulty::Advanced),
            ModelId::ClaudeSonnet
        );
        assert_eq!(
            ModelId::Gpt4oMini.for_difficulty(Difficulty::Advanced),
            ModelId::Gpt4o
        );
    }

    #[test]
    fn other_difficulties_keep_authored_model() {
        assert_eq!(
            ModelId::ClaudeHaiku.for_difficulty(Difficulty::Beginner),
            ModelId::ClaudeHaiku
        );
        assert_eq!(
            ModelId::ClaudeOpus.for_difficulty(Difficulty::Advanced),
            ModelId::ClaudeOpus
        );
    }

    #[test]
    fn model_config_defaults_fill_in() {
        let config: ModelConfig = serde_json::from_str(r#"{"model_id":"claude-sonnet"}"#).unwrap();
        assert_eq!(config.max_response_tokens, 300);
        assert!((config.temperature - 0.8).abs() < f32::EPSILON);
    }
}
