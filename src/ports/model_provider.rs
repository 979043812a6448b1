//! Model Provider Port - Interface for persona text generation.
//!
//! This port abstracts the language-model backend that voices the persona.
//! The engine hands it an assembled system prompt and an already-windowed
//! message history and receives plain reply text.
//!
//! # Contract
//!
//! - Providers never mutate their inputs.
//! - Providers do not retry internally. Every failure is surfaced as a
//!   [`GenerationFailure`] and the orchestrator's caller decides whether to
//!   retry the turn.
//! - An empty or whitespace-only reply is a failure, not a success.
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//!
//! struct EchoProvider;
//!
//! #[async_trait]
//! impl ModelProvider for EchoProvider {
//!     async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationFailure> {
//!         request
//!             .history
//!             .last()
//!             .map(|m| m.content.clone())
//!             .ok_or(GenerationFailure::EmptyResponse)
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::vignette::{Difficulty, ModelConfig, ModelId};

/// Port for persona text generation.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Generates the persona's next reply.
    ///
    /// # Errors
    ///
    /// Returns `GenerationFailure` for network, timeout, rate-limit,
    /// authentication and malformed or empty responses.
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationFailure>;

    /// Returns true if this provider can serve `model`.
    ///
    /// Checked before a session starts. The default accepts every model.
    fn supports_model(&self, model: ModelId) -> bool {
        let _ = model;
        true
    }
}

/// Request for one persona reply.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Caller-assembled instructions; opaque to the provider.
    pub system_prompt: String,
    /// Windowed conversation, oldest first, ending with the trainee's message.
    pub history: Vec<ChatMessage>,
    pub model: ModelId,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl GenerationRequest {
    /// Creates a request for the given model with no history.
    pub fn new(model: ModelId, system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            history: Vec::new(),
            model,
            max_tokens: 300,
            temperature: 0.8,
        }
    }

    /// Creates a request from a vignette's model settings.
    ///
    /// The model is resolved for the trainee's difficulty, so advanced
    /// sessions may be served by a more capable model than authored.
    pub fn for_vignette(
        config: &ModelConfig,
        difficulty: Difficulty,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self::new(config.model_id.for_difficulty(difficulty), system_prompt)
            .with_max_tokens(config.max_response_tokens)
            .with_temperature(config.temperature)
    }

    /// Sets the conversation history.
    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    /// Adds a message to the history.
    pub fn with_message(mut self, role: ChatRole, content: impl Into<String>) -> Self {
        self.history.push(ChatMessage::new(role, content));
        self
    }

    /// Sets the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }

    /// Sets the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// A message in the windowed history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    /// Creates a new message.
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a trainee message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    /// Creates a persona message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

/// Who sent a history message, from the model's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// The trainee.
    User,
    /// The persona.
    Assistant,
}

/// Model generation failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationFailure {
    /// No reply arrived within the allotted time.
    #[error("generation timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Rate limited by the backend.
    #[error("rate limited by model backend")]
    RateLimited {
        /// Seconds until retry is allowed, if the backend said.
        retry_after_secs: Option<u64>,
    },

    /// Transport-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// Backend is down or overloaded.
    #[error("model backend unavailable: {0}")]
    Unavailable(String),

    /// Credentials rejected.
    #[error("authentication with model backend failed")]
    AuthenticationFailed,

    /// Backend answered with no usable text.
    #[error("model returned an empty response")]
    EmptyResponse,

    /// Backend answered with something that could not be parsed.
    #[error("malformed model response: {0}")]
    Malformed(String),

    /// No configured backend serves the requested model.
    #[error("no backend configured for model {0}")]
    UnsupportedModel(ModelId),
}

impl GenerationFailure {
    /// Creates a timeout failure.
    pub fn timeout(timeout_secs: u64) -> Self {
        Self::Timeout { timeout_secs }
    }

    /// Creates a rate-limited failure.
    pub fn rate_limited(retry_after_secs: Option<u64>) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    /// Creates a network failure.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates an unavailable failure.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Creates a malformed-response failure.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Returns true if retrying the same turn may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationFailure::Timeout { .. }
                | GenerationFailure::RateLimited { .. }
                | GenerationFailure::Network(_)
                | GenerationFailure::Unavailable(_)
                | GenerationFailure::EmptyResponse
                | GenerationFailure::Malformed(_)
        )
    }
}
