//! Anthropic Provider - ModelProvider over Anthropic's Messages API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = AnthropicConfig::new(api_key)
//!     .with_base_url("https://api.anthropic.com");
//!
//! let provider = AnthropicProvider::new(config);
//! ```
//!
//! The model is taken from each request, not from the config, so one
//! provider serves every Claude model a vignette may name.

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::vignette::{BackendKind, ModelId};
use crate::ports::{ChatRole, GenerationFailure, GenerationRequest, ModelProvider};

/// Configuration for the Anthropic provider.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    api_key: Secret<String>,
    /// Base URL for the API (default: https://api.anthropic.com).
    pub base_url: String,
    /// HTTP request timeout.
    pub timeout: Duration,
}

impl AnthropicConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            base_url: "https://api.anthropic.com".to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Anthropic API version header value.
const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Stand-in first turn when a request carries no history.
const EMPTY_HISTORY_PLACEHOLDER: &str = "(The trainee enters the room.)";

/// Anthropic API provider implementation.
pub struct AnthropicProvider {
    config: AnthropicConfig,
    client: Client,
}

impl AnthropicProvider {
    /// Creates a new Anthropic provider with the given configuration.
    pub fn new(config: AnthropicConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();

        Self { config, client }
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
    }

    /// Converts a generation request to Anthropic's wire format.
    fn to_anthropic_request(request: &GenerationRequest) -> AnthropicRequest {
        let mut messages: Vec<AnthropicMessage> = request
            .history
            .iter()
            .map(|msg| AnthropicMessage {
                role: match msg.role {
                    ChatRole::User => "user",
                    ChatRole::Assistant => "assistant",
                }
                .to_string(),
                content: msg.content.clone(),
            })
            .collect();

        // Anthropic requires at least one user turn
        if messages.is_empty() {
            messages.push(AnthropicMessage {
                role: "user".to_string(),
                content: EMPTY_HISTORY_PLACEHOLDER.to_string(),
            });
        }

        AnthropicRequest {
            model: request.model.api_name().to_string(),
            messages,
            system: request.system_prompt.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    async fn send_request(&self, request: &GenerationRequest) -> Result<Response, GenerationFailure> {
        self.client
            .post(self.messages_url())
            .header("x-api-key", self.config.api_key())
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .header("Content-Type", "application/json")
            .json(&Self::to_anthropic_request(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationFailure::timeout(self.config.timeout.as_secs())
                } else if e.is_connect() {
                    GenerationFailure::network(format!("Connection failed: {}", e))
                } else {
                    GenerationFailure::network(e.to_string())
                }
            })
    }

    /// Maps non-success statuses to failures.
    async fn handle_response_status(response: Response) -> Result<Response, GenerationFailure> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let error_body = response.text().await.unwrap_or_default();

        Err(map_status(status.as_u16(), retry_after, &error_body))
    }

    async fn parse_response(response: Response) -> Result<String, GenerationFailure> {
        let response = Self::handle_response_status(response).await?;

        let anthropic_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| GenerationFailure::malformed(format!("Failed to parse response: {}", e)))?;

        Ok(anthropic_response.text())
    }
}

/// Maps an Anthropic error status to a generation failure.
fn map_status(status: u16, retry_after: Option<u64>, error_body: &str) -> GenerationFailure {
    match status {
        401 | 403 => GenerationFailure::AuthenticationFailed,
        429 => GenerationFailure::rate_limited(retry_after),
        400 => GenerationFailure::malformed(format!("Request rejected: {}", error_body)),
        // 529 is Anthropic's "overloaded"
        500..=599 => GenerationFailure::unavailable(format!("Server error {}: {}", status, error_body)),
        _ => GenerationFailure::network(format!("Unexpected status {}: {}", status, error_body)),
    }
}

#[async_trait]
impl ModelProvider for AnthropicProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationFailure> {
        if request.model.backend() != BackendKind::Anthropic {
            return Err(GenerationFailure::UnsupportedModel(request.model));
        }

        tracing::debug!(
            model = request.model.api_name(),
            history_len = request.history.len(),
            "Sending Anthropic request"
        );

        let response = self.send_request(&request).await?;
        Self::parse_response(response).await
    }

    fn supports_model(&self, model: ModelId) -> bool {
        model.backend() == BackendKind::Anthropic
    }
}

// ----- Anthropic API Types -----

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    system: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

impl AnthropicResponse {
    fn text(self) -> String {
        self.content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("")
    }
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}
