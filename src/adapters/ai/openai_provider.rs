//! OpenAI Provider - ModelProvider over OpenAI's chat completions API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIConfig::new(api_key)
//!     .with_base_url("https://api.openai.com/v1");
//!
//! let provider = OpenAIProvider::new(config);
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::vignette::{BackendKind, ModelId};
use crate::ports::{ChatRole, GenerationFailure, GenerationRequest, ModelProvider};

/// Configuration for the OpenAI provider.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    api_key: Secret<String>,
    /// Base URL for the API (default: https://api.openai.com/v1).
    pub base_url: String,
    /// HTTP request timeout.
    pub timeout: Duration,
}

impl OpenAIConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            base_url: "https://api.openai.com/v1".to_string(),
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

/// OpenAI API provider implementation.
pub struct OpenAIProvider {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIProvider {
    /// Creates a new OpenAI provider with the given configuration.
    pub fn new(config: OpenAIConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();

        Self { config, client }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Converts a generation request to OpenAI's wire format.
    ///
    /// The system prompt travels as the first message.
    fn to_openai_request(request: &GenerationRequest) -> OpenAIRequest {
        let mut messages = Vec::with_capacity(request.history.len() + 1);
        messages.push(OpenAIMessage {
            role: "system".to_string(),
            content: Some(request.system_prompt.clone()),
        });

        for msg in &request.history {
            messages.push(OpenAIMessage {
                role: match msg.role {
                    ChatRole::User => "user",
                    ChatRole::Assistant => "assistant",
                }
                .to_string(),
                content: Some(msg.content.clone()),
            });
        }

        OpenAIRequest {
            model: request.model.api_name().to_string(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    async fn send_request(&self, request: &GenerationRequest) -> Result<Response, GenerationFailure> {
        self.client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header("Content-Type", "application/json")
            .json(&Self::to_openai_request(request))
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

    async fn handle_response_status(response: Response) -> Result<Response, GenerationFailure> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let header_retry = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let error_body = response.text().await.unwrap_or_default();

        Err(match status.as_u16() {
            401 | 403 => GenerationFailure::AuthenticationFailed,
            429 => GenerationFailure::rate_limited(
                header_retry.or_else(|| parse_retry_after(&error_body)),
            ),
            400 => GenerationFailure::malformed(format!("Request rejected: {}", error_body)),
            500..=599 => {
                GenerationFailure::unavailable(format!("Server error {}: {}", status, error_body))
            }
            _ => GenerationFailure::network(format!("Unexpected status {}: {}", status, error_body)),
        })
    }

    async fn parse_response(response: Response) -> Result<String, GenerationFailure> {
        let response = Self::handle_response_status(response).await?;

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| GenerationFailure::malformed(format!("Failed to parse response: {}", e)))?;

        openai_response.into_text()
    }
}

/// Extracts "try again in Ns" from an OpenAI error body.
fn parse_retry_after(error_body: &str) -> Option<u64> {
    let parsed = serde_json::from_str::<serde_json::Value>(error_body).ok()?;
    let message = parsed.get("error")?.get("message")?.as_str()?;
    let idx = message.find("try again in ")?;
    let rest = &message[idx + "try again in ".len()..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

#[async_trait]
impl ModelProvider for OpenAIProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationFailure> {
        if request.model.backend() != BackendKind::OpenAI {
            return Err(GenerationFailure::UnsupportedModel(request.model));
        }

        tracing::debug!(
            model = request.model.api_name(),
            history_len = request.history.len(),
            "Sending OpenAI request"
        );

        let response = self.send_request(&request).await?;
        Self::parse_response(response).await
    }

    fn supports_model(&self, model: ModelId) -> bool {
        model.backend() == BackendKind::OpenAI
    }
}

// ----- OpenAI API Types -----

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

impl OpenAIResponse {
    fn into_text(self) -> Result<String, GenerationFailure> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GenerationFailure::malformed("No choices in response"))?;
        Ok(choice.message.content.unwrap_or_default())
    }
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}
