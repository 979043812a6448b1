//! Mock Model Provider - the scripted backend.
//!
//! Serves `ModelId::Scripted` vignettes and lets tests run without calling
//! real model APIs.
//!
//! # Features
//!
//! - Pre-configured replies, consumed in order
//! - A fallback reply once the script runs out
//! - Simulated delays for timeout testing
//! - Error injection for retry testing
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let provider = MockModelProvider::new()
//!     .with_response("Where is the doctor?")
//!     .with_error(MockError::Timeout { timeout_secs: 30 });
//!
//! let reply = provider.generate(request).await?;
//! assert_eq!(reply, "Where is the doctor?");
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{GenerationFailure, GenerationRequest, ModelProvider};

/// Reply used once the script is exhausted.
const DEFAULT_REPLY: &str = "I'm listening. Go on.";

/// Mock provider for tests and offline runs.
#[derive(Debug, Clone)]
pub struct MockModelProvider {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    default_reply: String,
    delay: Duration,
    calls: Arc<Mutex<Vec<GenerationRequest>>>,
}

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Reply(String),
    Error(MockError),
}

/// Mock error types for testing error handling.
#[derive(Debug, Clone)]
pub enum MockError {
    RateLimited { retry_after_secs: u64 },
    Unavailable { message: String },
    AuthenticationFailed,
    Network { message: String },
    Timeout { timeout_secs: u64 },
    EmptyResponse,
}

impl From<MockError> for GenerationFailure {
    fn from(err: MockError) -> Self {
        match err {
            MockError::RateLimited { retry_after_secs } => {
                GenerationFailure::rate_limited(Some(retry_after_secs))
            }
            MockError::Unavailable { message } => GenerationFailure::unavailable(message),
            MockError::AuthenticationFailed => GenerationFailure::AuthenticationFailed,
            MockError::Network { message } => GenerationFailure::network(message),
            MockError::Timeout { timeout_secs } => GenerationFailure::timeout(timeout_secs),
            MockError::EmptyResponse => GenerationFailure::EmptyResponse,
        }
    }
}

impl Default for MockModelProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockModelProvider {
    /// Creates a new mock provider with default settings.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            default_reply: DEFAULT_REPLY.to_string(),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a reply to the queue.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.push(MockResponse::Reply(content.into()));
        self
    }

    /// Adds several replies to the queue.
    pub fn with_responses<S: Into<String>>(self, replies: impl IntoIterator<Item = S>) -> Self {
        for reply in replies {
            self.push(MockResponse::Reply(reply.into()));
        }
        self
    }

    /// Adds an error to the queue.
    pub fn with_error(self, error: MockError) -> Self {
        self.push(MockResponse::Error(error));
        self
    }

    /// Sets the reply used once the queue is empty.
    pub fn with_default_reply(mut self, reply: impl Into<String>) -> Self {
        self.default_reply = reply.into();
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns the number of calls made to this provider.
    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns all recorded calls.
    pub fn get_calls(&self) -> Vec<GenerationRequest> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Clears the call history.
    pub fn clear_calls(&self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn push(&self, response: MockResponse) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    fn next_response(&self) -> MockResponse {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| MockResponse::Reply(self.default_reply.clone()))
    }
}

#[async_trait]
impl ModelProvider for MockModelProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationFailure> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_response() {
            MockResponse::Reply(text) => Ok(text),
            MockResponse::Error(err) => Err(err.into()),
        }
    }
}
