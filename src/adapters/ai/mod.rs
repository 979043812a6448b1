//! Model Provider Adapters.
//!
//! Implementations of the ModelProvider port.
//!
//! ## Available Adapters
//!
//! - `MockModelProvider` - Scripted backend for tests and offline runs
//! - `OpenAIProvider` - OpenAI GPT models
//! - `AnthropicProvider` - Anthropic Claude models
//! - `ProviderRouter` - Dispatches each request to the backend for its model

mod anthropic_provider;
mod mock_provider;
mod openai_provider;
mod router;

pub use anthropic_provider::{AnthropicConfig, AnthropicProvider};
pub use mock_provider::{MockError, MockModelProvider, MockResponse};
pub use openai_provider::{OpenAIConfig, OpenAIProvider};
pub use router::{ModelBackend, ProviderRouter};
