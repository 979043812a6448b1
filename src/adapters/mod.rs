//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Model backends (Anthropic, OpenAI, scripted) and the provider router
//! - `storage` - Session repositories and vignette stores (in-memory, YAML files)
//! - `speech` - Speech synthesis for persona voice lines

pub mod ai;
pub mod speech;
pub mod storage;

pub use ai::{MockModelProvider, ProviderRouter};
pub use speech::MockSpeechSynthesizer;
pub use storage::{
    FileSessionRepository, FileVignetteStore, InMemorySessionRepository, InMemoryVignetteStore,
};
