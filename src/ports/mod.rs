//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the simulation domain and the outside world. Adapters implement these
//! ports.
//!
//! ## Generation
//!
//! - `ModelProvider` - Language-model backend that voices the persona
//!
//! ## Content and persistence
//!
//! - `VignetteStore` - Read-only scenario definitions
//! - `SessionRepository` - Session state with optimistic concurrency
//!
//! ## Narration
//!
//! - `SpeechSynthesizer` - Text-to-speech for persona voice lines

mod model_provider;
mod session_repository;
mod speech_synthesizer;
mod vignette_store;

pub use model_provider::{ChatMessage, ChatRole, GenerationFailure, GenerationRequest, ModelProvider};
pub use session_repository::{SessionRepository, SessionRepositoryError};
pub use speech_synthesizer::{SpeechError, SpeechSynthesizer, SynthesizedAudio};
pub use vignette_store::{VignetteLookupError, VignetteStore};
