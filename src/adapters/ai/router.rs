//! Provider Router - dispatches each request to the backend serving its model.
//!
//! Vignettes name a model, and `ModelId::for_difficulty` may swap it for a
//! sibling, so a single session can need a different backend from the one
//! the vignette was authored against. The router holds one backend per
//! family and picks by `ModelId::backend()`.
//!
//! # Example
//!
//! ```ignore
//! let router = ProviderRouter::new()
//!     .with_backend(ModelBackend::Anthropic(AnthropicProvider::new(config)))
//!     .with_backend(ModelBackend::Scripted(MockModelProvider::new()));
//!
//! if let Some(model) = router.missing_model(&vignette) {
//!     return Err(GenerationFailure::UnsupportedModel(model));
//! }
//! ```

use async_trait::async_trait;
use std::collections::HashMap;

use crate::domain::vignette::{BackendKind, ModelId, VignetteConfig};
use crate::ports::{GenerationFailure, GenerationRequest, ModelProvider};

use super::{AnthropicProvider, MockModelProvider, OpenAIProvider};

/// A configured model backend.
pub enum ModelBackend {
    Anthropic(AnthropicProvider),
    OpenAI(OpenAIProvider),
    Scripted(MockModelProvider),
}

impl ModelBackend {
    /// Returns the model family this backend serves.
    pub fn kind(&self) -> BackendKind {
        match self {
            ModelBackend::Anthropic(_) => BackendKind::Anthropic,
            ModelBackend::OpenAI(_) => BackendKind::OpenAI,
            ModelBackend::Scripted(_) => BackendKind::Scripted,
        }
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationFailure> {
        match self {
            ModelBackend::Anthropic(p) => p.generate(request).await,
            ModelBackend::OpenAI(p) => p.generate(request).await,
            ModelBackend::Scripted(p) => p.generate(request).await,
        }
    }
}

/// Routes generation requests to the backend for the requested model.
///
/// A scripted backend only serves `ModelId::Scripted`; it is never used as a
/// fallback for real models.
#[derive(Default)]
pub struct ProviderRouter {
    backends: HashMap<BackendKind, ModelBackend>,
}

impl ProviderRouter {
    /// Creates a router with no backends.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a backend, replacing any previous one of the same kind.
    pub fn with_backend(mut self, backend: ModelBackend) -> Self {
        self.backends.insert(backend.kind(), backend);
        self
    }

    /// Returns true if a backend of the given kind is configured.
    pub fn has_backend(&self, kind: BackendKind) -> bool {
        self.backends.contains_key(&kind)
    }

    /// Returns the configured backend kinds.
    pub fn backend_kinds(&self) -> Vec<BackendKind> {
        let mut kinds: Vec<_> = self.backends.keys().copied().collect();
        kinds.sort_by_key(|k| k.to_string());
        kinds
    }

    /// Returns the first model the vignette can need that has no backend.
    ///
    /// Checks the resolved model at every difficulty the vignette offers.
    pub fn missing_model(&self, vignette: &VignetteConfig) -> Option<ModelId> {
        vignette
            .difficulty_levels
            .iter()
            .map(|d| vignette.model_config.model_id.for_difficulty(*d))
            .find(|model| !self.has_backend(model.backend()))
    }

    /// Returns true if every model the vignette can need has a backend.
    pub fn supports(&self, vignette: &VignetteConfig) -> bool {
        self.missing_model(vignette).is_none()
    }
}

#[async_trait]
impl ModelProvider for ProviderRouter {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationFailure> {
        let backend = self
            .backends
            .get(&request.model.backend())
            .ok_or(GenerationFailure::UnsupportedModel(request.model))?;
        backend.generate(request).await
    }

    fn supports_model(&self, model: ModelId) -> bool {
        self.has_backend(model.backend())
    }
}
