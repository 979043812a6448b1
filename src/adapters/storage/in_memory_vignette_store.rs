//! In-Memory Vignette Store Adapter
//!
//! Holds validated vignettes in memory. Useful for tests and for embedding
//! a fixed scenario set.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::VignetteId;
use crate::domain::vignette::VignetteConfig;
use crate::ports::{VignetteLookupError, VignetteStore};

/// In-memory vignette store
#[derive(Debug, Clone, Default)]
pub struct InMemoryVignetteStore {
    vignettes: Arc<RwLock<BTreeMap<VignetteId, Arc<VignetteConfig>>>>,
}

impl InMemoryVignetteStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a vignette after validating it, replacing any with the same id.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` if the vignette fails validation; nothing is stored.
    pub async fn insert(&self, vignette: VignetteConfig) -> Result<(), VignetteLookupError> {
        vignette
            .validate()
            .map_err(|source| VignetteLookupError::Invalid {
                id: vignette.id.clone(),
                source,
            })?;

        self.vignettes
            .write()
            .await
            .insert(vignette.id.clone(), Arc::new(vignette));
        Ok(())
    }

    /// Get the number of stored vignettes, active or not
    pub async fn vignette_count(&self) -> usize {
        self.vignettes.read().await.len()
    }
}

#[async_trait]
impl VignetteStore for InMemoryVignetteStore {
    async fn get_vignette(&self, id: &VignetteId) -> Result<Arc<VignetteConfig>, VignetteLookupError> {
        let vignettes = self.vignettes.read().await;
        let vignette = vignettes
            .get(id)
            .ok_or_else(|| VignetteLookupError::NotFound(id.clone()))?;

        if !vignette.active {
            return Err(VignetteLookupError::Inactive(id.clone()));
        }
        Ok(Arc::clone(vignette))
    }

    async fn list_active(&self) -> Result<Vec<Arc<VignetteConfig>>, VignetteLookupError> {
        Ok(self
            .vignettes
            .read()
            .await
            .values()
            .filter(|v| v.active)
            .cloned()
            .collect())
    }
}
