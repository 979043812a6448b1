//! File-based Vignette Store Adapter
//!
//! Reads vignettes from a directory of YAML files, one per vignette, named
//! `<vignette-id>.yaml`. Files are parsed and validated on every lookup, so
//! edits take effect for the next session without a restart.

use async_trait::async_trait;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

use crate::domain::foundation::VignetteId;
use crate::domain::vignette::{VignetteConfig, VignetteConfigError};
use crate::ports::{VignetteLookupError, VignetteStore};

/// File-based vignette store
#[derive(Debug, Clone)]
pub struct FileVignetteStore {
    base_path: PathBuf,
}

impl FileVignetteStore {
    /// Create a store reading from `base_path`
    ///
    /// # Example
    /// ```ignore
    /// let store = FileVignetteStore::new("./vignettes");
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn vignette_file_path(&self, id: &VignetteId) -> PathBuf {
        self.base_path.join(format!("{}.yaml", id))
    }

    /// Parses and validates one file.
    ///
    /// `expected` is the id implied by the file name; a file whose `id`
    /// field disagrees with its name is invalid.
    async fn read_vignette(
        &self,
        path: &Path,
        expected: &VignetteId,
    ) -> Result<VignetteConfig, VignetteLookupError> {
        let yaml = fs::read_to_string(path)
            .await
            .map_err(|e| VignetteLookupError::Storage(e.to_string()))?;

        let invalid = |source: VignetteConfigError| VignetteLookupError::Invalid {
            id: expected.clone(),
            source,
        };

        let vignette: VignetteConfig =
            serde_yaml::from_str(&yaml).map_err(|e| invalid(VignetteConfigError::Parse(e.to_string())))?;

        if &vignette.id != expected {
            return Err(invalid(VignetteConfigError::Parse(format!(
                "file declares id '{}'",
                vignette.id
            ))));
        }
        vignette.validate().map_err(invalid)?;

        Ok(vignette)
    }
}

#[async_trait]
impl VignetteStore for FileVignetteStore {
    async fn get_vignette(&self, id: &VignetteId) -> Result<Arc<VignetteConfig>, VignetteLookupError> {
        let path = self.vignette_file_path(id);
        if !path.exists() {
            return Err(VignetteLookupError::NotFound(id.clone()));
        }

        let vignette = self.read_vignette(&path, id).await?;
        if !vignette.active {
            return Err(VignetteLookupError::Inactive(id.clone()));
        }
        Ok(Arc::new(vignette))
    }

    /// Lists active vignettes. Files that fail to parse or validate are
    /// logged and skipped.
    async fn list_active(&self) -> Result<Vec<Arc<VignetteConfig>>, VignetteLookupError> {
        let mut entries = fs::read_dir(&self.base_path)
            .await
            .map_err(|e| VignetteLookupError::Storage(e.to_string()))?;

        let mut candidates = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| VignetteLookupError::Storage(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| VignetteId::new(s).ok())
            else {
                continue;
            };
            candidates.push((path, id));
        }

        let loaded = join_all(
            candidates
                .iter()
                .map(|(path, id)| self.read_vignette(path, id)),
        )
        .await;

        let mut vignettes = Vec::new();
        for ((_, id), result) in candidates.iter().zip(loaded) {
            match result {
                Ok(vignette) if vignette.active => vignettes.push(Arc::new(vignette)),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(vignette_id = %id, error = %e, "Skipping unusable vignette file");
                }
            }
        }

        vignettes.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(vignettes)
    }
}
