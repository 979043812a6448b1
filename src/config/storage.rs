//! Storage configuration

use serde::Deserialize;
use std::path::PathBuf;

/// Where vignettes are read from and sessions are written to
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory of `<vignette-id>.yaml` files
    #[serde(default = "default_vignette_dir")]
    pub vignette_dir: PathBuf,

    /// Directory for session state; sessions stay in memory when unset
    #[serde(default)]
    pub session_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            vignette_dir: default_vignette_dir(),
            session_dir: None,
        }
    }
}

fn default_vignette_dir() -> PathBuf {
    PathBuf::from("vignettes")
}
