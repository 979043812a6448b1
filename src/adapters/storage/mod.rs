//! Storage Adapters
//!
//! Implementations of the SessionRepository and VignetteStore ports.
//!
//! ## Available Adapters
//!
//! - **FileSessionRepository** - Sessions as YAML files, compare-and-swap on revision
//! - **InMemorySessionRepository** - Sessions in memory (testing/development)
//! - **FileVignetteStore** - Vignettes from a directory of YAML files
//! - **InMemoryVignetteStore** - Vignettes in memory (testing/embedding)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{FileSessionRepository, FileVignetteStore};
//!
//! let sessions = FileSessionRepository::new("./data/sessions");
//! let vignettes = FileVignetteStore::new("./vignettes");
//! ```

mod file_session_repository;
mod file_vignette_store;
mod in_memory_session_repository;
mod in_memory_vignette_store;

pub use file_session_repository::FileSessionRepository;
pub use file_vignette_store::FileVignetteStore;
pub use in_memory_session_repository::InMemorySessionRepository;
pub use in_memory_vignette_store::InMemoryVignetteStore;
