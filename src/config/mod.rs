//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `ENCOUNTER_SIM` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use encounter_sim::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Vignettes from {}", config.storage.vignette_dir.display());
//! ```

mod ai;
mod engine;
mod error;
mod logging;
mod storage;

pub use ai::AiConfig;
pub use engine::EngineConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::{LogFormat, LoggingConfig};
pub use storage::StorageConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a runnable
/// configuration backed by the scripted model and in-memory sessions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Model backends (Anthropic/OpenAI)
    #[serde(default)]
    pub ai: AiConfig,

    /// Conversation engine tuning
    #[serde(default)]
    pub engine: EngineConfig,

    /// Vignette and session directories
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `ENCOUNTER_SIM` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `ENCOUNTER_SIM__ENGINE__HISTORY_WINDOW_TURNS=6` -> `engine.history_window_turns = 6`
    /// - `ENCOUNTER_SIM__AI__ANTHROPIC_API_KEY=...` -> `ai.anthropic_api_key = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("ENCOUNTER_SIM")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ai.validate()?;
        self.engine.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "ENCOUNTER_SIM__AI__ANTHROPIC_API_KEY",
        "ENCOUNTER_SIM__ENGINE__HISTORY_WINDOW_TURNS",
        "ENCOUNTER_SIM__ENGINE__DECAY_STEP",
        "ENCOUNTER_SIM__STORAGE__SESSION_DIR",
        "ENCOUNTER_SIM__LOGGING__FORMAT",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_with_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.engine.history_window_turns, 10);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.storage.session_dir.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("ENCOUNTER_SIM__AI__ANTHROPIC_API_KEY", "sk-ant-xxx");
        env::set_var("ENCOUNTER_SIM__ENGINE__HISTORY_WINDOW_TURNS", "6");
        env::set_var("ENCOUNTER_SIM__ENGINE__DECAY_STEP", "0.1");
        env::set_var("ENCOUNTER_SIM__STORAGE__SESSION_DIR", "/tmp/sessions");
        env::set_var("ENCOUNTER_SIM__LOGGING__FORMAT", "json");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.ai.anthropic_key(), Some("sk-ant-xxx"));
        assert_eq!(config.engine.history_window_turns, 6);
        assert_eq!(config.engine.decay_step, 0.1);
        assert_eq!(
            config.storage.session_dir.as_deref(),
            Some(std::path::Path::new("/tmp/sessions"))
        );
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_validate_rejects_bad_engine_section() {
        let config = AppConfig {
            engine: EngineConfig {
                generation_timeout_secs: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidTimeout));
    }
}
