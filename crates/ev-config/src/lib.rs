//! # ev-config
//!
//! Layered configuration loading for Evidentia using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`EVIDENTIA_*` prefix, `__` as separator)
//! 2. An explicit config file passed by the caller (e.g. `evd --config`)
//! 3. Project-level `.evidentia/config.toml`
//! 4. User-level `~/.config/evidentia/config.toml`
//! 5. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `EVIDENTIA_LLM__API_KEY` -> `llm.api_key`,
//! `EVIDENTIA_INDEXING__TOP_K` -> `indexing.top_k`, etc.
//! The `__` (double underscore) separates nested config sections.
//!
//! # Usage
//!
//! ```no_run
//! use ev_config::EvConfig;
//!
//! let config = EvConfig::load_with_dotenv().expect("config");
//! config.validate().expect("valid config");
//!
//! if config.llm.is_configured() {
//!     println!("model: {}", config.llm.model);
//! }
//! ```

mod embedding;
mod error;
mod evaluation;
mod indexing;
mod llm;

pub use embedding::{EmbeddingConfig, EmbeddingProvider};
pub use error::ConfigError;
pub use evaluation::EvaluationConfig;
pub use indexing::IndexingConfig;
pub use llm::LlmConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EvConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub indexing: IndexingConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

impl EvConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need
    /// `.env` file loading.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment(None).extract().map_err(ConfigError::from)
    }

    /// Load configuration with `.env` file support.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Load configuration with an extra TOML file layered above the standard
    /// files and below the environment.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::figment(Some(path))
            .extract()
            .map_err(ConfigError::from)
    }

    /// Build the figment provider chain.
    ///
    /// This is public so tests can inspect the figment directly or add
    /// additional providers on top.
    pub fn figment(explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".evidentia/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Caller-supplied file
        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }

        // Layer 4: Environment variables (highest priority)
        figment.merge(Env::prefixed("EVIDENTIA_").split("__"))
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("evidentia").join("config.toml"))
    }

    /// Check cross-field constraints figment cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &str, reason: String| {
            Err(ConfigError::InvalidValue {
                field: field.to_string(),
                reason,
            })
        };

        let idx = &self.indexing;
        if idx.chunk_size == 0 {
            return invalid("indexing.chunk_size", "must be at least 1".into());
        }
        if idx.chunk_overlap >= idx.chunk_size {
            return invalid(
                "indexing.chunk_overlap",
                format!(
                    "{} must be smaller than chunk_size {}",
                    idx.chunk_overlap, idx.chunk_size
                ),
            );
        }
        if idx.top_k == 0 {
            return invalid("indexing.top_k", "must be at least 1".into());
        }
        if !(0.0..=1.0).contains(&idx.min_score) {
            return invalid(
                "indexing.min_score",
                format!("{} is outside [0, 1]", idx.min_score),
            );
        }

        let eval = &self.evaluation;
        if eval.concurrency == 0 {
            return invalid("evaluation.concurrency", "must be at least 1".into());
        }
        if !(0.0..=1.0).contains(&eval.ambiguity_threshold) {
            return invalid(
                "evaluation.ambiguity_threshold",
                format!("{} is outside [0, 1]", eval.ambiguity_threshold),
            );
        }
        if eval.max_attempts == 0 {
            return invalid("evaluation.max_attempts", "must be at least 1".into());
        }
        if eval.base_delay_ms > eval.max_delay_ms {
            return invalid(
                "evaluation.base_delay_ms",
                format!(
                    "{} exceeds max_delay_ms {}",
                    eval.base_delay_ms, eval.max_delay_ms
                ),
            );
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return invalid(
                "llm.temperature",
                format!("{} is outside [0, 2]", self.llm.temperature),
            );
        }
        if self.embedding.provider == EmbeddingProvider::Hashing && self.embedding.dimensions == 0
        {
            return invalid("embedding.dimensions", "must be at least 1".into());
        }
        Ok(())
    }

    /// Fail unless the LLM endpoint has credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotConfigured`] for the `llm` section.
    pub fn require_llm(&self) -> Result<&LlmConfig, ConfigError> {
        if self.llm.is_configured() {
            Ok(&self.llm)
        } else {
            Err(ConfigError::NotConfigured {
                section: "llm".to_string(),
            })
        }
    }
}
