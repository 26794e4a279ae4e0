//! Embedding engine selection.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which engine computes chunk and query embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProvider {
    /// Local ONNX model via fastembed.
    #[default]
    Fastembed,
    /// OpenAI-compatible `/embeddings` endpoint, using the `llm` credentials.
    Openai,
    /// Deterministic feature hashing; no model, no network.
    Hashing,
}

impl fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fastembed => "fastembed",
            Self::Openai => "openai",
            Self::Hashing => "hashing",
        })
    }
}

fn default_model() -> String {
    "text-embedding-3-small".to_string()
}

const fn default_dimensions() -> usize {
    384
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProvider,

    /// Remote model name (`openai` provider only).
    #[serde(default = "default_model")]
    pub model: String,

    /// Vector width (`hashing` provider only).
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Model cache directory (`fastembed` provider only). Empty means
    /// `~/.evidentia/cache/fastembed`.
    #[serde(default)]
    pub cache_dir: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            model: default_model(),
            dimensions: default_dimensions(),
            cache_dir: String::new(),
        }
    }
}
