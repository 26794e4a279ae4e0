//! Evidence chunking and retrieval settings.

use serde::{Deserialize, Serialize};

const fn default_chunk_size() -> usize {
    512
}

const fn default_chunk_overlap() -> usize {
    10
}

const fn default_top_k() -> usize {
    4
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexingConfig {
    /// Target chunk length in whitespace-delimited tokens.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Tokens carried over from the end of one chunk into the next.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Chunks retrieved per requirement.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum cosine similarity for a chunk to be retrieved.
    #[serde(default)]
    pub min_score: f32,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            min_score: 0.0,
        }
    }
}
