//! # ev-embeddings
//!
//! Embedding generation for Evidentia.
//!
//! Every engine implements [`Embedder`], which turns text into fixed-length
//! float vectors used for nearest-chunk retrieval over evidence documents.
//!
//! ## Engines
//!
//! - [`FastEmbedEngine`]: local `AllMiniLML6V2` (384 dimensions) through
//!   fastembed's ONNX runtime. No API key; the model (~80MB) is downloaded on
//!   first use and cached at `~/.evidentia/cache/fastembed/`.
//! - [`OpenAiEmbedder`]: an OpenAI-compatible `/embeddings` endpoint.
//! - [`HashingEmbedder`]: deterministic feature hashing over word unigrams and
//!   bigrams. No model and no network; used in tests and air-gapped runs.
//!
//! [`EmbeddingEngine`] selects one of them from configuration.
//!
//! ## Async usage
//!
//! The fastembed ONNX runtime is synchronous. [`FastEmbedEngine`] runs it on
//! tokio's blocking pool, so all engines can be awaited from async code.

pub mod error;
mod fastembed_engine;
mod hashing;
mod openai;

use std::future::Future;

pub use error::EmbeddingError;
pub use fastembed_engine::FastEmbedEngine;
pub use hashing::HashingEmbedder;
pub use openai::OpenAiEmbedder;

use ev_config::{EmbeddingConfig, EmbeddingProvider, LlmConfig};

/// Capability: turn text into embedding vectors.
///
/// Implementations must be deterministic for identical input so that an
/// index built twice from the same documents ranks identically.
pub trait Embedder: Send + Sync {
    /// Stable identifier of the model, recorded in persisted indexes.
    fn model_id(&self) -> String;

    /// Embed a batch of texts. Returns one vector per input, in input order.
    fn embed_batch(
        &self,
        texts: Vec<String>,
    ) -> impl Future<Output = Result<Vec<Vec<f32>>, EmbeddingError>> + Send;

    /// Embed a single text.
    ///
    /// Convenience wrapper around [`Self::embed_batch`].
    fn embed_single(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<Vec<f32>, EmbeddingError>> + Send {
        let text = text.to_string();
        async move {
            let mut results = self.embed_batch(vec![text]).await?;
            results.pop().ok_or(EmbeddingError::EmptyResult)
        }
    }
}

/// Cosine similarity between two vectors. Zero-norm vectors score `0.0`.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Check that an engine returned exactly one vector per input.
pub(crate) const fn check_count(expected: usize, actual: usize) -> Result<(), EmbeddingError> {
    if expected == actual {
        Ok(())
    } else {
        Err(EmbeddingError::CountMismatch { expected, actual })
    }
}

/// The configured embedding engine.
pub enum EmbeddingEngine {
    FastEmbed(FastEmbedEngine),
    OpenAi(OpenAiEmbedder),
    Hashing(HashingEmbedder),
}

impl EmbeddingEngine {
    /// Build the engine selected by `embedding.provider`.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingError::InitFailed`] if the local model cannot be
    /// loaded or the remote client cannot be built.
    pub fn from_config(
        embedding: &EmbeddingConfig,
        llm: &LlmConfig,
    ) -> Result<Self, EmbeddingError> {
        tracing::debug!(provider = %embedding.provider, "initializing embedding engine");
        match embedding.provider {
            EmbeddingProvider::Fastembed => {
                let cache_dir = if embedding.cache_dir.is_empty() {
                    None
                } else {
                    Some(std::path::PathBuf::from(&embedding.cache_dir))
                };
                Ok(Self::FastEmbed(FastEmbedEngine::new(cache_dir)?))
            }
            EmbeddingProvider::Openai => Ok(Self::OpenAi(OpenAiEmbedder::new(
                &llm.api_base,
                &llm.api_key,
                &embedding.model,
                llm.request_timeout_secs,
            )?)),
            EmbeddingProvider::Hashing => {
                Ok(Self::Hashing(HashingEmbedder::new(embedding.dimensions)))
            }
        }
    }
}

impl Embedder for EmbeddingEngine {
    fn model_id(&self) -> String {
        match self {
            Self::FastEmbed(e) => e.model_id(),
            Self::OpenAi(e) => e.model_id(),
            Self::Hashing(e) => e.model_id(),
        }
    }

    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        match self {
            Self::FastEmbed(e) => e.embed_batch(texts).await,
            Self::OpenAi(e) => e.embed_batch(texts).await,
            Self::Hashing(e) => e.embed_batch(texts).await,
        }
    }
}
