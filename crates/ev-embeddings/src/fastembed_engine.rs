//! Local embedding engine backed by fastembed (ONNX runtime).

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use fastembed::{EmbeddingModel, TextEmbedding, TextInitOptions};

use crate::{Embedder, EmbeddingError, check_count};

/// Local embedding engine using the `AllMiniLML6V2` model.
///
/// Produces 384-dimensional vectors with mean pooling (no query/passage
/// prefix needed). Model files are downloaded on first use.
///
/// # Thread safety
///
/// [`TextEmbedding::embed`] requires `&mut self`, so the session sits behind a
/// `Mutex` and every call runs on tokio's blocking pool. Clones share one
/// session.
#[derive(Clone)]
pub struct FastEmbedEngine {
    model: Arc<Mutex<TextEmbedding>>,
}

impl FastEmbedEngine {
    /// Create a new engine, caching model files in `cache_dir` or
    /// `~/.evidentia/cache/fastembed/` when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingError::InitFailed`] if model download or ONNX initialization fails.
    pub fn new(cache_dir: Option<PathBuf>) -> Result<Self, EmbeddingError> {
        let cache_dir = cache_dir.unwrap_or_else(|| {
            dirs::home_dir().map_or_else(
                || PathBuf::from(".fastembed_cache"),
                |h| h.join(".evidentia").join("cache").join("fastembed"),
            )
        });

        let model = TextEmbedding::try_new(
            TextInitOptions::new(EmbeddingModel::AllMiniLML6V2)
                .with_cache_dir(cache_dir)
                .with_show_download_progress(false),
        )
        .map_err(|e| EmbeddingError::InitFailed(e.to_string()))?;

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
        })
    }

    /// Embedding vector dimensionality (always 384 for `AllMiniLML6V2`).
    #[must_use]
    pub const fn dimension() -> usize {
        384
    }
}

impl Embedder for FastEmbedEngine {
    fn model_id(&self) -> String {
        "fastembed/all-MiniLM-L6-v2".to_string()
    }

    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let expected = texts.len();
        let model = Arc::clone(&self.model);
        let vectors = tokio::task::spawn_blocking(move || {
            let mut session = model
                .lock()
                .map_err(|_| EmbeddingError::EmbedFailed("embedding session poisoned".into()))?;
            session
                .embed(texts, None)
                .map_err(|e| EmbeddingError::EmbedFailed(e.to_string()))
        })
        .await
        .map_err(|e| EmbeddingError::EmbedFailed(format!("embedding task failed: {e}")))??;

        check_count(expected, vectors.len())?;
        Ok(vectors)
    }
}
