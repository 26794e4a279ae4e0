//! Error types for evidence indexing.

use std::path::PathBuf;

use ev_embeddings::EmbeddingError;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("unsupported document type '{extension}': {path}")]
    UnsupportedDocumentType { path: PathBuf, extension: String },

    #[error("failed to extract text from {path}: {reason}")]
    DocumentExtraction { path: PathBuf, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("document contains no text: {path}")]
    EmptyDocument { path: PathBuf },

    #[error("none of the {attempted} evidence documents produced any text to index")]
    NoUsableEvidence { attempted: usize },

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("index snapshot error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("index snapshot version {found} is not supported (expected {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("index was built with '{index}' but the active embedder is '{engine}'")]
    ModelMismatch { index: String, engine: String },
}

impl IndexError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
