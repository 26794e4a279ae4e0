//! Pipeline-level error type.

use std::path::PathBuf;

use ev_config::ConfigError;
use ev_core::CoreError;
use ev_index::IndexError;
use ev_llm::InferenceError;

/// Errors that end a run. Per-item evaluation problems never surface here;
/// they are folded into the report.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("malformed checklist: {0}")]
    MalformedChecklist(String),

    #[error("checklist extraction failed: {0}")]
    Extraction(String),

    #[error("unknown compliance program: {0}")]
    UnknownProgram(String),

    #[error("invalid program catalog {path}: {reason}")]
    Catalog { path: PathBuf, reason: String },

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("run cancelled")]
    Cancelled,
}
