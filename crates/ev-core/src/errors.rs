//! Cross-cutting error types for Evidentia.
//!
//! Domain-specific errors (e.g., `IndexError`, `InferenceError`) are defined in
//! their respective crates. A unified error is deferred to `ev-cli` where
//! all crate errors converge.

use thiserror::Error;

use crate::checklist::ItemId;
use crate::enums::ComplianceStatus;

/// Errors that can be raised by any Evidentia crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A status transition was attempted that the state machine forbids.
    #[error("Invalid status transition for checklist item {id}: {from} to {to}")]
    InvalidTransition {
        id: ItemId,
        from: ComplianceStatus,
        to: ComplianceStatus,
    },

    /// Two checklist items share an id.
    #[error("Duplicate checklist item id: {0}")]
    DuplicateId(ItemId),

    /// Data failed validation (empty text, out-of-range confidence, etc.).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Filesystem error while reading a manifest or report.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON in a manifest or report.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
