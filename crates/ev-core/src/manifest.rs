//! Document manifest: the records a document-storage collaborator keeps for
//! uploaded files, keyed by owner and `type` tag.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::DocumentKind;
use crate::errors::CoreError;

/// One uploaded document.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DocumentRecord {
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub kind: DocumentKind,
    /// Opaque identity of the uploader, as issued by the auth collaborator.
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// All known documents, in upload order. Serialized as a bare JSON array.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(transparent)]
pub struct DocumentManifest {
    documents: Vec<DocumentRecord>,
}

impl DocumentManifest {
    #[must_use]
    pub const fn new(documents: Vec<DocumentRecord>) -> Self {
        Self { documents }
    }

    /// Read a manifest from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Io`] if the file cannot be read or
    /// [`CoreError::Json`] if it is not a valid manifest.
    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    #[must_use]
    pub fn documents(&self) -> &[DocumentRecord] {
        &self.documents
    }

    /// Paths of the given kind uploaded by `owner`, in upload order.
    #[must_use]
    pub fn paths_for(&self, owner: &str, kind: DocumentKind) -> Vec<PathBuf> {
        self.documents
            .iter()
            .filter(|doc| doc.owner == owner && doc.kind == kind)
            .map(|doc| doc.path.clone())
            .collect()
    }
}

/// An evidence document that was dropped while building an index.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SkippedDocument {
    pub path: PathBuf,
    pub reason: String,
}
