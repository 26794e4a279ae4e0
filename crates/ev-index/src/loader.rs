//! Evidence document loading.
//!
//! Plain-text files are read verbatim; PDFs go through `pdf-extract`, which
//! concatenates every page in order. The file extension decides the reader.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::IndexError;

const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "text"];

/// A readable evidence document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDocument {
    pub path: PathBuf,
    /// File name used in citations.
    pub source: String,
    pub text: String,
    /// Hex SHA-256 of the raw file bytes.
    pub fingerprint: String,
}

/// Hex SHA-256 of `bytes`.
#[must_use]
pub fn fingerprint(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Fingerprint of the file at `path`, or an empty string if it cannot be read.
#[must_use]
pub fn fingerprint_file(path: &Path) -> String {
    std::fs::read(path).map_or_else(|_| String::new(), |bytes| fingerprint(&bytes))
}

/// Name under which chunks of `path` are cited.
#[must_use]
pub fn source_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

/// Read one document and extract its text.
///
/// # Errors
///
/// - [`IndexError::UnsupportedDocumentType`] for unknown extensions.
/// - [`IndexError::Io`] if the file cannot be read.
/// - [`IndexError::DocumentExtraction`] if the file is not valid UTF-8 text
///   or a readable PDF.
/// - [`IndexError::EmptyDocument`] if no text remains after extraction.
pub fn load_document(path: &Path) -> Result<LoadedDocument, IndexError> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    let is_text = TEXT_EXTENSIONS.contains(&extension.as_str());
    if !is_text && extension != "pdf" {
        return Err(IndexError::UnsupportedDocumentType {
            path: path.to_path_buf(),
            extension,
        });
    }

    let bytes = std::fs::read(path).map_err(|e| IndexError::io(path, e))?;
    let digest = fingerprint(&bytes);
    let size = bytes.len();
    let text = if is_text {
        String::from_utf8(bytes).map_err(|e| IndexError::DocumentExtraction {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?
    } else {
        pdf_extract::extract_text_from_mem(&bytes).map_err(|e| {
            IndexError::DocumentExtraction {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?
    };

    if text.trim().is_empty() {
        return Err(IndexError::EmptyDocument {
            path: path.to_path_buf(),
        });
    }

    tracing::debug!(path = %path.display(), bytes = size, "loaded evidence document");
    Ok(LoadedDocument {
        path: path.to_path_buf(),
        source: source_name(path),
        fingerprint: digest,
        text,
    })
}

/// [`load_document`] on tokio's blocking pool.
///
/// A panic inside the PDF parser is reported as a
/// [`IndexError::DocumentExtraction`] for that document.
pub async fn load_document_blocking(path: PathBuf) -> Result<LoadedDocument, IndexError> {
    let task_path = path.clone();
    tokio::task::spawn_blocking(move || load_document(&task_path))
        .await
        .unwrap_or_else(|e| {
            Err(IndexError::DocumentExtraction {
                path,
                reason: format!("extraction task failed: {e}"),
            })
        })
}
