//! In-memory flat nearest-neighbour index over evidence chunks.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ev_core::SkippedDocument;
use ev_embeddings::{Embedder, EmbeddingError, cosine_similarity};
use ev_llm::{RetryPolicy, Transient};
use serde::{Deserialize, Serialize};

use crate::chunker::{ChunkConfig, chunk_text};
use crate::error::IndexError;
use crate::loader::{LoadedDocument, fingerprint_file, load_document_blocking};

/// Snapshot format written by [`EvidenceIndex::save`].
pub const SNAPSHOT_VERSION: u32 = 1;

const EMBED_BATCH_SIZE: usize = 64;

/// An embedding failure seen by the batch retry loop.
struct BatchError(EmbeddingError);

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Transient for BatchError {
    fn is_transient(&self) -> bool {
        self.0.is_transient()
    }

    fn retry_after(&self) -> Option<Duration> {
        self.0.retry_after()
    }
}

/// A stored chunk and its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub source: String,
    pub chunk: usize,
    pub offset: usize,
    pub text: String,
    pub embedding: Vec<f32>,
}

impl IndexedChunk {
    /// `file#chunk` citation.
    #[must_use]
    pub fn citation(&self) -> String {
        format!("{}#{}", self.source, self.chunk)
    }
}

/// A chunk returned by a query, with its similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub source: String,
    pub chunk: usize,
    pub offset: usize,
    pub text: String,
    pub score: f32,
}

impl RetrievedChunk {
    /// `file#chunk` citation.
    #[must_use]
    pub fn citation(&self) -> String {
        format!("{}#{}", self.source, self.chunk)
    }
}

/// Semantic index over a set of evidence documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceIndex {
    version: u32,
    model_id: String,
    chunking: ChunkConfig,
    /// SHA-256 of every input file, keyed by path. Unreadable files map to "".
    fingerprints: BTreeMap<String, String>,
    documents: Vec<PathBuf>,
    skipped: Vec<SkippedDocument>,
    chunks: Vec<IndexedChunk>,
    #[serde(skip)]
    min_score: f32,
}

impl EvidenceIndex {
    /// An empty index bound to one embedding model and chunk shape.
    #[must_use]
    pub fn new(model_id: impl Into<String>, chunking: ChunkConfig) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            model_id: model_id.into(),
            chunking: chunking.normalized(),
            fingerprints: BTreeMap::new(),
            documents: Vec::new(),
            skipped: Vec::new(),
            chunks: Vec::new(),
            min_score: 0.0,
        }
    }

    /// Load, chunk, and embed `paths` into a fresh index.
    ///
    /// Documents that cannot be loaded are skipped and listed in
    /// [`Self::skipped`]. Embedding calls use the default [`RetryPolicy`].
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::NoUsableEvidence`] if no document yields a chunk,
    /// or [`IndexError::Embedding`] if the embedder fails.
    pub async fn build<E: Embedder>(
        embedder: &E,
        paths: &[PathBuf],
        chunking: ChunkConfig,
    ) -> Result<Self, IndexError> {
        Self::build_with_retry(embedder, paths, chunking, &RetryPolicy::default()).await
    }

    /// [`Self::build`] with an explicit retry policy for embedding batches.
    ///
    /// # Errors
    ///
    /// See [`Self::build`].
    pub async fn build_with_retry<E: Embedder>(
        embedder: &E,
        paths: &[PathBuf],
        chunking: ChunkConfig,
        retry: &RetryPolicy,
    ) -> Result<Self, IndexError> {
        let mut index = Self::new(embedder.model_id(), chunking);
        index.add_documents_with_retry(embedder, paths, retry).await?;
        if index.chunks.is_empty() {
            return Err(IndexError::NoUsableEvidence {
                attempted: paths.len(),
            });
        }
        tracing::info!(
            documents = index.documents.len(),
            chunks = index.chunks.len(),
            skipped = index.skipped.len(),
            "evidence index built"
        );
        Ok(index)
    }

    /// Append more evidence. Returns the documents skipped by this call.
    ///
    /// # Errors
    ///
    /// See [`Self::add_documents_with_retry`].
    pub async fn add_documents<E: Embedder>(
        &mut self,
        embedder: &E,
        paths: &[PathBuf],
    ) -> Result<Vec<SkippedDocument>, IndexError> {
        self.add_documents_with_retry(embedder, paths, &RetryPolicy::default())
            .await
    }

    /// Append more evidence, retrying transient embedding failures.
    ///
    /// Paths already in the index, or repeated within `paths`, are ignored.
    /// Nothing is committed unless every loaded document is embedded, so a
    /// failed call leaves the index unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::ModelMismatch`] if `embedder` is not the model
    /// the index was built with, or [`IndexError::Embedding`].
    pub async fn add_documents_with_retry<E: Embedder>(
        &mut self,
        embedder: &E,
        paths: &[PathBuf],
        retry: &RetryPolicy,
    ) -> Result<Vec<SkippedDocument>, IndexError> {
        self.check_model(embedder)?;

        let mut seen: BTreeSet<String> = self.fingerprints.keys().cloned().collect();
        let mut fingerprints = Vec::with_capacity(paths.len());
        let mut loaded = Vec::with_capacity(paths.len());
        let mut skipped = Vec::new();
        for path in paths {
            let key = path_key(path);
            if !seen.insert(key.clone()) {
                tracing::debug!(path = %path.display(), "document already indexed");
                continue;
            }
            match load_document_blocking(path.clone()).await {
                Ok(doc) => {
                    fingerprints.push((key, doc.fingerprint.clone()));
                    loaded.push(doc);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping evidence document");
                    fingerprints.push((key, fingerprint_file(path)));
                    skipped.push(SkippedDocument {
                        path: path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let mut staged = Vec::with_capacity(loaded.len());
        for doc in loaded {
            staged.push(self.embed_document(embedder, doc, retry).await?);
        }

        self.fingerprints.extend(fingerprints);
        for (path, chunks) in staged {
            self.chunks.extend(chunks);
            self.documents.push(path);
        }
        self.skipped.extend(skipped.iter().cloned());
        Ok(skipped)
    }

    async fn embed_document<E: Embedder>(
        &self,
        embedder: &E,
        doc: LoadedDocument,
        retry: &RetryPolicy,
    ) -> Result<(PathBuf, Vec<IndexedChunk>), IndexError> {
        let pieces = chunk_text(&doc.text, self.chunking);
        let mut embeddings = Vec::with_capacity(pieces.len());
        for batch in pieces.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|p| p.text.clone()).collect();
            let texts = &texts;
            let vectors = retry
                .run("embed evidence batch", || async move {
                    embedder.embed_batch(texts.clone()).await.map_err(BatchError)
                })
                .await
                .map_err(|e| e.0)?;
            embeddings.extend(vectors);
        }
        if embeddings.len() != pieces.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: pieces.len(),
                actual: embeddings.len(),
            }
            .into());
        }

        tracing::debug!(source = %doc.source, chunks = pieces.len(), "embedded document");
        let chunks = pieces
            .into_iter()
            .zip(embeddings)
            .map(|(piece, embedding)| IndexedChunk {
                source: doc.source.clone(),
                chunk: piece.index,
                offset: piece.offset,
                text: piece.text,
                embedding,
            })
            .collect();
        Ok((doc.path, chunks))
    }

    /// Drop results scoring below `min_score`. `0.0` disables the cutoff.
    #[must_use]
    pub const fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    /// Embed `query` and return the `top_k` most similar chunks.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::ModelMismatch`] or [`IndexError::Embedding`].
    pub async fn retrieve<E: Embedder>(
        &self,
        embedder: &E,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, IndexError> {
        self.check_model(embedder)?;
        let query_embedding = embedder.embed_single(query).await?;
        Ok(self.search(&query_embedding, top_k))
    }

    /// Rank chunks by cosine similarity to `query_embedding`.
    ///
    /// Ties keep insertion order. `top_k` is clamped to at least 1.
    #[must_use]
    pub fn search(&self, query_embedding: &[f32], top_k: usize) -> Vec<RetrievedChunk> {
        let mut scored: Vec<(usize, f32)> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| (i, cosine_similarity(query_embedding, &chunk.embedding)))
            .filter(|(_, score)| self.min_score <= 0.0 || *score >= self.min_score)
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored
            .into_iter()
            .take(top_k.max(1))
            .map(|(i, score)| {
                let chunk = &self.chunks[i];
                RetrievedChunk {
                    source: chunk.source.clone(),
                    chunk: chunk.chunk,
                    offset: chunk.offset,
                    text: chunk.text.clone(),
                    score,
                }
            })
            .collect()
    }

    /// Write a JSON snapshot to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Io`] or [`IndexError::Json`].
    pub fn save(&self, path: &Path) -> Result<(), IndexError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| IndexError::io(parent, e))?;
        }
        let json = serde_json::to_vec(self)?;
        std::fs::write(path, json).map_err(|e| IndexError::io(path, e))?;
        tracing::debug!(path = %path.display(), chunks = self.chunks.len(), "saved index snapshot");
        Ok(())
    }

    /// Read a snapshot written by [`Self::save`].
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Io`], [`IndexError::Json`], or
    /// [`IndexError::UnsupportedVersion`].
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let raw = std::fs::read(path).map_err(|e| IndexError::io(path, e))?;
        let index: Self = serde_json::from_slice(&raw)?;
        if index.version != SNAPSHOT_VERSION {
            return Err(IndexError::UnsupportedVersion {
                found: index.version,
                supported: SNAPSHOT_VERSION,
            });
        }
        Ok(index)
    }

    /// Whether this index was built from exactly `paths` (same bytes), with
    /// `chunking` and `model_id`.
    #[must_use]
    pub fn is_fresh_for(&self, paths: &[PathBuf], chunking: ChunkConfig, model_id: &str) -> bool {
        if self.model_id != model_id || self.chunking != chunking.normalized() {
            return false;
        }
        let current: BTreeMap<String, String> = paths
            .iter()
            .map(|p| (path_key(p), fingerprint_file(p)))
            .collect();
        current == self.fingerprints
    }

    fn check_model<E: Embedder>(&self, embedder: &E) -> Result<(), IndexError> {
        let engine = embedder.model_id();
        if engine == self.model_id {
            Ok(())
        } else {
            Err(IndexError::ModelMismatch {
                index: self.model_id.clone(),
                engine,
            })
        }
    }

    #[must_use]
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    #[must_use]
    pub const fn chunking(&self) -> ChunkConfig {
        self.chunking
    }

    /// Paths of the documents that contributed chunks, in insertion order.
    #[must_use]
    pub fn documents(&self) -> &[PathBuf] {
        &self.documents
    }

    #[must_use]
    pub fn skipped(&self) -> &[SkippedDocument] {
        &self.skipped
    }

    #[must_use]
    pub fn chunks(&self) -> &[IndexedChunk] {
        &self.chunks
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
