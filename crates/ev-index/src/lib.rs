//! # ev-index
//!
//! Evidence indexing for Evidentia: load documents (plain text and PDF),
//! split them into overlapping sentence-packed chunks, embed the chunks, and
//! answer nearest-chunk queries by cosine similarity.
//!
//! Documents that cannot be loaded are skipped with a warning and reported
//! through [`EvidenceIndex::skipped`]; a build fails only when nothing usable
//! remains. Indexes persist as versioned JSON snapshots that reload with
//! identical rankings.

pub mod chunker;
pub mod error;
pub mod index;
pub mod loader;

pub use chunker::{ChunkConfig, TextChunk, chunk_text};
pub use error::IndexError;
pub use index::{EvidenceIndex, IndexedChunk, RetrievedChunk, SNAPSHOT_VERSION};
pub use loader::{LoadedDocument, fingerprint, load_document};
