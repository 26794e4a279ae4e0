use std::path::PathBuf;

use anyhow::Context;
use ev_config::EvConfig;
use ev_core::SkippedDocument;
use ev_embeddings::Embedder;
use ev_index::{ChunkConfig, EvidenceIndex};
use ev_llm::RetryPolicy;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::IndexArgs;
use crate::output::output;
use crate::output::table::Column;
use crate::output::Tabular;
use crate::progress::Progress;
use crate::sources;

/// What `evd index` wrote.
#[derive(Debug, Serialize)]
pub struct IndexSummary {
    pub snapshot: PathBuf,
    pub model_id: String,
    pub documents: usize,
    pub chunks: usize,
    pub skipped: Vec<SkippedDocument>,
}

impl IndexSummary {
    fn new(snapshot: PathBuf, index: &EvidenceIndex) -> Self {
        Self {
            snapshot,
            model_id: index.model_id().to_string(),
            documents: index.documents().len(),
            chunks: index.len(),
            skipped: index.skipped().to_vec(),
        }
    }
}

impl Tabular for IndexSummary {
    fn columns(&self) -> Vec<Column> {
        vec![Column::left("key"), Column::wrapping("value")]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        let mut rows = vec![
            vec!["snapshot".into(), self.snapshot.display().to_string()],
            vec!["model".into(), self.model_id.clone()],
            vec!["documents".into(), self.documents.to_string()],
            vec!["chunks".into(), self.chunks.to_string()],
        ];
        for skipped in &self.skipped {
            rows.push(vec![
                "skipped".into(),
                format!("{}: {}", skipped.path.display(), skipped.reason),
            ]);
        }
        rows
    }
}

/// Handle `evd index`: build a snapshot that `evaluate --index-cache` reuses.
pub async fn handle(args: &IndexArgs, config: &EvConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let evidence =
        sources::evidence_paths(&args.evidence, args.manifest.as_deref(), args.owner.as_deref())?;
    let embedder = super::embedding_engine(config).await?;
    let chunking = ChunkConfig::from(&config.indexing);
    let retry = RetryPolicy::from(&config.evaluation);
    let cancel = super::cancel_on_ctrl_c();

    let progress = Progress::spinner(&format!(
        "indexing {} evidence document(s) with {}",
        evidence.len(),
        embedder.model_id()
    ));
    let result = tokio::select! {
        biased;
        () = cancel.cancelled() => {
            progress.finish_err("indexing cancelled");
            anyhow::bail!("indexing cancelled");
        }
        result = EvidenceIndex::build_with_retry(&embedder, &evidence, chunking, &retry) => result,
    };
    let index = match result {
        Ok(index) => index,
        Err(error) => {
            progress.finish_err("indexing failed");
            return Err(error.into());
        }
    };
    index
        .save(&args.out)
        .with_context(|| format!("failed to write index snapshot {}", args.out.display()))?;
    progress.finish_ok(&format!("indexed {} chunks", index.len()));

    output(&IndexSummary::new(args.out.clone(), &index), flags.format)
}
