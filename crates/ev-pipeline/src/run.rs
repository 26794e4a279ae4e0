//! End-to-end run: build checklist, index evidence, evaluate every item
//! concurrently, aggregate.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ev_config::EvConfig;
use ev_core::{Checklist, ChecklistReport, EvaluationFailure, ItemId};
use ev_embeddings::Embedder;
use ev_index::{ChunkConfig, EvidenceIndex};
use ev_llm::{ChatModel, RetryPolicy, StructuredInference};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::aggregator::{ItemOutcome, aggregate};
use crate::builder::ChecklistBuilder;
use crate::error::PipelineError;
use crate::evaluator::ComplianceEvaluator;

/// Stages reported to a [`RunObserver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    BuildingChecklist,
    Indexing { documents: usize },
    Evaluating { items: usize },
    Aggregating,
}

/// Progress callbacks. All methods default to no-ops.
pub trait RunObserver {
    fn stage(&self, _stage: RunStage) {}

    fn item_finished(&self, _id: ItemId, _failed: bool) {}
}

impl RunObserver for () {}

/// Inputs for one [`Pipeline::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunRequest {
    /// Raw checklist text, from a program template or an uploaded document.
    pub checklist_text: String,
    /// Evidence documents to index.
    pub evidence: Vec<PathBuf>,
    /// Snapshot to reuse when fresh, and to refresh otherwise.
    pub index_cache: Option<PathBuf>,
}

/// The four stages wired together over one configuration.
pub struct Pipeline<M, E> {
    config: EvConfig,
    inference: Arc<StructuredInference<M>>,
    embedder: Arc<E>,
}

impl<M, E> Pipeline<M, E>
where
    M: ChatModel + 'static,
    E: Embedder + 'static,
{
    #[must_use]
    pub fn new(config: EvConfig, model: M, embedder: E) -> Self {
        let inference = Arc::new(StructuredInference::configured(model, &config));
        Self {
            config,
            inference,
            embedder: Arc::new(embedder),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &EvConfig {
        &self.config
    }

    #[must_use]
    pub fn model(&self) -> &M {
        self.inference.model()
    }

    #[must_use]
    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    fn chunking(&self) -> ChunkConfig {
        ChunkConfig::from(&self.config.indexing)
    }

    /// Run the Checklist Builder on `raw_text`.
    ///
    /// # Errors
    ///
    /// See [`ChecklistBuilder::build`].
    pub async fn build_checklist(&self, raw_text: &str) -> Result<Checklist, PipelineError> {
        ChecklistBuilder::new(Arc::clone(&self.inference))
            .build(raw_text)
            .await
    }

    /// Build an index over `evidence`, or reuse `cache` when it is fresh.
    ///
    /// A rebuilt index is written back to `cache`. An unreadable or stale
    /// cache, or one that cannot be rewritten, is ignored with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Index`] if the build fails.
    pub async fn prepare_index(
        &self,
        evidence: &[PathBuf],
        cache: Option<&Path>,
    ) -> Result<EvidenceIndex, PipelineError> {
        let chunking = self.chunking();
        let model_id = self.embedder.model_id();

        if let Some(path) = cache.filter(|p| p.exists()) {
            match EvidenceIndex::load(path) {
                Ok(index) if index.is_fresh_for(evidence, chunking, &model_id) => {
                    tracing::info!(path = %path.display(), chunks = index.len(), "reusing cached evidence index");
                    return Ok(index.with_min_score(self.config.indexing.min_score));
                }
                Ok(_) => tracing::info!(path = %path.display(), "cached evidence index is stale"),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable index cache"),
            }
        }

        let retry = RetryPolicy::from(&self.config.evaluation);
        let index =
            EvidenceIndex::build_with_retry(self.embedder.as_ref(), evidence, chunking, &retry)
                .await?;
        if let Some(path) = cache
            && let Err(e) = index.save(path)
        {
            tracing::warn!(path = %path.display(), error = %e, "failed to refresh index cache");
        }
        Ok(index.with_min_score(self.config.indexing.min_score))
    }

    /// Evaluate every item of `checklist` against `index` and aggregate.
    ///
    /// Items run concurrently, bounded by `evaluation.concurrency`. Results
    /// keep checklist order regardless of completion order.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Cancelled`] if `cancel` fires first. Per-item
    /// failures never end the run.
    pub async fn evaluate_checklist<O: RunObserver>(
        &self,
        checklist: Checklist,
        index: Arc<EvidenceIndex>,
        cancel: &CancellationToken,
        observer: &O,
    ) -> Result<ChecklistReport, PipelineError> {
        observer.stage(RunStage::Evaluating {
            items: checklist.len(),
        });

        let evaluator = Arc::new(ComplianceEvaluator::new(
            Arc::clone(&self.inference),
            Arc::clone(&self.embedder),
            Arc::clone(&index),
            &self.config,
        ));
        let semaphore = Arc::new(Semaphore::new(self.config.evaluation.concurrency.max(1)));
        let mut set = JoinSet::new();

        for (slot, item) in checklist.iter().enumerate() {
            let evaluator = Arc::clone(&evaluator);
            let sem = Arc::clone(&semaphore);
            let id = item.id();
            let requirement = item.requirement().to_string();
            set.spawn(async move {
                let Ok(_permit) = sem.acquire().await else {
                    return (slot, Err(EvaluationFailure::new(id, "evaluation slot closed")));
                };
                (slot, evaluator.evaluate(id, &requirement).await)
            });
        }

        let mut outcomes: Vec<Option<ItemOutcome>> = (0..checklist.len()).map(|_| None).collect();
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    set.abort_all();
                    tracing::warn!("evaluation cancelled");
                    return Err(PipelineError::Cancelled);
                }
                joined = set.join_next() => match joined {
                    None => break,
                    Some(Ok((slot, outcome))) => {
                        if let Some(item) = checklist.items().get(slot) {
                            observer.item_finished(item.id(), outcome.is_err());
                        }
                        outcomes[slot] = Some(outcome);
                    }
                    Some(Err(e)) => tracing::error!(error = %e, "evaluation task aborted"),
                },
            }
        }

        observer.stage(RunStage::Aggregating);
        aggregate(checklist, outcomes, index.skipped().to_vec())
    }

    /// Full run: checklist, index, evaluation, report.
    ///
    /// # Errors
    ///
    /// Fails when the checklist cannot be built, no evidence is usable, or
    /// `cancel` fires.
    pub async fn run<O: RunObserver>(
        &self,
        request: RunRequest,
        cancel: &CancellationToken,
        observer: &O,
    ) -> Result<ChecklistReport, PipelineError> {
        observer.stage(RunStage::BuildingChecklist);
        let checklist = until_cancelled(cancel, self.build_checklist(&request.checklist_text)).await?;

        observer.stage(RunStage::Indexing {
            documents: request.evidence.len(),
        });
        let index = until_cancelled(
            cancel,
            self.prepare_index(&request.evidence, request.index_cache.as_deref()),
        )
        .await?;

        self.evaluate_checklist(checklist, Arc::new(index), cancel, observer)
            .await
    }
}

async fn until_cancelled<T>(
    cancel: &CancellationToken,
    work: impl Future<Output = Result<T, PipelineError>>,
) -> Result<T, PipelineError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(PipelineError::Cancelled),
        result = work => result,
    }
}
