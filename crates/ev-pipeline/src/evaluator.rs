//! Compliance Evaluator: retrieve evidence for one requirement and ask the
//! model for a structured analysis.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use ev_config::EvConfig;
use ev_core::{ComplianceAnalysis, EvaluationFailure, ItemId, Verdict};
use ev_embeddings::Embedder;
use ev_index::{EvidenceIndex, IndexError, RetrievedChunk};
use ev_llm::{ChatModel, GenerationRequest, RetryPolicy, StructuredInference, Transient};

const SYSTEM_PROMPT: &str = "You are an expert compliance analyst with extensive experience in \
                             due diligence. You answer strictly from the evidence provided.";

/// Retrieval error wrapper so query embedding can share the retry policy.
#[derive(Debug)]
struct RetrievalError(IndexError);

impl fmt::Display for RetrievalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "evidence retrieval failed: {}", self.0)
    }
}

impl Transient for RetrievalError {
    fn is_transient(&self) -> bool {
        matches!(&self.0, IndexError::Embedding(e) if e.is_transient())
    }

    fn retry_after(&self) -> Option<Duration> {
        match &self.0 {
            IndexError::Embedding(e) => e.retry_after(),
            _ => None,
        }
    }
}

/// Build the analysis prompt for `requirement` over `evidence`.
#[must_use]
pub fn analysis_request(requirement: &str, evidence: &[RetrievedChunk]) -> GenerationRequest {
    let context = if evidence.is_empty() {
        "No evidence was retrieved for this requirement. Treat it as unsupported and \
         lower your confidence accordingly."
            .to_string()
    } else {
        evidence
            .iter()
            .map(|chunk| format!("[{}]\n{}", chunk.citation(), chunk.text.trim()))
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    GenerationRequest::new(format!(
        "Evaluate whether the following compliance requirement is met based on the provided \
         evidence.\n\
         \n\
         Requirement: {requirement}\n\
         \n\
         Evidence:\n{context}\n\
         \n\
         Analyze the evidence thoroughly and consider:\n\
         1. Explicit mentions of this requirement\n\
         2. Full satisfaction of the requirement if mentioned\n\
         3. Indirect evidence suggesting compliance\n\
         4. Any discrepancies or areas of concern\n\
         \n\
         Answer with:\n\
         - is_compliant: true only if the requirement is fully met\n\
         - reason: a clear, concise explanation citing the specific evidence\n\
         - confidence: a number from 0 to 1 expressing your certainty"
    ))
    .with_system(SYSTEM_PROMPT)
}

/// Evaluates checklist items against a shared, read-only evidence index.
pub struct ComplianceEvaluator<M, E> {
    inference: Arc<StructuredInference<M>>,
    embedder: Arc<E>,
    index: Arc<EvidenceIndex>,
    top_k: usize,
    ambiguity_threshold: f64,
    retry: RetryPolicy,
}

impl<M: ChatModel, E: Embedder> ComplianceEvaluator<M, E> {
    #[must_use]
    pub fn new(
        inference: Arc<StructuredInference<M>>,
        embedder: Arc<E>,
        index: Arc<EvidenceIndex>,
        config: &EvConfig,
    ) -> Self {
        Self {
            inference,
            embedder,
            index,
            top_k: config.indexing.top_k.max(1),
            ambiguity_threshold: config.evaluation.ambiguity_threshold,
            retry: RetryPolicy::from(&config.evaluation),
        }
    }

    /// Evaluate one requirement.
    ///
    /// # Errors
    ///
    /// Every failure (retrieval, transport, timeout, unparseable or invalid
    /// output) is returned as an [`EvaluationFailure`] for `item_id`.
    pub async fn evaluate(
        &self,
        item_id: ItemId,
        requirement: &str,
    ) -> Result<Verdict, EvaluationFailure> {
        let evidence = self
            .retry
            .run("evidence retrieval", || async move {
                self.index
                    .retrieve(self.embedder.as_ref(), requirement, self.top_k)
                    .await
                    .map_err(RetrievalError)
            })
            .await
            .map_err(|e| EvaluationFailure::new(item_id, e.to_string()))?;

        tracing::debug!(item = item_id, chunks = evidence.len(), "evidence retrieved");

        let analysis: ComplianceAnalysis = self
            .inference
            .generate(&analysis_request(requirement, &evidence))
            .await
            .map_err(|e| EvaluationFailure::new(item_id, e.to_string()))?;
        analysis
            .validate()
            .map_err(|e| EvaluationFailure::new(item_id, e.to_string()))?;

        let references = evidence
            .iter()
            .map(RetrievedChunk::citation)
            .collect::<Vec<_>>()
            .join(", ");
        let verdict = Verdict::from_analysis(analysis, self.ambiguity_threshold, references);
        tracing::debug!(
            item = item_id,
            status = %verdict.status,
            confidence = verdict.confidence,
            "item evaluated"
        );
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(source: &str, text: &str) -> RetrievedChunk {
        RetrievedChunk {
            source: source.into(),
            chunk: 0,
            offset: 0,
            text: text.into(),
            score: 0.9,
        }
    }

    #[test]
    fn prompt_lists_evidence_with_citations() {
        let request = analysis_request(
            "Breach procedures exist.",
            &[chunk("report.txt", "Procedures are tested quarterly.\n")],
        );
        assert!(request.prompt.contains("Requirement: Breach procedures exist."));
        assert!(request.prompt.contains("[report.txt#0]\nProcedures are tested quarterly."));
        assert!(request.system.is_some());
    }

    #[test]
    fn prompt_states_missing_evidence() {
        let request = analysis_request("Backups are encrypted.", &[]);
        assert!(request.prompt.contains("No evidence was retrieved"));
    }

    #[test]
    fn only_embedding_failures_are_retried() {
        let transient = RetrievalError(IndexError::Embedding(
            ev_embeddings::EmbeddingError::RateLimited {
                retry_after_secs: 2,
            },
        ));
        assert!(transient.is_transient());
        assert_eq!(transient.retry_after(), Some(Duration::from_secs(2)));

        let permanent = RetrievalError(IndexError::ModelMismatch {
            index: "a".into(),
            engine: "b".into(),
        });
        assert!(!permanent.is_transient());
    }
}
