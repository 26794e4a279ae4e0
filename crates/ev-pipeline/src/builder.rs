//! Checklist Builder: free-form requirement text to an unevaluated checklist.

use std::collections::HashSet;
use std::sync::Arc;

use ev_core::{Checklist, ChecklistItem, ItemId};
use ev_llm::{ChatModel, GenerationRequest, InferenceError, StructuredInference};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::error::PipelineError;

/// The model's answer: one entry per requirement, in source order.
#[derive(Debug, Clone, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ExtractedChecklist {
    pub checklist: Vec<ExtractedItem>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ExtractedItem {
    /// Unique identifier for the item.
    pub id: ItemId,
    /// The compliance requirement, as one self-contained sentence.
    pub requirement: String,
}

const SYSTEM_PROMPT: &str = "You convert compliance requirement lists into structured checklists.";

/// Extraction prompt for `raw_text`.
#[must_use]
pub fn extraction_request(raw_text: &str) -> GenerationRequest {
    GenerationRequest::new(format!(
        "You are given a list of compliance requirements. Convert it into a checklist.\n\
         \n\
         Each checklist item has exactly two fields:\n\
         - id: a unique integer identifier, numbering items from 1 in the order they appear\n\
         - requirement: the specific compliance requirement being evaluated\n\
         \n\
         Create one item per distinct requirement. Do not assess compliance and do not add \
         requirements that are not in the data.\n\
         \n\
         data:\n{raw_text}"
    ))
    .with_system(SYSTEM_PROMPT)
}

/// Turns raw checklist text into a [`Checklist`] through one structured call.
pub struct ChecklistBuilder<M> {
    inference: Arc<StructuredInference<M>>,
}

impl<M: ChatModel> ChecklistBuilder<M> {
    #[must_use]
    pub const fn new(inference: Arc<StructuredInference<M>>) -> Self {
        Self { inference }
    }

    /// Extract a checklist from `raw_text`.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::MalformedChecklist`] if the text is blank.
    /// - [`PipelineError::Extraction`] if the model output is unusable: not
    ///   JSON, off-schema, empty, blank requirements, or repeated ids.
    /// - [`PipelineError::Inference`] for transport failures.
    pub async fn build(&self, raw_text: &str) -> Result<Checklist, PipelineError> {
        if raw_text.trim().is_empty() {
            return Err(PipelineError::MalformedChecklist(
                "checklist text is empty".into(),
            ));
        }

        let extracted: ExtractedChecklist = self
            .inference
            .generate(&extraction_request(raw_text))
            .await
            .map_err(|e| match e {
                InferenceError::InvalidJson(_) | InferenceError::SchemaViolation { .. } => {
                    PipelineError::Extraction(e.to_string())
                }
                other => PipelineError::Inference(other),
            })?;

        let checklist = into_checklist(extracted)?;
        tracing::info!(items = checklist.len(), "checklist extracted");
        Ok(checklist)
    }
}

/// Validate the extracted items and build the checklist.
///
/// # Errors
///
/// Returns [`PipelineError::Extraction`] on an empty list, a blank
/// requirement, or a repeated id.
pub fn into_checklist(extracted: ExtractedChecklist) -> Result<Checklist, PipelineError> {
    if extracted.checklist.is_empty() {
        return Err(PipelineError::Extraction(
            "model returned no checklist items".into(),
        ));
    }

    let mut seen = HashSet::with_capacity(extracted.checklist.len());
    let mut items = Vec::with_capacity(extracted.checklist.len());
    for entry in extracted.checklist {
        if !seen.insert(entry.id) {
            return Err(PipelineError::Extraction(format!(
                "model returned duplicate item id {}",
                entry.id
            )));
        }
        let item = ChecklistItem::new(entry.id, entry.requirement)
            .map_err(|e| PipelineError::Extraction(e.to_string()))?;
        items.push(item);
    }
    Checklist::new(items).map_err(|e| PipelineError::Extraction(e.to_string()))
}
