//! Evaluator outcomes: the model's raw analysis, the verdict derived from it,
//! and the recoverable per-item failure.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::checklist::ItemId;
use crate::enums::ComplianceStatus;
use crate::errors::CoreError;

/// Reason prefix used for items whose evaluation failed.
pub const FAILED_REASON_PREFIX: &str = "evaluation failed";

/// The result of a compliance analysis for one requirement, as produced by the
/// language model.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ComplianceAnalysis {
    /// Whether the requirement is met based on the evidence. True only if the
    /// requirement is fully satisfied.
    pub is_compliant: bool,

    /// A detailed explanation of the compliance status, referencing the
    /// specific evidence that justifies the decision.
    pub reason: String,

    /// Certainty of the analysis from 0 (no confidence) to 1 (absolute
    /// certainty), reflecting how well the available evidence supports it.
    #[schemars(range(min = 0.0, max = 1.0))]
    pub confidence: f64,
}

impl ComplianceAnalysis {
    /// Map the analysis onto a checklist status.
    ///
    /// A confidence strictly below `ambiguity_threshold` yields `Ambiguous`;
    /// otherwise the boolean decides. A threshold of `0.0` never yields
    /// `Ambiguous`.
    #[must_use]
    pub fn status(&self, ambiguity_threshold: f64) -> ComplianceStatus {
        if self.confidence < ambiguity_threshold {
            ComplianceStatus::Ambiguous
        } else if self.is_compliant {
            ComplianceStatus::Compliant
        } else {
            ComplianceStatus::NonCompliant
        }
    }

    /// Reject answers a schema cannot rule out: blank reasons and non-finite
    /// or out-of-range confidence.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] describing the violation.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.reason.trim().is_empty() {
            return Err(CoreError::Validation("analysis reason is empty".into()));
        }
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(CoreError::Validation(format!(
                "analysis confidence {} is outside [0, 1]",
                self.confidence
            )));
        }
        Ok(())
    }
}

/// A final verdict ready to be recorded on a checklist item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Verdict {
    pub status: ComplianceStatus,
    pub reason: String,
    pub references: String,
    pub confidence: f64,
}

impl Verdict {
    /// Derive a verdict from a model analysis plus the evidence citations the
    /// evaluator retrieved.
    #[must_use]
    pub fn from_analysis(
        analysis: ComplianceAnalysis,
        ambiguity_threshold: f64,
        references: String,
    ) -> Self {
        Self {
            status: analysis.status(ambiguity_threshold),
            reason: analysis.reason.trim().to_string(),
            references,
            confidence: analysis.confidence,
        }
    }

    /// The safe default substituted for an item whose evaluation failed.
    #[must_use]
    pub fn failed(failure: &EvaluationFailure) -> Self {
        Self {
            status: ComplianceStatus::Ambiguous,
            reason: format!("{FAILED_REASON_PREFIX}: {}", failure.cause),
            references: String::new(),
            confidence: 0.0,
        }
    }
}

/// A recoverable failure to evaluate one checklist item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvaluationFailure {
    pub item_id: ItemId,
    pub cause: String,
}

impl EvaluationFailure {
    #[must_use]
    pub fn new(item_id: ItemId, cause: impl Into<String>) -> Self {
        Self {
            item_id,
            cause: cause.into(),
        }
    }
}

impl fmt::Display for EvaluationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "checklist item {}: {}", self.item_id, self.cause)
    }
}
