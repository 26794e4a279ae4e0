//! The aggregated result of one evaluation run.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::checklist::Checklist;
use crate::enums::ComplianceStatus;
use crate::manifest::SkippedDocument;

/// Metadata key under which the aggregator records an item's evaluation error.
pub const EVALUATION_ERROR_KEY: &str = "evaluation_error";

/// Per-status counts derived from a checklist.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ReportSummary {
    pub total: usize,
    pub compliant: usize,
    pub non_compliant: usize,
    pub ambiguous: usize,
    pub unevaluated: usize,
    /// Items whose evaluation failed and were degraded to `ambiguous`.
    pub failed: usize,
}

impl ReportSummary {
    #[must_use]
    pub fn from_checklist(checklist: &Checklist) -> Self {
        let mut summary = Self {
            total: checklist.len(),
            ..Self::default()
        };
        for item in checklist {
            match item.status() {
                ComplianceStatus::Compliant => summary.compliant += 1,
                ComplianceStatus::NonCompliant => summary.non_compliant += 1,
                ComplianceStatus::Ambiguous => summary.ambiguous += 1,
                ComplianceStatus::Unevaluated => summary.unevaluated += 1,
            }
            if item.metadata().contains_key(EVALUATION_ERROR_KEY) {
                summary.failed += 1;
            }
        }
        summary
    }
}

/// Final checklist plus run bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ChecklistReport {
    pub checklist: Checklist,
    pub summary: ReportSummary,
    /// Evidence documents that could not be loaded and were left out.
    #[serde(default)]
    pub skipped_documents: Vec<SkippedDocument>,
    pub generated_at: DateTime<Utc>,
}

impl ChecklistReport {
    #[must_use]
    pub fn new(checklist: Checklist, skipped_documents: Vec<SkippedDocument>) -> Self {
        Self {
            summary: ReportSummary::from_checklist(&checklist),
            checklist,
            skipped_documents,
            generated_at: Utc::now(),
        }
    }
}
