//! Report Aggregator: merge per-item outcomes back into the checklist.

use ev_core::report::EVALUATION_ERROR_KEY;
use ev_core::{Checklist, ChecklistReport, EvaluationFailure, SkippedDocument, Verdict};

use crate::error::PipelineError;

/// What the evaluator produced for one item.
pub type ItemOutcome = Result<Verdict, EvaluationFailure>;

const MISSING_OUTCOME: &str = "no evaluation outcome was recorded";

/// Apply `outcomes[i]` to the `i`-th checklist item.
///
/// Failures, missing outcomes, and verdicts the item rejects all become the
/// `Ambiguous` failure verdict, with the cause kept under
/// `metadata["evaluation_error"]`. Item order, ids, and requirements are
/// unchanged.
///
/// # Errors
///
/// Returns [`PipelineError::Core`] only if an item was already evaluated.
pub fn aggregate(
    mut checklist: Checklist,
    outcomes: Vec<Option<ItemOutcome>>,
    skipped_documents: Vec<SkippedDocument>,
) -> Result<ChecklistReport, PipelineError> {
    let mut outcomes = outcomes.into_iter();
    for item in checklist.iter_mut() {
        let id = item.id();
        let outcome = outcomes
            .next()
            .flatten()
            .unwrap_or_else(|| Err(EvaluationFailure::new(id, MISSING_OUTCOME)));

        let failure = match outcome {
            Ok(verdict) => match item.apply_verdict(verdict) {
                Ok(()) => continue,
                Err(e) => EvaluationFailure::new(id, e.to_string()),
            },
            Err(failure) => failure,
        };

        tracing::warn!(item = id, cause = %failure.cause, "evaluation failed, marking ambiguous");
        item.apply_verdict(Verdict::failed(&failure))?;
        item.insert_metadata(EVALUATION_ERROR_KEY, failure.cause.into());
    }

    let report = ChecklistReport::new(checklist, skipped_documents);
    tracing::info!(
        total = report.summary.total,
        compliant = report.summary.compliant,
        non_compliant = report.summary.non_compliant,
        ambiguous = report.summary.ambiguous,
        failed = report.summary.failed,
        "report aggregated"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ev_core::{ChecklistItem, ComplianceStatus};
    use pretty_assertions::assert_eq;

    fn checklist() -> Checklist {
        Checklist::from_requirements([(10, "a"), (20, "b"), (30, "c")]).unwrap()
    }

    fn verdict(status: ComplianceStatus, reason: &str, confidence: f64) -> Verdict {
        Verdict {
            status,
            reason: reason.into(),
            references: "report.txt#0".into(),
            confidence,
        }
    }

    #[test]
    fn outcomes_are_applied_in_order() {
        let report = aggregate(
            checklist(),
            vec![
                Some(Ok(verdict(ComplianceStatus::Compliant, "met", 0.9))),
                Some(Ok(verdict(ComplianceStatus::NonCompliant, "not met", 0.7))),
                Some(Ok(verdict(ComplianceStatus::Ambiguous, "unclear", 0.3))),
            ],
            Vec::new(),
        )
        .unwrap();

        let ids: Vec<u32> = report.checklist.iter().map(ChecklistItem::id).collect();
        assert_eq!(ids, vec![10, 20, 30]);
        let statuses: Vec<ComplianceStatus> =
            report.checklist.iter().map(ChecklistItem::status).collect();
        assert_eq!(
            statuses,
            vec![
                ComplianceStatus::Compliant,
                ComplianceStatus::NonCompliant,
                ComplianceStatus::Ambiguous
            ]
        );
        assert_eq!(report.summary.failed, 0);
    }

    #[test]
    fn failures_become_ambiguous_with_cause() {
        let report = aggregate(
            checklist(),
            vec![
                Some(Ok(verdict(ComplianceStatus::Compliant, "met", 0.9))),
                Some(Err(EvaluationFailure::new(20, "request timed out"))),
                Some(Ok(verdict(ComplianceStatus::Compliant, "met", 0.8))),
            ],
            Vec::new(),
        )
        .unwrap();

        let failed = report.checklist.get(20).unwrap();
        assert_eq!(failed.status(), ComplianceStatus::Ambiguous);
        assert_eq!(failed.reason(), "evaluation failed: request timed out");
        assert_eq!(failed.confidence(), Some(0.0));
        assert_eq!(failed.references(), "");
        assert_eq!(
            failed.metadata().get(EVALUATION_ERROR_KEY),
            Some(&serde_json::Value::from("request timed out"))
        );
        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.summary.compliant, 2);
    }

    #[test]
    fn missing_outcomes_are_failures() {
        let report = aggregate(
            checklist(),
            vec![Some(Ok(verdict(ComplianceStatus::Compliant, "met", 0.9))), None],
            Vec::new(),
        )
        .unwrap();

        assert_eq!(report.checklist.len(), 3);
        assert!(report.checklist.is_fully_evaluated());
        assert_eq!(report.summary.failed, 2);
        assert!(report.checklist.get(30).unwrap().reason().contains(MISSING_OUTCOME));
    }

    #[test]
    fn rejected_verdicts_are_failures() {
        let report = aggregate(
            checklist(),
            vec![
                Some(Ok(verdict(ComplianceStatus::Compliant, "   ", 0.9))),
                Some(Ok(verdict(ComplianceStatus::Compliant, "ok", 0.9))),
                Some(Ok(verdict(ComplianceStatus::Compliant, "ok", 0.9))),
            ],
            Vec::new(),
        )
        .unwrap();
        let first = report.checklist.get(10).unwrap();
        assert_eq!(first.status(), ComplianceStatus::Ambiguous);
        assert!(first.reason().starts_with("evaluation failed"));
    }

    #[test]
    fn skipped_documents_are_carried() {
        let skipped = vec![SkippedDocument {
            path: "scan.docx".into(),
            reason: "unsupported".into(),
        }];
        let report = aggregate(checklist(), Vec::new(), skipped.clone()).unwrap();
        assert_eq!(report.skipped_documents, skipped);
    }
}
