//! Serde roundtrip and JsonSchema validation tests for the public core types.

use chrono::Utc;
use ev_core::{
    Checklist, ChecklistItem, ChecklistReport, ComplianceAnalysis, ComplianceStatus,
    DocumentKind, DocumentManifest, DocumentRecord, SkippedDocument, Verdict,
};
use pretty_assertions::assert_eq;
use schemars::schema_for;

/// Validate a JSON value against a schemars-generated schema.
fn validate_against_schema(
    schema: &serde_json::Value,
    instance: &serde_json::Value,
) -> Vec<String> {
    let validator = jsonschema::validator_for(schema).expect("schema should be valid");
    validator
        .iter_errors(instance)
        .map(|e| format!("{e}"))
        .collect()
}

macro_rules! roundtrip_and_validate {
    ($name:ident, $ty:ty, $instance:expr) => {
        #[test]
        fn $name() {
            let val: $ty = $instance;

            let json_str = serde_json::to_string_pretty(&val).unwrap();
            let recovered: $ty = serde_json::from_str(&json_str).unwrap();
            assert_eq!(recovered, val, "serde roundtrip failed for {}", stringify!($ty));

            let schema = serde_json::to_value(schema_for!($ty)).unwrap();
            let instance = serde_json::to_value(&val).unwrap();
            let errors = validate_against_schema(&schema, &instance);
            assert!(
                errors.is_empty(),
                "Schema validation failed for {}: {:?}",
                stringify!($ty),
                errors
            );
        }
    };
}

fn evaluated_checklist() -> Checklist {
    let mut first = ChecklistItem::new(1, "Breach procedures exist.").unwrap();
    first
        .apply_verdict(Verdict {
            status: ComplianceStatus::Compliant,
            reason: "Procedures are documented and tested quarterly.".into(),
            references: "report.txt#0".into(),
            confidence: 0.82,
        })
        .unwrap();
    first.insert_metadata("section", "4.2".into());
    let second = ChecklistItem::new(2, "Training within 30 days of hire.").unwrap();
    Checklist::new(vec![first, second]).unwrap()
}

roundtrip_and_validate!(checklist_roundtrip, Checklist, evaluated_checklist());

roundtrip_and_validate!(
    report_roundtrip,
    ChecklistReport,
    ChecklistReport::new(
        evaluated_checklist(),
        vec![SkippedDocument {
            path: "uploads/scan.docx".into(),
            reason: "unsupported document type: docx".into(),
        }],
    )
);

roundtrip_and_validate!(
    analysis_roundtrip,
    ComplianceAnalysis,
    ComplianceAnalysis {
        is_compliant: false,
        reason: "No evidence of quarterly audits.".into(),
        confidence: 0.35,
    }
);

roundtrip_and_validate!(
    manifest_roundtrip,
    DocumentManifest,
    DocumentManifest::new(vec![DocumentRecord {
        path: "uploads/report.txt".into(),
        kind: DocumentKind::Evidence,
        owner: "user-42".into(),
        filename: Some("report.txt".into()),
        uploaded_at: Some(Utc::now()),
    }])
);

#[test]
fn analysis_schema_rejects_out_of_range_confidence() {
    let schema = serde_json::to_value(schema_for!(ComplianceAnalysis)).unwrap();
    let instance = serde_json::json!({
        "is_compliant": true,
        "reason": "Looks fine",
        "confidence": 1.7
    });
    assert!(!validate_against_schema(&schema, &instance).is_empty());
}

#[test]
fn analysis_schema_requires_all_fields() {
    let schema = serde_json::to_value(schema_for!(ComplianceAnalysis)).unwrap();
    let instance = serde_json::json!({ "is_compliant": true });
    assert!(!validate_against_schema(&schema, &instance).is_empty());
}

#[test]
fn report_summary_matches_checklist() {
    let report = ChecklistReport::new(evaluated_checklist(), Vec::new());
    assert_eq!(report.summary.total, 2);
    assert_eq!(report.summary.compliant, 1);
    assert_eq!(report.summary.unevaluated, 1);
    assert_eq!(report.summary.failed, 0);
}
