//! Evaluation and aggregation over a real evidence index and scripted models.

mod common;

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{
    BREACH_EVIDENCE, OTHER_EVIDENCE, Reply, analysis, is_analysis, pipeline, requirement_of,
    test_config, write,
};
use ev_core::report::EVALUATION_ERROR_KEY;
use ev_core::{Checklist, ChecklistItem, ComplianceStatus, ItemId};
use ev_index::IndexError;
use ev_llm::InferenceError;
use ev_pipeline::{PipelineError, RunObserver, RunRequest, RunStage};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn evidence_dir() -> (TempDir, Vec<std::path::PathBuf>) {
    let dir = tempfile::tempdir().unwrap();
    let paths = vec![
        write(dir.path(), "report.txt", BREACH_EVIDENCE),
        write(dir.path(), "facilities.md", OTHER_EVIDENCE),
    ];
    (dir, paths)
}

fn five_items() -> Checklist {
    Checklist::from_requirements([
        (1, "R1: Breach procedures are documented."),
        (2, "R2: Staff complete privacy training."),
        (3, "R3: Access to personal data is restricted."),
        (4, "R4: Backups are encrypted."),
        (5, "R5: Vendors sign data processing agreements."),
    ])
    .unwrap()
}

fn item_number(requirement: &str) -> u64 {
    requirement
        .strip_prefix('R')
        .and_then(|rest| rest.split(':').next())
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

#[tokio::test]
async fn breach_requirement_is_answered_from_the_breach_chunk() {
    let (_dir, paths) = evidence_dir();
    let pipeline = pipeline(test_config(), |request| {
        if request.prompt.contains(BREACH_EVIDENCE) {
            analysis(true, "The report states breach procedures are documented and tested quarterly.", 0.85)
        } else {
            analysis(false, "No supporting evidence.", 0.6)
        }
    });

    let checklist = Checklist::from_requirements([(
        1,
        "Clear procedures are in place to detect, report, and investigate personal data breaches.",
    )])
    .unwrap();
    let index = pipeline.prepare_index(&paths, None).await.unwrap();
    let report = pipeline
        .evaluate_checklist(checklist, Arc::new(index), &CancellationToken::new(), &())
        .await
        .unwrap();

    let item = report.checklist.get(1).unwrap();
    assert!(matches!(
        item.status(),
        ComplianceStatus::Compliant | ComplianceStatus::Ambiguous
    ));
    assert!(!item.reason().is_empty());
    let confidence = item.confidence().unwrap();
    assert!(confidence > 0.0 && confidence < 1.0);
    assert!(item.references().starts_with("report.txt#0"));

    let requests = pipeline.model().requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].prompt.contains("[report.txt#0]"));
}

#[tokio::test]
async fn one_failed_item_of_five_degrades_alone() {
    let (_dir, paths) = evidence_dir();
    let pipeline = pipeline(test_config(), |request| {
        let requirement = requirement_of(request);
        if requirement.starts_with("R3") {
            Reply::error(InferenceError::Api {
                status: 400,
                message: "context length exceeded".into(),
            })
        } else {
            analysis(true, &format!("Evidence supports {requirement}"), 0.8)
        }
    });

    let index = pipeline.prepare_index(&paths, None).await.unwrap();
    let report = pipeline
        .evaluate_checklist(five_items(), Arc::new(index), &CancellationToken::new(), &())
        .await
        .unwrap();

    assert_eq!(report.checklist.len(), 5);
    assert!(report.checklist.is_fully_evaluated());
    for item in &report.checklist {
        if item.id() == 3 {
            assert_eq!(item.status(), ComplianceStatus::Ambiguous);
            assert!(item.reason().starts_with("evaluation failed"));
            assert!(item.reason().contains("context length exceeded"));
            assert_eq!(item.confidence(), Some(0.0));
            assert!(item.metadata().contains_key(EVALUATION_ERROR_KEY));
        } else {
            assert_eq!(item.status(), ComplianceStatus::Compliant);
            assert!(item.reason().contains(item.requirement()));
            assert_eq!(item.confidence(), Some(0.8));
        }
    }
    assert_eq!(report.summary.compliant, 4);
    assert_eq!(report.summary.failed, 1);
}

#[tokio::test]
async fn unparseable_output_degrades_the_item() {
    let (_dir, paths) = evidence_dir();
    let pipeline = pipeline(test_config(), |request| {
        if requirement_of(request).starts_with("R2") {
            Reply {
                delay: Duration::ZERO,
                result: Ok("I believe this is compliant.".into()),
            }
        } else if requirement_of(request).starts_with("R4") {
            analysis(true, "Encrypted.", 4.2)
        } else {
            analysis(false, "Not shown.", 0.7)
        }
    });

    let index = pipeline.prepare_index(&paths, None).await.unwrap();
    let report = pipeline
        .evaluate_checklist(five_items(), Arc::new(index), &CancellationToken::new(), &())
        .await
        .unwrap();

    let statuses: Vec<ComplianceStatus> = report.checklist.iter().map(ChecklistItem::status).collect();
    assert_eq!(
        statuses,
        vec![
            ComplianceStatus::NonCompliant,
            ComplianceStatus::Ambiguous,
            ComplianceStatus::NonCompliant,
            ComplianceStatus::Ambiguous,
            ComplianceStatus::NonCompliant,
        ]
    );
    assert_eq!(report.summary.failed, 2);
}

#[tokio::test]
async fn order_is_preserved_when_later_items_finish_first() {
    let (_dir, paths) = evidence_dir();
    let mut config = test_config();
    config.evaluation.concurrency = 5;
    let pipeline = pipeline(config, |request| {
        let n = item_number(requirement_of(request));
        analysis(n % 2 == 1, &format!("item {n}"), 0.9).after(Duration::from_millis((6 - n) * 20))
    });

    let index = pipeline.prepare_index(&paths, None).await.unwrap();
    let report = pipeline
        .evaluate_checklist(five_items(), Arc::new(index), &CancellationToken::new(), &())
        .await
        .unwrap();

    let ids: Vec<ItemId> = report.checklist.iter().map(ChecklistItem::id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    let reasons: Vec<&str> = report.checklist.iter().map(ChecklistItem::reason).collect();
    assert_eq!(reasons, vec!["item 1", "item 2", "item 3", "item 4", "item 5"]);
    assert_eq!(report.summary.compliant, 3);
    assert_eq!(report.summary.non_compliant, 2);
}

#[tokio::test]
async fn concurrency_is_bounded() {
    let (_dir, paths) = evidence_dir();
    let mut config = test_config();
    config.evaluation.concurrency = 2;
    let pipeline = pipeline(config, |_| {
        analysis(true, "ok", 0.9).after(Duration::from_millis(20))
    });

    let index = pipeline.prepare_index(&paths, None).await.unwrap();
    pipeline
        .evaluate_checklist(five_items(), Arc::new(index), &CancellationToken::new(), &())
        .await
        .unwrap();

    let peak = pipeline.model().peak_in_flight.load(Ordering::SeqCst);
    assert!((1..=2).contains(&peak), "peak in-flight calls: {peak}");
}

#[tokio::test]
async fn low_confidence_answers_are_ambiguous() {
    let (_dir, paths) = evidence_dir();
    let pipeline = pipeline(test_config(), |_| analysis(true, "Weak evidence.", 0.3));

    let index = pipeline.prepare_index(&paths, None).await.unwrap();
    let report = pipeline
        .evaluate_checklist(five_items(), Arc::new(index), &CancellationToken::new(), &())
        .await
        .unwrap();

    assert_eq!(report.summary.ambiguous, 5);
    assert_eq!(report.summary.failed, 0);
}

#[tokio::test]
async fn rate_limited_calls_are_retried() {
    let (_dir, paths) = evidence_dir();
    let attempts = Arc::new(Mutex::new(0u32));
    let counter = Arc::clone(&attempts);
    let pipeline = pipeline(test_config(), move |_| {
        let mut n = counter.lock().unwrap();
        *n += 1;
        if *n == 1 {
            Reply::error(InferenceError::RateLimited { retry_after_secs: 0 })
        } else {
            analysis(true, "Documented.", 0.9)
        }
    });

    let checklist = Checklist::from_requirements([(1, "Breach procedures exist.")]).unwrap();
    let index = pipeline.prepare_index(&paths, None).await.unwrap();
    let report = pipeline
        .evaluate_checklist(checklist, Arc::new(index), &CancellationToken::new(), &())
        .await
        .unwrap();

    assert_eq!(report.checklist.get(1).unwrap().status(), ComplianceStatus::Compliant);
    assert_eq!(*attempts.lock().unwrap(), 2);
}

#[tokio::test]
async fn cancellation_stops_the_run() {
    let (_dir, paths) = evidence_dir();
    let pipeline = pipeline(test_config(), |_| {
        analysis(true, "late", 0.9).after(Duration::from_secs(30))
    });

    let index = pipeline.prepare_index(&paths, None).await.unwrap();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        pipeline.evaluate_checklist(five_items(), Arc::new(index), &cancel, &()),
    )
    .await
    .expect("cancelled run should return promptly");
    assert!(matches!(result, Err(PipelineError::Cancelled)));
}

#[derive(Default)]
struct Recorder {
    stages: Mutex<Vec<RunStage>>,
    finished: Mutex<Vec<(ItemId, bool)>>,
}

impl RunObserver for Recorder {
    fn stage(&self, stage: RunStage) {
        self.stages.lock().unwrap().push(stage);
    }

    fn item_finished(&self, id: ItemId, failed: bool) {
        self.finished.lock().unwrap().push((id, failed));
    }
}

#[tokio::test]
async fn full_run_builds_indexes_evaluates_and_reuses_cache() {
    let (dir, paths) = evidence_dir();
    let pipeline = pipeline(test_config(), |request| {
        if is_analysis(request) {
            analysis(true, "Supported by the report.", 0.75)
        } else {
            Reply::json(serde_json::json!({
                "checklist": [
                    {"id": 1, "requirement": "Breach procedures are documented."},
                    {"id": 2, "requirement": "Breach procedures are tested."}
                ]
            }))
        }
    });

    let cache = dir.path().join("cache/index.json");
    let request = RunRequest {
        checklist_text: "1. Breach procedures are documented.\n2. Breach procedures are tested.".into(),
        evidence: paths.clone(),
        index_cache: Some(cache.clone()),
    };
    let recorder = Recorder::default();
    let report = pipeline
        .run(request.clone(), &CancellationToken::new(), &recorder)
        .await
        .unwrap();

    assert_eq!(report.summary.total, 2);
    assert_eq!(report.summary.compliant, 2);
    assert!(cache.exists());
    assert_eq!(
        *recorder.stages.lock().unwrap(),
        vec![
            RunStage::BuildingChecklist,
            RunStage::Indexing { documents: 2 },
            RunStage::Evaluating { items: 2 },
            RunStage::Aggregating,
        ]
    );
    let mut finished = recorder.finished.lock().unwrap().clone();
    finished.sort_unstable();
    assert_eq!(finished, vec![(1, false), (2, false)]);

    let cached = ev_index::EvidenceIndex::load(&cache).unwrap();
    assert!(cached.is_fresh_for(&paths, cached.chunking(), "hashing-384"));

    let again = pipeline
        .run(request, &CancellationToken::new(), &())
        .await
        .unwrap();
    assert_eq!(again.summary.total, 2);
}

#[tokio::test]
async fn unwritable_cache_does_not_fail_indexing() {
    let (dir, paths) = evidence_dir();
    let pipeline = pipeline(test_config(), |_| analysis(true, "Supported.", 0.8));

    let index = pipeline
        .prepare_index(&paths, Some(dir.path()))
        .await
        .unwrap();
    assert_eq!(index.documents(), paths.as_slice());
    assert!(!index.is_empty());
    assert!(dir.path().is_dir());
}

#[tokio::test]
async fn run_without_usable_evidence_fails() {
    let dir = tempfile::tempdir().unwrap();
    let paths = vec![write(dir.path(), "scan.docx", "binary")];
    let pipeline = pipeline(test_config(), |_| {
        Reply::json(serde_json::json!({"checklist": [{"id": 1, "requirement": "A."}]}))
    });

    let err = pipeline
        .run(
            RunRequest {
                checklist_text: "A.".into(),
                evidence: paths,
                index_cache: None,
            },
            &CancellationToken::new(),
            &(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Index(IndexError::NoUsableEvidence { attempted: 1 })
    ));
}

#[tokio::test]
async fn skipped_documents_are_reported() {
    let (dir, mut paths) = evidence_dir();
    paths.push(write(dir.path(), "photo.png", "binary"));
    let pipeline = pipeline(test_config(), |_| analysis(true, "ok", 0.9));

    let index = pipeline.prepare_index(&paths, None).await.unwrap();
    let report = pipeline
        .evaluate_checklist(five_items(), Arc::new(index), &CancellationToken::new(), &())
        .await
        .unwrap();

    assert_eq!(report.skipped_documents.len(), 1);
    assert_eq!(report.skipped_documents[0].path, paths[2]);
}
