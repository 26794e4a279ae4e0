//! # ev-pipeline
//!
//! The compliance-evidence pipeline:
//!
//! 1. [`ChecklistBuilder`] turns free-form requirement text into a
//!    [`ev_core::Checklist`] with one structured model call.
//! 2. [`ev_index::EvidenceIndex`] makes the evidence searchable.
//! 3. [`ComplianceEvaluator`] retrieves evidence for each item and asks the
//!    model for a [`ev_core::ComplianceAnalysis`].
//! 4. [`aggregate`] merges verdicts and failures into the final report.
//!
//! [`Pipeline`] runs the stages over one [`ev_config::EvConfig`], evaluating
//! items concurrently on a bounded `JoinSet`. A failed item degrades to
//! `Ambiguous`; only checklist construction or an empty evidence set ends a
//! run early.

pub mod aggregator;
pub mod builder;
pub mod error;
pub mod evaluator;
pub mod programs;
pub mod run;

pub use aggregator::{ItemOutcome, aggregate};
pub use builder::{ChecklistBuilder, ExtractedChecklist, ExtractedItem};
pub use error::PipelineError;
pub use evaluator::ComplianceEvaluator;
pub use programs::{ComplianceProgram, ProgramCatalog};
pub use run::{Pipeline, RunObserver, RunRequest, RunStage};
