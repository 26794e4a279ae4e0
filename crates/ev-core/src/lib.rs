//! # ev-core
//!
//! Core types and error types for Evidentia.
//!
//! This crate provides the foundational types shared across all Evidentia crates:
//! - [`ChecklistItem`] and [`Checklist`], the unit of compliance evaluation
//! - [`ComplianceStatus`] with its one-shot state machine
//! - [`ComplianceAnalysis`], [`Verdict`], and [`EvaluationFailure`], the
//!   evaluator's per-item outcomes
//! - [`ChecklistReport`], the aggregated run result
//! - [`DocumentManifest`], the contract of the document-storage collaborator
//! - Cross-cutting [`CoreError`]

pub mod analysis;
pub mod checklist;
pub mod enums;
pub mod errors;
pub mod manifest;
pub mod report;

pub use analysis::{ComplianceAnalysis, EvaluationFailure, Verdict};
pub use checklist::{Checklist, ChecklistItem, ItemId};
pub use enums::{ComplianceStatus, DocumentKind};
pub use errors::CoreError;
pub use manifest::{DocumentManifest, DocumentRecord, SkippedDocument};
pub use report::{ChecklistReport, ReportSummary};
