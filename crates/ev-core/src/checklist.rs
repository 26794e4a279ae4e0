//! Checklist items and the ordered checklist that owns them.
//!
//! `id` and `requirement` are fixed when an item is built; the verdict fields
//! are written once through [`ChecklistItem::apply_verdict`], which enforces the
//! [`ComplianceStatus`] state machine.

use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::analysis::Verdict;
use crate::enums::ComplianceStatus;
use crate::errors::CoreError;

/// Identifier of a checklist item, unique within one checklist.
pub type ItemId = u32;

/// One compliance requirement under evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ChecklistItem {
    id: ItemId,
    requirement: String,
    #[serde(default)]
    status: ComplianceStatus,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    references: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    confidence: Option<f64>,
    #[serde(default)]
    metadata: Map<String, Value>,
}

impl ChecklistItem {
    /// Build an unevaluated item.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if `requirement` is blank.
    pub fn new(id: ItemId, requirement: impl Into<String>) -> Result<Self, CoreError> {
        let requirement = requirement.into().trim().to_string();
        if requirement.is_empty() {
            return Err(CoreError::Validation(format!(
                "checklist item {id} has an empty requirement"
            )));
        }
        Ok(Self {
            id,
            requirement,
            status: ComplianceStatus::Unevaluated,
            reason: String::new(),
            references: String::new(),
            confidence: None,
            metadata: Map::new(),
        })
    }

    #[must_use]
    pub const fn id(&self) -> ItemId {
        self.id
    }

    #[must_use]
    pub fn requirement(&self) -> &str {
        &self.requirement
    }

    #[must_use]
    pub const fn status(&self) -> ComplianceStatus {
        self.status
    }

    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    #[must_use]
    pub fn references(&self) -> &str {
        &self.references
    }

    #[must_use]
    pub const fn confidence(&self) -> Option<f64> {
        self.confidence
    }

    #[must_use]
    pub const fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Attach an extension value. Metadata is not part of the verdict and may
    /// be written at any point.
    pub fn insert_metadata(&mut self, key: impl Into<String>, value: Value) {
        self.metadata.insert(key.into(), value);
    }

    /// Whether the item carries a final verdict.
    #[must_use]
    pub const fn is_evaluated(&self) -> bool {
        self.status.is_terminal()
    }

    /// Record the item's verdict. Allowed exactly once.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidTransition`] if the item already has a verdict or
    ///   the verdict status is `Unevaluated`.
    /// - [`CoreError::Validation`] if the reason is blank or the confidence is
    ///   outside `[0, 1]`.
    pub fn apply_verdict(&mut self, verdict: Verdict) -> Result<(), CoreError> {
        if !self.status.can_transition_to(verdict.status) {
            return Err(CoreError::InvalidTransition {
                id: self.id,
                from: self.status,
                to: verdict.status,
            });
        }
        if verdict.reason.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "verdict for checklist item {} has an empty reason",
                self.id
            )));
        }
        if !(0.0..=1.0).contains(&verdict.confidence) {
            return Err(CoreError::Validation(format!(
                "verdict for checklist item {} has confidence {} outside [0, 1]",
                self.id, verdict.confidence
            )));
        }

        self.status = verdict.status;
        self.reason = verdict.reason;
        self.references = verdict.references;
        self.confidence = Some(verdict.confidence);
        Ok(())
    }

    /// Check the evaluated-item invariant: a final status implies a reason
    /// and a confidence in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] describing the first violation.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.requirement.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "checklist item {} has an empty requirement",
                self.id
            )));
        }
        if !self.status.is_terminal() {
            return Ok(());
        }
        if self.reason.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "checklist item {} is {} but has no reason",
                self.id, self.status
            )));
        }
        match self.confidence {
            Some(c) if (0.0..=1.0).contains(&c) => Ok(()),
            Some(c) => Err(CoreError::Validation(format!(
                "checklist item {} has confidence {c} outside [0, 1]",
                self.id
            ))),
            None => Err(CoreError::Validation(format!(
                "checklist item {} is {} but has no confidence",
                self.id, self.status
            ))),
        }
    }
}

/// Ordered sequence of checklist items. Insertion order is report order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Checklist {
    checklist: Vec<ChecklistItem>,
}

impl Checklist {
    /// Build a checklist from items, rejecting duplicate ids.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateId`] on the first repeated id, or any
    /// per-item validation error.
    pub fn new(items: Vec<ChecklistItem>) -> Result<Self, CoreError> {
        let checklist = Self { checklist: items };
        checklist.validate()?;
        Ok(checklist)
    }

    /// Build an unevaluated checklist from `(id, requirement)` pairs.
    ///
    /// # Errors
    ///
    /// Fails if any requirement is blank or any id repeats.
    pub fn from_requirements<I, S>(requirements: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = (ItemId, S)>,
        S: Into<String>,
    {
        let items = requirements
            .into_iter()
            .map(|(id, text)| ChecklistItem::new(id, text))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(items)
    }

    /// Validate id uniqueness and every item's invariant. Used after
    /// deserializing a checklist from an untrusted source.
    ///
    /// # Errors
    ///
    /// Returns the first violation found, in item order.
    pub fn validate(&self) -> Result<(), CoreError> {
        let mut seen = HashSet::with_capacity(self.checklist.len());
        for item in &self.checklist {
            if !seen.insert(item.id) {
                return Err(CoreError::DuplicateId(item.id));
            }
            item.validate()?;
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.checklist.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checklist.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChecklistItem> {
        self.checklist.iter()
    }

    #[must_use]
    pub fn items(&self) -> &[ChecklistItem] {
        &self.checklist
    }

    /// Mutable access for recording verdicts. Ids and requirements stay
    /// read-only through [`ChecklistItem`]'s accessors.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, ChecklistItem> {
        self.checklist.iter_mut()
    }

    #[must_use]
    pub fn into_items(self) -> Vec<ChecklistItem> {
        self.checklist
    }

    /// Look up an item by id.
    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<&ChecklistItem> {
        self.checklist.iter().find(|item| item.id == id)
    }

    /// Whether every item carries a final verdict.
    #[must_use]
    pub fn is_fully_evaluated(&self) -> bool {
        self.checklist.iter().all(ChecklistItem::is_evaluated)
    }
}

impl<'a> IntoIterator for &'a Checklist {
    type Item = &'a ChecklistItem;
    type IntoIter = std::slice::Iter<'a, ChecklistItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.checklist.iter()
    }
}
