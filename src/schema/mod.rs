//! Resolution of form question labels to the payload's per-submission slot ids.
//!
//! Slot ids change whenever the form is edited, so the mapping is rebuilt
//! from the first submission's labels on every fetch and validated eagerly.

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::{IngestError, Result};
use crate::fetch::RawSubmission;

/// Logical fields the normalizer reads, keyed by their form question label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormField {
    Date,
    ReferringOrganization,
    ReferringStaffName,
    FamilyContactName,
    FamilyContactAddress,
    FamilyContactPhone,
    FamilyContactEmail,
    BarrierDescription,
    Barriers,
    BarrierCause,
    BarrierSolution,
    SolutionPathway,
    ReferringStaffEmail,
    ReferringStaffPhone,
    SubmissionType,
    Age,
    Sex,
    Ethnicity,
    Zipcode,
}

impl FormField {
    pub const ALL: [FormField; 19] = [
        FormField::Date,
        FormField::ReferringOrganization,
        FormField::ReferringStaffName,
        FormField::FamilyContactName,
        FormField::FamilyContactAddress,
        FormField::FamilyContactPhone,
        FormField::FamilyContactEmail,
        FormField::BarrierDescription,
        FormField::Barriers,
        FormField::BarrierCause,
        FormField::BarrierSolution,
        FormField::SolutionPathway,
        FormField::ReferringStaffEmail,
        FormField::ReferringStaffPhone,
        FormField::SubmissionType,
        FormField::Age,
        FormField::Sex,
        FormField::Ethnicity,
        FormField::Zipcode,
    ];

    /// Question label as it appears in the form.
    pub fn label(self) -> &'static str {
        match self {
            FormField::Date => "Date",
            FormField::ReferringOrganization => "Referring Organization",
            FormField::ReferringStaffName => "Referring Staff Name",
            FormField::FamilyContactName => "Family Contact Name",
            FormField::FamilyContactAddress => "Family Contact Address",
            FormField::FamilyContactPhone => "Family Contact Phone Number",
            FormField::FamilyContactEmail => "Family Contact Email",
            FormField::BarrierDescription => "Barrier Description",
            FormField::Barriers => "Barriers",
            FormField::BarrierCause => "Cause of Barrier (optional)",
            FormField::BarrierSolution => "Solution to Barrier (optional)",
            FormField::SolutionPathway => "Solution Pathway to Barrier (optional)",
            FormField::ReferringStaffEmail => "Referring Staff Email",
            FormField::ReferringStaffPhone => "Referring Staff Phone Number",
            FormField::SubmissionType => "Submission Type",
            FormField::Age => "Age",
            FormField::Sex => "Sex",
            FormField::Ethnicity => "Ethnicity",
            FormField::Zipcode => "Zipcode",
        }
    }

    pub fn from_label(label: &str) -> Option<FormField> {
        let label = label.trim();
        FormField::ALL.into_iter().find(|f| f.label() == label)
    }
}

/// `logical field → slot id` for the current payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSchema {
    slots: HashMap<FormField, String>,
}

impl FieldSchema {
    /// Map every recognized label in `first`'s answers to its slot id.
    /// Unrecognized labels are skipped. When a label repeats, the lowest
    /// numeric slot id wins.
    pub fn from_submission(first: &RawSubmission) -> Self {
        let mut slot_ids: Vec<&String> = first.answers.keys().collect();
        slot_ids.sort_by(|a, b| slot_order(a).cmp(&slot_order(b)));

        let mut slots = HashMap::new();
        for id in slot_ids {
            let Some(field) = first.answers[id].label().and_then(FormField::from_label) else {
                continue;
            };
            if let Some(existing) = slots.get(&field) {
                warn!(label = field.label(), kept = %existing, ignored = %id, "duplicate form label");
                continue;
            }
            debug!(label = field.label(), slot = %id, "resolved field slot");
            slots.insert(field, id.clone());
        }
        Self { slots }
    }

    /// Build from the first submission and fail unless every field is resolvable.
    pub fn resolve(submissions: &[RawSubmission]) -> Result<Self> {
        let schema = submissions
            .first()
            .map(Self::from_submission)
            .unwrap_or_default();
        let missing = schema.missing();
        if !missing.is_empty() {
            return Err(IngestError::SchemaResolution { missing });
        }
        Ok(schema)
    }

    pub fn missing(&self) -> Vec<&'static str> {
        FormField::ALL
            .into_iter()
            .filter(|f| !self.slots.contains_key(f))
            .map(FormField::label)
            .collect()
    }

    pub fn slot(&self, field: FormField) -> Result<&str> {
        self.slots
            .get(&field)
            .map(String::as_str)
            .ok_or_else(|| IngestError::SchemaResolution {
                missing: vec![field.label()],
            })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Numeric slot ids in numeric order, anything else after them.
fn slot_order(id: &str) -> (u64, &str) {
    (id.parse::<u64>().unwrap_or(u64::MAX), id)
}
