// src/normalize/extract.rs

use crate::fetch::payload::value_text;
use crate::fetch::{Answer, AnswerValue};
use crate::schema::FormField;

/// Value used when an `Other` field has neither a free-text entry nor a plain answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    Missing,
    Empty,
}

/// How a field's value is pulled out of its answer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    /// The raw `answer` value.
    Plain,
    /// The service's pre-rendered `prettyFormat` string.
    Formatted,
    /// A named sub-field of a structured answer.
    Nested(&'static str),
    /// The `other` sub-field when a formatted form exists (the respondent
    /// typed a non-listed option), else the plain answer.
    Other { fallback: Fallback },
}

impl FormField {
    pub fn extraction(self) -> Extraction {
        match self {
            FormField::Date
            | FormField::ReferringStaffName
            | FormField::FamilyContactName
            | FormField::FamilyContactAddress
            | FormField::FamilyContactPhone
            | FormField::Barriers
            | FormField::SolutionPathway => Extraction::Formatted,
            FormField::ReferringStaffPhone => Extraction::Nested("full"),
            FormField::Zipcode => Extraction::Nested("postal"),
            FormField::Sex => Extraction::Other {
                fallback: Fallback::Missing,
            },
            FormField::Ethnicity => Extraction::Other {
                fallback: Fallback::Empty,
            },
            FormField::ReferringOrganization
            | FormField::FamilyContactEmail
            | FormField::BarrierDescription
            | FormField::BarrierCause
            | FormField::BarrierSolution
            | FormField::ReferringStaffEmail
            | FormField::SubmissionType
            | FormField::Age => Extraction::Plain,
        }
    }
}

/// Extract one field value; `None` is the missing sentinel.
pub fn extract(answer: Option<&Answer>, how: Extraction) -> Option<String> {
    match how {
        Extraction::Plain => plain(answer?),
        Extraction::Formatted => answer?.formatted(),
        Extraction::Nested(key) => nested(answer?, key),
        Extraction::Other { fallback } => match answer {
            Some(a) if a.has_formatted() => nested(a, "other"),
            Some(a) if a.answer.is_some() => plain(a),
            _ => match fallback {
                Fallback::Missing => None,
                Fallback::Empty => Some(String::new()),
            },
        },
    }
}

fn plain(answer: &Answer) -> Option<String> {
    match answer.value()? {
        AnswerValue::Scalar(v) => value_text(v),
        AnswerValue::Structured(map) => Some(serde_json::Value::Object(map.clone()).to_string()),
    }
}

fn nested(answer: &Answer, key: &str) -> Option<String> {
    match answer.value()? {
        AnswerValue::Structured(map) => map.get(key).and_then(value_text),
        AnswerValue::Scalar(_) => None,
    }
}
