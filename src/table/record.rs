// src/table/record.rs

use serde::{Deserialize, Serialize};

use crate::normalize::category::SubmissionType;

/// Column order of the persisted table.
pub const HEADER: [&str; 19] = [
    "date",
    "submission_type",
    "age",
    "sex",
    "ethnicity",
    "barrier_description",
    "barrier_list",
    "barrier_cause",
    "barrier_solution",
    "solution_path",
    "referring_org",
    "referring_staff",
    "staff_email",
    "staff_phone",
    "family_contact",
    "family_address",
    "family_phone",
    "family_email",
    "zipcode",
];

/// One normalized submission. `None` is a missing value and stays distinct
/// from `Some("")` when persisted (see [`cell`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    #[serde(with = "cell")]
    pub date: Option<String>,
    pub submission_type: SubmissionType,
    #[serde(with = "cell")]
    pub age: Option<String>,
    #[serde(with = "cell")]
    pub sex: Option<String>,
    #[serde(with = "cell")]
    pub ethnicity: Option<String>,
    #[serde(with = "cell")]
    pub barrier_description: Option<String>,
    #[serde(with = "cell")]
    pub barrier_list: Option<String>,
    #[serde(with = "cell")]
    pub barrier_cause: Option<String>,
    #[serde(with = "cell")]
    pub barrier_solution: Option<String>,
    #[serde(with = "cell")]
    pub solution_path: Option<String>,
    #[serde(with = "cell")]
    pub referring_org: Option<String>,
    #[serde(with = "cell")]
    pub referring_staff: Option<String>,
    #[serde(with = "cell")]
    pub staff_email: Option<String>,
    #[serde(with = "cell")]
    pub staff_phone: Option<String>,
    #[serde(with = "cell")]
    pub family_contact: Option<String>,
    #[serde(with = "cell")]
    pub family_address: Option<String>,
    #[serde(with = "cell")]
    pub family_phone: Option<String>,
    #[serde(with = "cell")]
    pub family_email: Option<String>,
    #[serde(with = "cell")]
    pub zipcode: Option<String>,
}

/// Table cell codec for optional text.
///
/// A missing value is written as `\N`. Present values that start with a
/// backslash get one extra leading backslash, so no present value can
/// encode to the marker and the empty string stays an empty cell.
pub mod cell {
    use serde::{Deserialize, Deserializer, Serializer};

    pub const MISSING: &str = "\\N";
    const ESCAPE: char = '\\';

    pub fn encode(v: Option<&str>) -> std::borrow::Cow<'_, str> {
        match v {
            None => MISSING.into(),
            Some(s) if s.starts_with(ESCAPE) => format!("{}{}", ESCAPE, s).into(),
            Some(s) => s.into(),
        }
    }

    pub fn decode(raw: String) -> Option<String> {
        if raw == MISSING {
            return None;
        }
        match raw.strip_prefix(ESCAPE) {
            Some(rest) => Some(rest.to_string()),
            None => Some(raw),
        }
    }

    pub fn serialize<S: Serializer>(v: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&encode(v.as_deref()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        String::deserialize(d).map(decode)
    }
}

/// Column set of the barrier view.
pub const BARRIER_HEADER: [&str; 9] = [
    "date",
    "age",
    "sex",
    "ethnicity",
    "zipcode",
    "barrier_description",
    "barrier_list",
    "barrier_solution",
    "solution_path",
];

/// Projection of a record without contact names, addresses, phones or emails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarrierRow {
    pub date: Option<String>,
    pub age: Option<String>,
    pub sex: Option<String>,
    pub ethnicity: Option<String>,
    pub zipcode: Option<String>,
    pub barrier_description: Option<String>,
    pub barrier_list: Option<String>,
    pub barrier_solution: Option<String>,
    pub solution_path: Option<String>,
}

impl BarrierRow {
    /// Cells in `BARRIER_HEADER` order.
    pub fn cells(&self) -> [Option<&str>; 9] {
        [
            self.date.as_deref(),
            self.age.as_deref(),
            self.sex.as_deref(),
            self.ethnicity.as_deref(),
            self.zipcode.as_deref(),
            self.barrier_description.as_deref(),
            self.barrier_list.as_deref(),
            self.barrier_solution.as_deref(),
            self.solution_path.as_deref(),
        ]
    }
}

impl From<&NormalizedRecord> for BarrierRow {
    fn from(r: &NormalizedRecord) -> Self {
        Self {
            date: r.date.clone(),
            age: r.age.clone(),
            sex: r.sex.clone(),
            ethnicity: r.ethnicity.clone(),
            zipcode: r.zipcode.clone(),
            barrier_description: r.barrier_description.clone(),
            barrier_list: r.barrier_list.clone(),
            barrier_solution: r.barrier_solution.clone(),
            solution_path: r.solution_path.clone(),
        }
    }
}
