use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Legacy labels mapped onto a canonical category.
const ALIASES: &[(&str, SubmissionType)] =
    &[("Barrier Log Only (non-referral)", SubmissionType::BarrierLog)];

/// Closed set of submission categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubmissionType {
    BarrierLog,
    #[default]
    SelfReferral,
    OrganizationReferral,
}

impl SubmissionType {
    pub const ALL: [SubmissionType; 3] = [
        SubmissionType::BarrierLog,
        SubmissionType::SelfReferral,
        SubmissionType::OrganizationReferral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionType::BarrierLog => "Barrier Log",
            SubmissionType::SelfReferral => "Self-Referral",
            SubmissionType::OrganizationReferral => "Organization Referral",
        }
    }

    /// Alias lookup, then closed-set membership. Anything else, including
    /// a missing value, is presumed self-initiated.
    pub fn normalize(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return SubmissionType::SelfReferral;
        };
        if let Some((_, t)) = ALIASES.iter().find(|(alias, _)| *alias == raw) {
            return *t;
        }
        match SubmissionType::ALL.into_iter().find(|t| t.as_str() == raw) {
            Some(t) => t,
            None => {
                warn!(value = raw, "unknown submission type, defaulting to Self-Referral");
                SubmissionType::SelfReferral
            }
        }
    }
}

impl fmt::Display for SubmissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for SubmissionType {
    fn from(s: String) -> Self {
        SubmissionType::normalize(Some(&s))
    }
}

impl From<SubmissionType> for String {
    fn from(t: SubmissionType) -> Self {
        t.as_str().to_string()
    }
}
