// src/fetch/payload.rs

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const SUCCESS_MESSAGE: &str = "success";
pub const ACTIVE_STATUS: &str = "ACTIVE";

/// Top-level document returned by the submissions endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FormsResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "responseCode")]
    pub response_code: Option<u16>,
    #[serde(default, rename = "limit-left")]
    pub limit_left: Option<i64>,
    #[serde(default)]
    pub content: Vec<RawSubmission>,
}

impl FormsResponse {
    pub fn is_success(&self) -> bool {
        self.message.eq_ignore_ascii_case(SUCCESS_MESSAGE)
    }

    pub fn active_count(&self) -> usize {
        self.content.iter().filter(|s| s.is_active()).count()
    }
}

/// One respondent's submission: a status plus answers keyed by slot id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawSubmission {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub answers: BTreeMap<String, Answer>,
}

impl RawSubmission {
    pub fn is_active(&self) -> bool {
        self.status == ACTIVE_STATUS
    }

    pub fn answer(&self, slot: &str) -> Option<&Answer> {
        self.answers.get(slot)
    }
}

/// A single answer slot. `text` is the question label; the value may be
/// carried in `answer`, in `prettyFormat`, or both.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub answer: Option<Value>,
    /// `Some` whenever the key is present, `Some(Value::Null)` included.
    #[serde(
        default,
        rename = "prettyFormat",
        deserialize_with = "key_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub pretty_format: Option<Value>,
}

fn key_present<'de, D>(d: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(d).map(Some)
}

/// Shape of the raw `answer` value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnswerValue<'a> {
    Scalar(&'a Value),
    Structured(&'a Map<String, Value>),
}

impl Answer {
    pub fn label(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim)
    }

    pub fn value(&self) -> Option<AnswerValue<'_>> {
        match self.answer.as_ref()? {
            Value::Object(map) => Some(AnswerValue::Structured(map)),
            other => Some(AnswerValue::Scalar(other)),
        }
    }

    /// `true` when the answer carries a `prettyFormat` key, even a null one.
    pub fn has_formatted(&self) -> bool {
        self.pretty_format.is_some()
    }

    pub fn formatted(&self) -> Option<String> {
        self.pretty_format.as_ref().and_then(value_text)
    }
}

/// Flatten a JSON value to the text stored in a table cell.
/// `null` is missing; nested arrays/objects keep their compact JSON form.
pub fn value_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_api_document() {
        let doc = json!({
            "responseCode": 200,
            "message": "success",
            "limit-left": 987,
            "content": [
                {
                    "id": "5801",
                    "status": "ACTIVE",
                    "answers": {
                        "3": { "text": "Date", "prettyFormat": "03-14-2024", "answer": {"month": "03"} },
                        "7": { "text": "Age", "answer": "34", "type": "control_textbox" }
                    }
                },
                { "status": "DELETED", "answers": {} }
            ]
        });
        let resp: FormsResponse = serde_json::from_value(doc).unwrap();
        assert!(resp.is_success());
        assert_eq!(resp.limit_left, Some(987));
        assert_eq!(resp.content.len(), 2);
        assert_eq!(resp.active_count(), 1);

        let date = resp.content[0].answer("3").unwrap();
        assert_eq!(date.label(), Some("Date"));
        assert_eq!(date.formatted().as_deref(), Some("03-14-2024"));
        assert!(matches!(date.value(), Some(AnswerValue::Structured(_))));

        let age = resp.content[0].answer("7").unwrap();
        assert!(!age.has_formatted());
        assert!(matches!(age.value(), Some(AnswerValue::Scalar(_))));
    }

    #[test]
    fn null_pretty_format_still_counts_as_formatted() {
        let a: Answer = serde_json::from_value(json!({
            "answer": { "other": "Nonbinary" },
            "prettyFormat": null
        }))
        .unwrap();
        assert!(a.has_formatted());
        assert_eq!(a.formatted(), None);

        let b: Answer = serde_json::from_value(json!({ "answer": "Female" })).unwrap();
        assert!(!b.has_formatted());
        assert!(!serde_json::to_string(&b).unwrap().contains("prettyFormat"));
    }

    #[test]
    fn value_text_flattens_scalars() {
        assert_eq!(value_text(&json!(null)), None);
        assert_eq!(value_text(&json!("x")).as_deref(), Some("x"));
        assert_eq!(value_text(&json!(12)).as_deref(), Some("12"));
        assert_eq!(value_text(&json!(["a", "b"])).as_deref(), Some(r#"["a","b"]"#));
    }
}
