//! Extraction reply parsing
//!
//! The detail-extraction stage asks the model for a JSON object but nothing
//! enforces it, so the reply may wrap the object in prose or code fences,
//! or omit it entirely. The scanner walks the text and returns the first
//! brace-balanced span that deserializes, honoring string literals and
//! escapes so braces inside values do not confuse it.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Whether the model has enough information to resolve the request
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "Option<Value>", rename_all = "snake_case")]
pub enum ExtractionStatus {
    #[default]
    NeedsInfo,
    Ready,
}

/// Only the string literals `ready` and `ready_to_resolve` mean ready; any
/// other value, string or not, is `NeedsInfo`.
impl From<Option<Value>> for ExtractionStatus {
    fn from(raw: Option<Value>) -> Self {
        match raw.as_ref().and_then(Value::as_str).map(|s| s.trim().to_lowercase()) {
            Some(s) if s == "ready" || s == "ready_to_resolve" => ExtractionStatus::Ready,
            _ => ExtractionStatus::NeedsInfo,
        }
    }
}

/// Structured form of the extraction reply
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtractionResult {
    #[serde(default)]
    pub status: ExtractionStatus,
    #[serde(default, deserialize_with = "object_or_empty")]
    pub extracted_data: Map<String, Value>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub response_to_user: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub follow_up_question: Option<String>,
}

impl ExtractionResult {
    pub fn is_ready(&self) -> bool {
        self.status == ExtractionStatus::Ready
    }

    /// Customer-facing text: `response_to_user`, else the follow-up question
    pub fn user_message(&self) -> Option<&str> {
        non_blank(self.response_to_user.as_deref())
            .or_else(|| non_blank(self.follow_up_question.as_deref()))
    }

    pub fn response_to_user(&self) -> Option<&str> {
        non_blank(self.response_to_user.as_deref())
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

/// Anything but a JSON object (`null`, `[]`, `"none"`, ...) is an empty map.
fn object_or_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

/// Non-string values are treated as absent.
fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(Some(text)),
        _ => Ok(None),
    }
}

/// Parse the first embedded extraction object out of a model reply
pub fn parse_extraction(raw: &str) -> Option<ExtractionResult> {
    first_json_object(raw)
}

/// First brace-balanced `{...}` span in `text` that deserializes as `T`.
///
/// A balanced span that fails to deserialize is skipped as a whole so its
/// nested objects are never mistaken for the outer one. An opening brace that
/// never closes is skipped by one character.
pub fn first_json_object<T: DeserializeOwned>(text: &str) -> Option<T> {
    let mut pos = 0;

    while let Some(offset) = text[pos..].find('{') {
        let start = pos + offset;
        match balanced_object_end(text, start) {
            Some(end) => {
                if let Ok(value) = serde_json::from_str::<T>(&text[start..end]) {
                    return Some(value);
                }
                pos = end;
            }
            None => pos = start + 1,
        }
    }

    None
}

/// Exclusive end index of the object opening at `start`, if it closes.
///
/// Works on bytes: every delimiter of interest is ASCII and never appears
/// inside a multi-byte UTF-8 sequence.
fn balanced_object_end(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    debug_assert_eq!(bytes.get(start), Some(&b'{'));

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}
