//! Recovery of a single JSON object from free-form generator output.
//!
//! Generators wrap their answer in prose, markdown fences or reasoning sections
//! (sometimes never closed). Three strategies are tried in order and the first one
//! producing a JSON object wins:
//!
//! 1. the whole trimmed text,
//! 2. the content of the first `json`-tagged fenced block, else of the first fenced block,
//! 3. the span from the first `{` to the last `}` of the fence-stripped text.

use serde_json::{Map, Value};

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractFailure {
    /// Nothing but whitespace.
    Empty,
    /// No strategy produced a JSON object.
    NoObject,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Parsed(Map<String, Value>),
    Failed(ExtractFailure),
}

impl Extraction {
    pub fn into_fields(self) -> Option<Map<String, Value>> {
        match self {
            Extraction::Parsed(fields) => Some(fields),
            Extraction::Failed(_) => None,
        }
    }
}

pub fn extract_decision_object(raw_text: &str) -> Extraction {
    let text = raw_text.trim();
    if text.is_empty() {
        return Extraction::Failed(ExtractFailure::Empty);
    }

    if let Some(fields) = parse_object(text) {
        return Extraction::Parsed(fields);
    }

    let stripped = strip_code_fence(text);
    if let Some(fields) = parse_object(stripped) {
        return Extraction::Parsed(fields);
    }

    if let (Some(first), Some(last)) = (stripped.find('{'), stripped.rfind('}')) {
        if last > first {
            if let Some(fields) = parse_object(&stripped[first..=last]) {
                return Extraction::Parsed(fields);
            }
        }
    }

    Extraction::Failed(ExtractFailure::NoObject)
}

fn parse_object(candidate: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(fields)) => Some(fields),
        _ => None,
    }
}

/// Content of the first ```` ```json ```` block, else of the first fenced block, or
/// `text` unchanged when there is no fence.
///
/// A language tag directly after the opening fence is skipped. An unterminated fence
/// yields everything after the opening marker.
fn strip_code_fence(text: &str) -> &str {
    // ASCII lowercasing keeps byte offsets valid for `text`
    let open = match text.to_ascii_lowercase().find(JSON_FENCE) {
        Some(open) => open,
        None => match text.find(FENCE) {
            Some(open) => open,
            None => return text,
        },
    };
    let after_open = &text[open + FENCE.len()..];
    let tag_len = after_open
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
        .unwrap_or(after_open.len());
    let body = &after_open[tag_len..];
    let body = match body.find(FENCE) {
        Some(close) => &body[..close],
        None => body,
    };
    body.trim()
}
