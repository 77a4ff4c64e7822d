/// Response parser: pulls a JSON object out of noisy model output.
///
/// Repairs only the mistakes models repeatedly make: code fences, prose around the
/// payload, and trailing commas. Anything else is a `ParseFailure`.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

/// Model output that could not be decoded into a JSON object.
#[derive(Debug, Clone, Error)]
#[error("AI output was not a JSON object: {reason}")]
pub struct ParseFailure {
    /// The untouched provider output, kept for the raw-text fallback
    pub raw: String,
    pub reason: String,
}

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)```[A-Za-z0-9_+-]*\s*(.*?)```").expect("fence pattern is valid")
    })
}

fn trailing_comma_regex() -> &'static Regex {
    static TRAILING: OnceLock<Regex> = OnceLock::new();
    TRAILING.get_or_init(|| Regex::new(r",\s*([}\]])").expect("trailing comma pattern is valid"))
}

/// Extract the candidate object from raw model output.
pub fn extract_json(raw: &str) -> Result<Map<String, Value>, ParseFailure> {
    let text = raw.trim();
    let text = strip_code_fence(text);
    let text = outermost_object(text);
    let repaired = trailing_comma_regex().replace_all(text, "$1");

    match serde_json::from_str::<Value>(&repaired) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(other) => Err(ParseFailure {
            raw: raw.to_string(),
            reason: format!("expected an object, found {}", json_kind(&other)),
        }),
        Err(e) => Err(ParseFailure {
            raw: raw.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Inner content of the first fenced block, or the text unchanged.
fn strip_code_fence(text: &str) -> &str {
    fence_regex()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(text)
}

/// Substring from the first `{` to the last `}`, or the text unchanged.
fn outermost_object(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
