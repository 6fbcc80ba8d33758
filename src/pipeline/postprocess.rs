//! Post-processing: validate the model's JSON and normalise it into a
//! [`SolutionResult`].
//!
//! Schema-guided generation makes a well-formed answer likely, not certain.
//! This module is where the declared shape is enforced:
//!
//! 1. Empty response text is read as `{}`
//! 2. The top level must be a JSON object
//! 3. Missing or mistyped `explanation` → [`DEFAULT_EXPLANATION`]
//! 4. Missing or mistyped `sourceCode` → empty string
//! 5. Missing `testCases` → empty list; non-object entries are dropped;
//!    scalar fields are coerced to text
//! 6. Code fences the model embedded in `sourceCode` are stripped

use crate::model::{SolutionResult, TestCase};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// Explanation used when the model omits one.
pub const DEFAULT_EXPLANATION: &str = "Không có lời giải thích.";

/// Parse and normalise the raw response text.
///
/// Returns `Err` only when the text is not JSON or not an object. Every
/// field-level problem is coerced instead.
pub fn parse_response(text: &str) -> Result<SolutionResult, serde_json::Error> {
    let text = text.trim();
    let value: Value = if text.is_empty() {
        Value::Object(Map::new())
    } else {
        serde_json::from_str(text)?
    };

    let kind = kind_of(&value);
    let Value::Object(obj) = value else {
        return Err(serde::de::Error::custom(format!(
            "expected a JSON object, got {kind}"
        )));
    };

    let markdown = non_empty_string(obj.get("explanation"))
        .unwrap_or_else(|| DEFAULT_EXPLANATION.to_string());
    let raw_code = non_empty_string(obj.get("sourceCode"))
        .map(|c| strip_code_fences(&c))
        .unwrap_or_default();
    let test_cases = match obj.get("testCases") {
        Some(Value::Array(items)) => items.iter().filter_map(to_test_case).collect(),
        _ => Vec::new(),
    };

    Ok(SolutionResult {
        markdown,
        raw_code,
        test_cases,
    })
}

// ── Code fences ───────────────────────────────────────────────────────────────

static RE_OPEN_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```[A-Za-z0-9_+#.-]*[ \t]*\r?\n").unwrap());
static RE_CLOSE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n?```\s*$").unwrap());

/// Remove a leading ```` ```lang ```` line and a trailing ```` ``` ````, then trim.
pub fn strip_code_fences(code: &str) -> String {
    let s = code.trim_start();
    let s = RE_OPEN_FENCE.replace(s, "");
    let s = RE_CLOSE_FENCE.replace(&s, "");
    s.trim().to_string()
}

// ── Field coercion ───────────────────────────────────────────────────────────

/// A string field, treating `""` the same as absent.
fn non_empty_string(v: Option<&Value>) -> Option<String> {
    match v {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn to_test_case(v: &Value) -> Option<TestCase> {
    let obj = v.as_object()?;
    Some(TestCase {
        input: coerce_text(obj.get("input")),
        output: coerce_text(obj.get("output")),
    })
}

fn coerce_text(v: Option<&Value>) -> String {
    match v {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
