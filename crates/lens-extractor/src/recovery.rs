//! Recover structured data from free-form text
//!
//! Rendered pages and model completions are not required to produce valid
//! JSON. Everything that tolerates malformed input lives here, so the rest of
//! the crate can parse strictly.
//!
//! Recovery proceeds in order:
//!
//! 1. Remove `<think>...</think>` reasoning blocks
//! 2. Parse the whole text strictly
//! 3. Parse the largest `{...}` or `[...]` span
//! 4. Retry that span once with single quotes turned into double quotes
//! 5. Give up and return [`Recovered::RawFallback`]

use regex::Regex;
use serde_json::{json, Value};
use std::sync::LazyLock;
use tracing::debug;

static REASONING_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<think>.*?</think>").expect("hardcoded regex pattern is valid")
});

static BRACKETED_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)(\{.*\}|\[.*\])").expect("hardcoded regex pattern is valid")
});

/// Outcome of structured recovery
#[derive(Debug, Clone, PartialEq)]
pub enum Recovered {
    /// A JSON object or array was recovered
    Structured(Value),

    /// Nothing parseable was found
    RawFallback {
        /// The text as received
        original: String,
        /// Best bracketed span found, if any
        candidate: Option<String>,
    },
}

impl Recovered {
    /// Whether structured data was recovered
    pub fn is_structured(&self) -> bool {
        matches!(self, Recovered::Structured(_))
    }

    /// Borrow the structured value, if any
    pub fn structured(&self) -> Option<&Value> {
        match self {
            Recovered::Structured(value) => Some(value),
            Recovered::RawFallback { .. } => None,
        }
    }

    /// Convert into a JSON value that can be stored in place of the expected result
    ///
    /// A raw fallback becomes `{"raw_response", "raw_extracted", "parse_error"}`
    /// so callers can keep going and inspect the failure later.
    pub fn into_value(self) -> Value {
        match self {
            Recovered::Structured(value) => value,
            Recovered::RawFallback {
                original,
                candidate,
            } => json!({
                "raw_response": original,
                "raw_extracted": candidate,
                "parse_error": "no valid JSON object or array found",
            }),
        }
    }
}

/// Remove paired `<think>...</think>` blocks and trim the remainder
pub fn strip_reasoning(text: &str) -> String {
    REASONING_BLOCK.replace_all(text, "").trim().to_string()
}

/// Recover a JSON object or array from text that may carry commentary,
/// code fences, reasoning blocks or single-quoted keys
pub fn recover_structured(text: &str) -> Recovered {
    let cleaned = strip_reasoning(text);

    if let Some(value) = parse_container(&cleaned) {
        return Recovered::Structured(value);
    }

    let candidate = BRACKETED_SPAN
        .find(&cleaned)
        .map(|m| m.as_str().to_string());

    if let Some(span) = candidate.as_deref() {
        if let Some(value) = parse_container(span) {
            return Recovered::Structured(value);
        }
        if span.contains('\'') {
            if let Some(value) = parse_container(&span.replace('\'', "\"")) {
                debug!("Recovered JSON after quote repair");
                return Recovered::Structured(value);
            }
        }
    }

    debug!("No structured data recovered from {} chars", text.len());
    Recovered::RawFallback {
        original: text.to_string(),
        candidate,
    }
}

/// Strict parse that only accepts objects and arrays
fn parse_container(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(value),
        _ => None,
    }
}
