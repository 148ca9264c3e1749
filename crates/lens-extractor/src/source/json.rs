//! JSON payload source (marketplace APIs, embedded state)

use super::regex_candidates;
use crate::error::ExtractorError;
use async_trait::async_trait;
use lens_domain::{Probe, SourceAccessor, SourceError};
use serde_json::Value;

/// An API payload
#[derive(Debug, Clone)]
pub struct JsonSource {
    label: String,
    value: Value,
}

impl JsonSource {
    /// Wrap an already parsed payload
    pub fn new(label: impl Into<String>, value: Value) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }

    /// Parse a payload from text
    pub fn parse(label: impl Into<String>, text: &str) -> Result<Self, ExtractorError> {
        Ok(Self::new(label, serde_json::from_str(text)?))
    }

    /// The payload
    pub fn value(&self) -> &Value {
        &self.value
    }
}

#[async_trait]
impl SourceAccessor for JsonSource {
    fn describe(&self) -> String {
        self.label.clone()
    }

    async fn probe(&self, probe: &Probe) -> Result<Vec<String>, SourceError> {
        match probe {
            Probe::JsonPointer(_) | Probe::JsonKey(_) => Ok(json_candidates(&self.value, probe)),
            Probe::Regex(pattern) => regex_candidates(pattern, &self.value.to_string()),
            other => Err(SourceError::Unsupported(other.kind().to_string())),
        }
    }
}

/// Answer a `json:` or `key:` probe against a value
///
/// An array at the target expands into one candidate per element. Other
/// probe kinds yield nothing.
pub(crate) fn json_candidates(value: &Value, probe: &Probe) -> Vec<String> {
    let mut targets = Vec::new();
    match probe {
        Probe::JsonPointer(pointer) => targets.extend(value.pointer(pointer)),
        Probe::JsonKey(key) => find_key(value, key, &mut targets),
        _ => {}
    }

    let mut out = Vec::new();
    for target in targets {
        match target {
            Value::Array(items) => out.extend(items.iter().filter_map(candidate_text)),
            other => out.extend(candidate_text(other)),
        }
    }
    out
}

/// Every value stored under `key`, at any depth
fn find_key<'a>(value: &'a Value, key: &str, out: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                if k == key {
                    out.push(v);
                }
                find_key(v, key, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                find_key(item, key, out);
            }
        }
        _ => {}
    }
}

fn candidate_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}
