//! Product record and the values its fields resolve to

use serde::{Deserialize, Serialize};
use std::fmt;

/// A resolved field value
///
/// Text fields (name, description, characteristics) carry strings, numeric
/// fields (price) carry an integer recovered from noisy text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Integer value (prices, counts)
    Number(u64),

    /// Free text value
    Text(String),
}

impl FieldValue {
    /// Borrow the text, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Number(_) => None,
        }
    }

    /// Get the number, if this is a numeric value
    pub fn as_number(&self) -> Option<u64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }

    /// Length in characters of the textual form
    pub fn char_len(&self) -> usize {
        match self {
            FieldValue::Text(s) => s.chars().count(),
            FieldValue::Number(n) => n.to_string().len(),
        }
    }

    /// Whether the value is an empty (or whitespace-only) string
    pub fn is_blank(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<u64> for FieldValue {
    fn from(n: u64) -> Self {
        FieldValue::Number(n)
    }
}

/// Product record as consumed by the analysis stage
///
/// Field names are part of the output contract: downstream readers look
/// them up by name, so they must not be renamed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier (e.g. "wb_264196671")
    pub id: String,

    /// Product title
    pub name: String,

    /// Page the product was extracted from
    pub url: String,

    /// Price in whole currency units; `None` when it could not be recovered
    pub price: Option<u64>,

    /// ISO currency code (e.g. "RUB")
    pub currency: String,

    /// Marketing description
    #[serde(default)]
    pub description: String,

    /// Flattened characteristics table
    #[serde(default)]
    pub characteristics: String,
}
