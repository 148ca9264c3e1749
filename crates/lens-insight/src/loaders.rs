//! Tolerant input loaders
//!
//! Product and review files come from different producers (the extractor,
//! hand-edited files, earlier analysis runs), so each field is looked up
//! through a prioritized list of keys instead of a fixed schema.

use crate::error::{InsightError, Result};
use lens_domain::Provenance;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Keys that may hold a product identifier, in priority order
pub const PRODUCT_ID_KEYS: &[&str] = &["product_id", "id", "sku", "article"];

/// Keys that may hold a characteristics table
pub const CHARACTERISTICS_KEYS: &[&str] = &["characteristics", "characteristics_text"];

/// Keys that may hold a review body
pub const REVIEW_TEXT_KEYS: &[&str] = &["review", "review_text", "text"];

/// Keys that may hold the product a review belongs to
pub const REVIEW_PRODUCT_KEYS: &[&str] = &["product_id", "productId", "product"];

/// Keys under which a review list may be wrapped
pub const REVIEW_WRAPPER_KEYS: &[&str] = &["reviews", "results", "data"];

/// Product as seen by the analysis stages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductInput {
    /// Product identifier, when the input had one
    pub id: Option<String>,
    /// Product title
    pub name: String,
    /// Product page
    pub url: String,
    /// Price as written in the input
    pub price: String,
    /// Currency code
    pub currency: String,
    /// Marketing description
    pub description: String,
    /// Characteristics, flattened to text
    pub characteristics: String,
}

/// Review as seen by the analysis stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewInput {
    /// Review identifier, when the input had one
    pub id: Option<String>,
    /// Product the review belongs to, when known
    pub product_id: Option<String>,
    /// Review body
    pub text: String,
    /// Placeholder reviews are `Synthesized`; inputs without a tag count as scraped
    #[serde(default)]
    pub provenance: Provenance,
}

impl ReviewInput {
    /// Whether this review is a placeholder rather than customer text
    pub fn is_synthesized(&self) -> bool {
        self.provenance == Provenance::Synthesized
    }
}

/// Read and parse a JSON file
pub fn read_json(path: impl AsRef<Path>) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Render a scalar as text; strings as-is, numbers and booleans via JSON
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// First key in `keys` holding a non-empty scalar
pub fn first_text(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| object.get(*key).and_then(scalar_text))
}

fn characteristics_text(object: &Map<String, Value>) -> String {
    for key in CHARACTERISTICS_KEYS {
        match object.get(*key) {
            Some(Value::Object(table)) => {
                return table
                    .iter()
                    .map(|(k, v)| format!("- {}: {}", k, scalar_text(v).unwrap_or_else(|| v.to_string())))
                    .collect::<Vec<_>>()
                    .join("\n");
            }
            Some(value) => {
                if let Some(text) = scalar_text(value) {
                    return text;
                }
            }
            None => {}
        }
    }
    String::new()
}

fn product_from(object: &Map<String, Value>, fallback_id: Option<&str>) -> ProductInput {
    let text = |key: &str| first_text(object, &[key]).unwrap_or_default();
    ProductInput {
        id: first_text(object, PRODUCT_ID_KEYS).or_else(|| fallback_id.map(str::to_string)),
        name: text("name"),
        url: text("url"),
        price: text("price"),
        currency: text("currency"),
        description: text("description"),
        characteristics: characteristics_text(object),
    }
}

/// Normalize a products document
///
/// Accepts an array of products, a single product object (one with `name`),
/// or a map of id to product.
pub fn load_products(document: &Value) -> Result<Vec<ProductInput>> {
    match document {
        Value::Array(items) => Ok(items
            .iter()
            .filter_map(Value::as_object)
            .map(|object| product_from(object, None))
            .collect()),
        Value::Object(object) if object.contains_key("name") => Ok(vec![product_from(object, None)]),
        Value::Object(map) => Ok(map
            .iter()
            .filter_map(|(id, value)| value.as_object().map(|object| product_from(object, Some(id))))
            .collect()),
        other => Err(InsightError::Input(format!(
            "expected products as an array or object, got {}",
            kind_of(other)
        ))),
    }
}

/// Normalize a reviews document
///
/// Accepts an array of review objects, an array of plain strings, an object
/// wrapping such an array, or a single review object. Entries without any
/// text are skipped.
pub fn load_reviews(document: &Value) -> Vec<ReviewInput> {
    match document {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(object) => review_from(object),
                Value::String(text) if !text.trim().is_empty() => Some(ReviewInput {
                    id: None,
                    product_id: None,
                    text: text.clone(),
                    provenance: Provenance::Scraped,
                }),
                _ => None,
            })
            .collect(),
        Value::Object(object) => {
            let wrapped = REVIEW_WRAPPER_KEYS
                .iter()
                .find_map(|key| object.get(*key).filter(|v| v.is_array()));
            match wrapped {
                Some(list) => load_reviews(list),
                None => review_from(object).into_iter().collect(),
            }
        }
        _ => Vec::new(),
    }
}

fn review_from(object: &Map<String, Value>) -> Option<ReviewInput> {
    let text = first_text(object, REVIEW_TEXT_KEYS)?;
    Some(ReviewInput {
        id: first_text(object, &["id", "review_id"]),
        product_id: first_text(object, REVIEW_PRODUCT_KEYS),
        text,
        provenance: object
            .get("provenance")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default(),
    })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
