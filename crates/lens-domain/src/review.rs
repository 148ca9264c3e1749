//! Review records and their provenance

use serde::{Deserialize, Serialize};

/// Where a review record came from
///
/// Placeholder records are substituted when nothing could be scraped; they
/// are tagged so they are never mistaken for genuine customer text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Extracted from the source
    #[default]
    Scraped,

    /// Produced from the fallback catalogue
    Synthesized,
}

impl Provenance {
    /// Get the provenance name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Scraped => "scraped",
            Provenance::Synthesized => "synthesized",
        }
    }
}

/// A single review attached to a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Review identifier, unique within one extraction batch
    pub id: String,

    /// Identifier of the product this review belongs to
    pub product_id: String,

    /// Review body
    pub text: String,

    /// Star rating (1-5), when one could be detected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,

    /// Origin of the record
    #[serde(default)]
    pub provenance: Provenance,
}

impl Review {
    /// Whether this record came from the fallback catalogue
    pub fn is_synthesized(&self) -> bool {
        self.provenance == Provenance::Synthesized
    }
}
