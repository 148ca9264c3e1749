//! The assembled output of one extraction run

use crate::{Product, Review};
use serde::Serialize;

/// How a single field obtained its value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Resolution {
    /// A strategy produced an accepted value
    Extracted {
        /// Identifier of the strategy that won
        strategy: String,
    },

    /// Every strategy missed; the declared default literal was used
    Defaulted,

    /// Every strategy missed and the field has no literal default
    Unknown,
}

/// Resolution record for one field of an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldResolution {
    /// Field name
    pub field: String,

    /// How the value was obtained
    #[serde(flatten)]
    pub resolution: Resolution,
}

/// Product plus reviews for one extraction run
///
/// Constructed in one shot once every field is resolved; there are no
/// setters, so a caller never observes a partially built entity.
#[derive(Debug, Clone, Serialize)]
pub struct Entity {
    product: Product,
    reviews: Vec<Review>,
    #[serde(skip)]
    resolutions: Vec<FieldResolution>,
}

impl Entity {
    /// Assemble an entity from fully resolved parts
    pub fn new(product: Product, reviews: Vec<Review>, resolutions: Vec<FieldResolution>) -> Self {
        Self {
            product,
            reviews,
            resolutions,
        }
    }

    /// The product record
    pub fn product(&self) -> &Product {
        &self.product
    }

    /// The review records, in acceptance order
    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    /// Per-field resolution trail
    pub fn resolutions(&self) -> &[FieldResolution] {
        &self.resolutions
    }

    /// Resolution of a named field
    pub fn resolution_of(&self, field: &str) -> Option<&Resolution> {
        self.resolutions
            .iter()
            .find(|r| r.field == field)
            .map(|r| &r.resolution)
    }

    /// Number of reviews that were actually scraped
    pub fn scraped_review_count(&self) -> usize {
        self.reviews.iter().filter(|r| !r.is_synthesized()).count()
    }

    /// Whether the review list was filled from the fallback catalogue
    pub fn has_synthesized_reviews(&self) -> bool {
        self.reviews.iter().any(Review::is_synthesized)
    }

    /// Product serialized as an array of one object, the shape the analysis stage reads
    pub fn product_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(std::slice::from_ref(&self.product))
    }

    /// Reviews serialized as an array of objects
    pub fn reviews_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.reviews)
    }

    /// Split into owned product and reviews
    pub fn into_parts(self) -> (Product, Vec<Review>) {
        (self.product, self.reviews)
    }
}
