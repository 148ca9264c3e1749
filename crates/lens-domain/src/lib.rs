//! Lens Domain Layer
//!
//! This crate contains the data model shared by every Lens crate and the
//! trait seams behind which all external collaborators live.
//!
//! ## Key Concepts
//!
//! - **Product**: The assembled product record for one extraction run
//! - **Review**: A single review record, scraped or synthesized
//! - **Provenance**: Whether a review came from the page or from a placeholder catalogue
//! - **Entity**: Product plus its reviews, built once and never mutated
//! - **Probe**: A named query against a source (CSS selector, JSON pointer, regex, ...)
//!
//! ## Architecture
//!
//! This crate follows the same layering as the rest of the workspace:
//! - Pure data and trait definitions only
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all external interactions (page sources, LLM providers)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entity;
pub mod probe;
pub mod product;
pub mod review;
pub mod traits;

// Re-exports for convenience
pub use entity::{Entity, FieldResolution, Resolution};
pub use probe::{Probe, ProbeParseError};
pub use product::{FieldValue, Product};
pub use review::{Provenance, Review};
pub use traits::{LlmProvider, SourceAccessor, SourceError};
