//! Lens Extractor
//!
//! Turns many unreliable ways of getting a value into one value or a
//! documented fallback.
//!
//! # Overview
//!
//! Product pages, marketplace APIs and model completions are all treated as
//! sources that answer probes (CSS selectors, JSON pointers, regular
//! expressions). For every product field a profile lists probes in order of
//! preference; the first value that passes the field's acceptance test wins.
//! Reviews are gathered from every review probe into one bounded,
//! deduplicating collector, and replaced by a tagged placeholder catalogue
//! when nothing was found.
//!
//! # Architecture
//!
//! ```text
//! Source → StrategyChain (per field) → numeric / structured recovery
//!        → ReviewCollector → FallbackSupplier (if empty) → Entity
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use lens_extractor::{ExtractionPipeline, ExtractorConfig, PageFetcher, Profile, Target};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let url = "https://www.wildberries.ru/catalog/264196671/detail.aspx";
//! let profile = Profile::for_url(url)?;
//! let pipeline = ExtractionPipeline::from_profile(&profile, &ExtractorConfig::default())?;
//!
//! let source = PageFetcher::new()?.fetch_for(&profile, url).await?;
//! let entity = pipeline.run(&source, &Target::new(profile.product_id(url), url)).await?;
//!
//! println!("{}", entity.product_json()?);
//! println!("{} reviews", entity.reviews().len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod chain;
mod collector;
mod config;
mod error;
mod fallback;
mod fetch;
mod numeric;
mod pipeline;
mod profile;
mod recovery;
pub mod source;

#[cfg(test)]
mod tests;

pub use chain::{
    Acceptance, ExtractionResult, Field, FieldDefault, ProbeStrategy, Strategy, StrategyChain, Timed, ValueKind,
};
pub use collector::{Boilerplate, CollectorLimits, ReviewCollector};
pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use fallback::{FallbackSupplier, ReviewTemplate};
pub use fetch::PageFetcher;
pub use numeric::{extract_number, extract_rating, numeric_candidates};
pub use pipeline::{ExtractionPipeline, ReviewPlan, Target};
pub use profile::{FieldSpec, ProbeEntry, Profile, ReviewSpec, BUILTIN_PROFILES};
pub use recovery::{recover_structured, strip_reasoning, Recovered};
pub use source::{CompletionSource, HtmlSource, JsonSource, LayeredSource};
