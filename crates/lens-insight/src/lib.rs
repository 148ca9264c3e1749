//! Lens Insight
//!
//! Model-backed analysis of extracted products and reviews.
//!
//! # Stages
//!
//! - **assessment**: sentiment and eight 1-5 criteria per review
//! - **audience**: audience segments per product from a sample of its reviews
//! - **copy**: one marketing description per audience segment
//!
//! Every stage talks to the model through the `LlmProvider` trait. Structured
//! replies go through `recover_structured`; a reply that cannot be read is
//! stored as a raw-response record and the stage moves on.
//!
//! # Example Usage
//!
//! ```no_run
//! use lens_insight::{assess_reviews, load_products, load_reviews, read_json};
//! use lens_llm::MockProvider;
//!
//! # async fn example() -> lens_insight::Result<()> {
//! let products = load_products(&read_json("product.json")?)?;
//! let reviews = load_reviews(&read_json("reviews.json")?);
//!
//! let provider = MockProvider::new(r#"{"тональность": "нейтральный", "критерии": []}"#);
//! for assessment in assess_reviews(&provider, &products, &reviews).await {
//!     println!("{}: {:?}", assessment.review_id, assessment.sentiment());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod assessment;
pub mod audience;
pub mod copy;
pub mod error;
pub mod loaders;

pub use assessment::{assess_reviews, Assessment, CriterionScore, CRITERIA};
pub use audience::{analyze_audience, AudienceReport, ProductRef, Segment};
pub use copy::{generate_copy, load_segments, CopyReport, SegmentCopy};
pub use error::{InsightError, Result};
pub use loaders::{load_products, load_reviews, read_json, ProductInput, ReviewInput};
