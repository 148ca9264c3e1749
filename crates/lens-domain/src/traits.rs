//! Trait definitions for external interactions
//!
//! These traits define the boundaries between extraction logic and
//! infrastructure. Implementations live in other crates.

use crate::Probe;
use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by a source accessor for one probe
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// This kind of source cannot answer this kind of probe
    #[error("Probe not supported by this source: {0}")]
    Unsupported(String),

    /// The probe ran but failed (bad selector, timeout, transient read error)
    #[error("Probe failed: {0}")]
    Miss(String),

    /// The source itself is gone; nothing more can be extracted from it
    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

impl SourceError {
    /// Whether this failure must abort the current extraction run
    pub fn is_fatal(&self) -> bool {
        matches!(self, SourceError::Unavailable(_))
    }
}

/// Read access to one source snapshot (page, document, API payload, completion)
///
/// Implemented by the infrastructure layer (lens-extractor sources)
#[async_trait]
pub trait SourceAccessor: Send + Sync {
    /// Human readable identity of the source, usually its URL
    fn describe(&self) -> String;

    /// Run a probe and return zero or more raw candidates, in document order
    async fn probe(&self, probe: &Probe) -> Result<Vec<String>, SourceError>;
}

/// Trait for LLM provider operations
///
/// Implemented by the infrastructure layer (lens-llm)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Error type for LLM operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Model identifier, recorded next to every result
    fn model_name(&self) -> &str;

    /// Generate a chat completion from a system and a user message
    async fn chat(&self, system: &str, user: &str) -> Result<String, Self::Error>;

    /// Generate text completion from a single prompt
    async fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        self.chat("", prompt).await
    }
}
