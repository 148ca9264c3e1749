//! Error types for the Extractor

use lens_domain::ProbeParseError;
use thiserror::Error;

/// Errors that can occur during extraction
///
/// Strategy misses and exhausted fields are not errors; they are resolved
/// inside the pipeline. Only a lost source aborts a run.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// The source could not be read at all (page never loaded, provider down)
    #[error("Source unavailable for {target}: {reason}")]
    SourceUnavailable {
        /// URL or label of the source that failed
        target: String,
        /// Underlying failure
        reason: String,
    },

    /// Marketplace profile is malformed
    #[error("Profile error: {0}")]
    Profile(String),

    /// Probe string in a profile could not be parsed
    #[error("Invalid probe: {0}")]
    Probe(#[from] ProbeParseError),

    /// Regular expression in a profile or config could not be compiled
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(String),

    /// A concurrent extraction task died before reporting
    #[error("Task error: {0}")]
    Task(String),
}

impl ExtractorError {
    /// Short class name, used when reporting which run failed and why
    pub fn class(&self) -> &'static str {
        match self {
            ExtractorError::SourceUnavailable { .. } => "source-unavailable",
            ExtractorError::Profile(_) | ExtractorError::Probe(_) | ExtractorError::Pattern(_) => {
                "profile"
            }
            ExtractorError::Config(_) => "config",
            ExtractorError::JsonParse(_) | ExtractorError::TomlParse(_) => "parse",
            ExtractorError::Task(_) => "task",
        }
    }
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::JsonParse(e.to_string())
    }
}

impl From<toml::de::Error> for ExtractorError {
    fn from(e: toml::de::Error) -> Self {
        ExtractorError::TomlParse(e.to_string())
    }
}
