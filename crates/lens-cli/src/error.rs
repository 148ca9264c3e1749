//! Error types for the CLI application.

use lens_extractor::ExtractorError;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Extraction failed for a URL
    #[error("Extraction failed for {url} [{class}]: {source}")]
    Extraction {
        /// Product page
        url: String,
        /// Short error class
        class: &'static str,
        /// Underlying error
        #[source]
        source: ExtractorError,
    },

    /// Extractor error outside a single URL (profile loading, setup)
    #[error("Extractor error: {0}")]
    Extractor(#[from] ExtractorError),

    /// Model provider error
    #[error("LLM error: {0}")]
    Llm(#[from] lens_llm::LlmError),

    /// Analysis input error
    #[error("Analysis error: {0}")]
    Insight(#[from] lens_insight::InsightError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CliError {
    /// Wrap an extraction failure with the URL it happened on
    pub fn extraction(url: impl Into<String>, source: ExtractorError) -> Self {
        CliError::Extraction {
            url: url.into(),
            class: source.class(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_error_names_url_and_class() {
        let err = CliError::extraction(
            "https://www.ozon.ru/product/1/",
            ExtractorError::SourceUnavailable {
                target: "https://www.ozon.ru/product/1/".to_string(),
                reason: "HTTP 403 Forbidden".to_string(),
            },
        );
        let message = err.to_string();
        assert!(message.contains("https://www.ozon.ru/product/1/"));
        assert!(message.contains("[source-unavailable]"));
        assert!(message.contains("HTTP 403"));
    }
}
