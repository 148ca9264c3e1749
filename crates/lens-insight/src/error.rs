//! Error types for the analysis stages

use thiserror::Error;

/// Result type for analysis operations
pub type Result<T> = std::result::Result<T, InsightError>;

/// Errors that can occur while loading inputs or writing reports
///
/// A model call that fails or returns unparseable text is not an error:
/// it is recorded in the report and the stage moves on.
#[derive(Error, Debug)]
pub enum InsightError {
    /// Input file could not be read or output could not be written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input file is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Input is valid JSON but not in any recognized shape
    #[error("Unrecognized input: {0}")]
    Input(String),
}
