//! Source accessors
//!
//! Each accessor wraps one snapshot of a source and answers [`Probe`]s
//! against it:
//!
//! - [`HtmlSource`]: a rendered or fetched HTML page
//! - [`JsonSource`]: an API payload
//! - [`CompletionSource`]: a language model reply
//! - [`LayeredSource`]: several of the above, asked in order
//!
//! A probe kind the source cannot answer is reported as
//! [`SourceError::Unsupported`], which the chain treats as a miss.
//!
//! [`Probe`]: lens_domain::Probe
//! [`SourceError::Unsupported`]: lens_domain::SourceError::Unsupported

mod completion;
mod html;
mod json;
mod layered;

pub use completion::CompletionSource;
pub use html::HtmlSource;
pub use json::JsonSource;
pub use layered::LayeredSource;

use lens_domain::SourceError;
use regex::Regex;

/// Every match of `pattern` in `text`; the first capture group when the
/// pattern has one, the whole match otherwise
pub(crate) fn regex_candidates(pattern: &str, text: &str) -> Result<Vec<String>, SourceError> {
    let re = Regex::new(pattern).map_err(|e| SourceError::Miss(format!("invalid pattern: {}", e)))?;
    Ok(re
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(0)))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

/// Collapse runs of whitespace into single spaces
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
