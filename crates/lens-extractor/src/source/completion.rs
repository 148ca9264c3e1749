//! Model completion source

use super::json::json_candidates;
use super::regex_candidates;
use crate::error::ExtractorError;
use crate::recovery::{recover_structured, strip_reasoning, Recovered};
use async_trait::async_trait;
use lens_domain::{LlmProvider, Probe, SourceAccessor, SourceError};
use tracing::debug;

/// A language model reply, with whatever structure could be recovered from it
#[derive(Debug, Clone)]
pub struct CompletionSource {
    model: String,
    text: String,
    recovered: Recovered,
}

impl CompletionSource {
    /// Wrap a completion produced by `model`
    pub fn new(model: impl Into<String>, completion: &str) -> Self {
        Self {
            model: model.into(),
            text: strip_reasoning(completion),
            recovered: recover_structured(completion),
        }
    }

    /// Ask a provider and wrap its reply
    ///
    /// A provider failure means there is nothing to extract from, so it is
    /// reported as [`ExtractorError::SourceUnavailable`].
    pub async fn from_provider<P>(provider: &P, system: &str, user: &str) -> Result<Self, ExtractorError>
    where
        P: LlmProvider + ?Sized,
    {
        let reply = provider
            .chat(system, user)
            .await
            .map_err(|e| ExtractorError::SourceUnavailable {
                target: provider.model_name().to_string(),
                reason: e.to_string(),
            })?;
        debug!("Completion from {}: {} chars", provider.model_name(), reply.len());
        Ok(Self::new(provider.model_name(), &reply))
    }

    /// Reply text with reasoning blocks removed
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Structured recovery outcome
    pub fn recovered(&self) -> &Recovered {
        &self.recovered
    }
}

#[async_trait]
impl SourceAccessor for CompletionSource {
    fn describe(&self) -> String {
        format!("completion:{}", self.model)
    }

    async fn probe(&self, probe: &Probe) -> Result<Vec<String>, SourceError> {
        match probe {
            Probe::Regex(pattern) => regex_candidates(pattern, &self.text),
            Probe::JsonPointer(_) | Probe::JsonKey(_) => match self.recovered.structured() {
                Some(value) => Ok(json_candidates(value, probe)),
                None => Err(SourceError::Miss("no structured data in completion".to_string())),
            },
            other => Err(SourceError::Unsupported(other.kind().to_string())),
        }
    }
}
