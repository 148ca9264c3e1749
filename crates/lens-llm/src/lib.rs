//! Lens LLM Provider Layer
//!
//! Implementations of the `LlmProvider` trait from `lens-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: canned replies routed by prompt fragment, for tests
//! - `ChatProvider`: OpenAI-compatible chat completions (Groq by default)
//!
//! # Examples
//!
//! ```
//! use lens_llm::MockProvider;
//! use lens_domain::LlmProvider;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let provider = MockProvider::new(r#"{"тональность": "положительный"}"#);
//! let reply = provider.chat("system", "Отзыв: светит ярко").await.unwrap();
//! assert!(reply.contains("положительный"));
//! # });
//! ```

#![warn(missing_docs)]

pub mod chat;

use async_trait::async_trait;
use lens_domain::LlmProvider;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

pub use chat::ChatProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// The API rejected the credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// No API key in the named environment variable
    #[error("API key not found, set the {0} environment variable")]
    MissingApiKey(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Fail,
}

/// Mock LLM provider for deterministic testing
///
/// Returns pre-configured replies without any network calls. A reply can be
/// routed by a fragment of the user message; the first registered fragment
/// contained in the message wins.
///
/// # Examples
///
/// ```
/// use lens_llm::MockProvider;
///
/// let mut provider = MockProvider::default();
/// provider.add_response("Кофемолка", r#"{"summary": "ok"}"#);
/// provider.add_error("сломано");
/// assert_eq!(provider.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    model: String,
    default_response: String,
    responses: Arc<Mutex<Vec<(String, MockReply)>>>,
    prompts: Arc<Mutex<Vec<(String, String)>>>,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            model: "mock".to_string(),
            default_response: response.into(),
            responses: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Report a different model name
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Reply with `response` when the user message contains `fragment`
    pub fn add_response(&mut self, fragment: impl Into<String>, response: impl Into<String>) {
        locked(&self.responses).push((fragment.into(), MockReply::Text(response.into())));
    }

    /// Fail when the user message contains `fragment`
    pub fn add_error(&mut self, fragment: impl Into<String>) {
        locked(&self.responses).push((fragment.into(), MockReply::Fail));
    }

    /// Get the number of times the provider was called
    pub fn call_count(&self) -> usize {
        locked(&self.prompts).len()
    }

    /// Every (system, user) pair received so far
    pub fn prompts(&self) -> Vec<(String, String)> {
        locked(&self.prompts).clone()
    }

    /// Reset the call history
    pub fn reset_call_count(&self) {
        locked(&self.prompts).clear();
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn chat(&self, system: &str, user: &str) -> Result<String, Self::Error> {
        locked(&self.prompts).push((system.to_string(), user.to_string()));

        let reply = locked(&self.responses)
            .iter()
            .find(|(fragment, _)| user.contains(fragment.as_str()))
            .map(|(_, reply)| reply.clone());

        match reply {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Fail) => Err(LlmError::Other("Mock error".to_string())),
            None => Ok(self.default_response.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.chat("system", "any prompt").await;
        assert_eq!(result.unwrap(), "Test response");
        assert_eq!(provider.model_name(), "mock");
    }

    #[tokio::test]
    async fn test_mock_provider_routes_by_fragment() {
        let mut provider = MockProvider::default();
        provider.add_response("hello", "world");
        provider.add_response("foo", "bar");

        assert_eq!(provider.chat("", "say hello").await.unwrap(), "world");
        assert_eq!(provider.chat("", "foo fighters").await.unwrap(), "bar");
        assert_eq!(provider.chat("", "unknown").await.unwrap(), "Default mock response");
    }

    #[tokio::test]
    async fn test_mock_provider_call_history() {
        let provider = MockProvider::new("test");
        assert_eq!(provider.call_count(), 0);

        provider.chat("sys", "prompt1").await.unwrap();
        provider.generate("prompt2").await.unwrap();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(
            provider.prompts(),
            vec![
                ("sys".to_string(), "prompt1".to_string()),
                (String::new(), "prompt2".to_string())
            ]
        );

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_provider_error() {
        let mut provider = MockProvider::default();
        provider.add_error("bad prompt");

        let result = provider.chat("", "a bad prompt").await;
        assert!(matches!(result, Err(LlmError::Other(_))));
    }

    #[tokio::test]
    async fn test_mock_provider_clone_shares_history() {
        let provider1 = MockProvider::new("test").with_model("qwen/qwen3-32b");
        let provider2 = provider1.clone();

        provider1.chat("", "test").await.unwrap();

        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
        assert_eq!(provider2.model_name(), "qwen/qwen3-32b");
    }
}
