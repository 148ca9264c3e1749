//! OpenAI-compatible chat completions provider
//!
//! Talks to any `/chat/completions` endpoint. Groq is the default.
//!
//! # Examples
//!
//! ```no_run
//! use lens_llm::ChatProvider;
//!
//! // Reads the key from GROQ_API_KEY
//! let provider = ChatProvider::from_env("qwen/qwen3-32b")
//!     .unwrap()
//!     .with_temperature(0.0);
//! ```

use crate::LlmError;
use async_trait::async_trait;
use lens_domain::LlmProvider;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1";

/// Default model
pub const DEFAULT_MODEL: &str = "qwen/qwen3-32b";

/// Environment variable holding the API key by default
pub const DEFAULT_API_KEY_ENV: &str = "GROQ_API_KEY";

/// Default timeout for LLM requests (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default number of attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Chat completions provider
pub struct ChatProvider {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: Option<u32>,
    client: reqwest::Client,
    max_retries: u32,
    base_delay: Duration,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatProvider {
    /// Create a provider for an endpoint and model, without an API key
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| LlmError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: None,
            temperature: 0.0,
            max_tokens: None,
            client,
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_secs(1),
        })
    }

    /// Default endpoint, key from `GROQ_API_KEY`
    pub fn from_env(model: impl Into<String>) -> Result<Self, LlmError> {
        Self::from_env_var(DEFAULT_ENDPOINT, model, DEFAULT_API_KEY_ENV)
    }

    /// Custom endpoint, key from the named environment variable
    pub fn from_env_var(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        var: &str,
    ) -> Result<Self, LlmError> {
        let key = std::env::var(var)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| LlmError::MissingApiKey(var.to_string()))?;
        Ok(Self::new(endpoint, model)?.with_api_key(key))
    }

    /// Set the bearer token
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Cap the completion length
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the maximum number of attempts (at least one)
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Set the first backoff delay; it doubles after every failed attempt
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Endpoint the requests go to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request<'a>(&'a self, system: &'a str, user: &'a str) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if !system.is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: user,
        });

        ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Send a chat completion request
    ///
    /// Transport errors, rate limiting and server errors are retried with
    /// exponential backoff (1s, 2s, 4s, ...). Authentication failures and
    /// unknown models are reported immediately.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.endpoint);
        let body = self.request(system, user);

        let mut last_error = None;
        let mut delay = self.base_delay;

        for attempt in 1..=self.max_retries {
            let mut request = self.client.post(&url).json(&body);
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let text = response
                            .text()
                            .await
                            .map_err(|e| LlmError::InvalidResponse(format!("Failed to read response: {}", e)))?;
                        return parse_reply(&text);
                    }

                    match status {
                        StatusCode::NOT_FOUND => return Err(LlmError::ModelNotAvailable(self.model.clone())),
                        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                            return Err(LlmError::Unauthorized(format!("HTTP {}", status)))
                        }
                        StatusCode::TOO_MANY_REQUESTS => last_error = Some(LlmError::RateLimitExceeded),
                        _ => {
                            let error_text = response
                                .text()
                                .await
                                .unwrap_or_else(|_| "Unknown error".to_string());
                            last_error = Some(LlmError::Communication(format!("HTTP {}: {}", status, error_text)));
                        }
                    }
                }
                Err(e) => {
                    last_error = Some(LlmError::Communication(format!("Request failed: {}", e)));
                }
            }

            if attempt < self.max_retries {
                warn!(
                    "Chat request to {} failed (attempt {}/{}), retrying in {:?}",
                    self.model, attempt, self.max_retries, delay
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }

        Err(last_error.unwrap_or_else(|| LlmError::Communication("Max retries exceeded".to_string())))
    }
}

fn parse_reply(body: &str) -> Result<String, LlmError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
    let content = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("Response has no choices".to_string()))?
        .message
        .content
        .unwrap_or_default();
    debug!("Completion of {} chars", content.chars().count());
    Ok(content)
}

#[async_trait]
impl LlmProvider for ChatProvider {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn chat(&self, system: &str, user: &str) -> Result<String, Self::Error> {
        self.complete(system, user).await
    }
}
