//! Outbound model calls: the `LlmClient` seam, the Gemini `generateContent`
//! client, and the bounded retry policy around it.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use stocktalk_core::config::{LlmConfig, MAX_MODEL_RETRIES};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("model request timed out")]
    Timeout,
    #[error("model endpoint unreachable: {0}")]
    Transport(String),
    #[error("malformed model response: {0}")]
    MalformedResponse(String),
    #[error("model endpoint returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("model client misconfigured: {0}")]
    Configuration(String),
}

impl LlmError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

impl GeminiClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            LlmError::Configuration("llm.api_key is not set".to_string())
        })?;
        Self::with_timeout(config, api_key, Duration::from_secs(config.timeout_secs))
    }

    pub fn with_timeout(
        config: &LlmConfig,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| LlmError::Configuration(format!("http client: {error}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Endpoint without the key; the key travels as a query parameter.
    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });

        debug!(
            event_name = "llm.request.sent",
            model = self.model.as_str(),
            prompt_chars = prompt.len(),
            "sending generateContent request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.expose_secret())])
            .json(&body)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        let text = response.text().await.map_err(classify_send_error)?;
        debug!(event_name = "llm.response.received", status = status.as_u16(), "model responded");

        let parsed: Value = serde_json::from_str(&text)
            .map_err(|error| LlmError::MalformedResponse(format!("invalid JSON: {error}")))?;

        if !status.is_success() {
            return match parsed["error"]["message"].as_str() {
                Some(message) => {
                    Err(LlmError::Api { status: status.as_u16(), message: message.to_string() })
                }
                None => Err(LlmError::MalformedResponse(format!(
                    "HTTP {status} without an error message"
                ))),
            };
        }

        extract_text(&parsed)
    }
}

fn classify_send_error(error: reqwest::Error) -> LlmError {
    if error.is_timeout() {
        LlmError::Timeout
    } else if error.is_decode() || error.is_body() {
        LlmError::MalformedResponse(error.without_url().to_string())
    } else {
        LlmError::Transport(error.without_url().to_string())
    }
}

/// `candidates[0].content.parts[0].text`
fn extract_text(body: &Value) -> Result<String, LlmError> {
    let candidate = body["candidates"]
        .as_array()
        .and_then(|candidates| candidates.first())
        .ok_or_else(|| LlmError::MalformedResponse("missing candidates".to_string()))?;

    candidate["content"]["parts"]
        .as_array()
        .and_then(|parts| parts.first())
        .and_then(|part| part["text"].as_str())
        .map(str::to_string)
        .ok_or_else(|| LlmError::MalformedResponse("candidate has no text part".to_string()))
}

/// Sequential attempts without backoff. Only timeouts are retried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl RetryPolicy {
    pub const HARD_CAP: u32 = MAX_MODEL_RETRIES + 1;

    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts: max_attempts.clamp(1, Self::HARD_CAP) }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(config.max_retries.saturating_add(1))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub async fn run<F, Fut>(&self, mut call: F) -> Result<String, LlmError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<String, LlmError>> + Send,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(text) => return Ok(text),
                Err(error) if error.is_retryable() && attempt < self.max_attempts => {
                    warn!(
                        event_name = "llm.request.retry",
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %error,
                        "model request timed out, retrying"
                    );
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::HARD_CAP)
    }
}
