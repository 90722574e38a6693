//! Model query client for a hosted text-generation inference API.

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::error::Error as _;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::config::{build_prompt, FALLBACK_REPLY, TURN_MARKERS};

/// Default inference endpoint; the model ID is appended as a path segment.
pub const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co/models";

/// Default total number of attempts per query.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay between attempts in milliseconds.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2000;

/// Default per-attempt deadline in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default nucleus sampling threshold.
pub const DEFAULT_TOP_P: f32 = 0.95;

/// Default cap on generated tokens.
pub const DEFAULT_MAX_TOKENS: u32 = 512;

/// Failure of a single query, after any retries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Every attempt hit the per-attempt deadline.
    #[error("request timed out after {attempts} attempts")]
    Timeout { attempts: u32 },
    /// Transport failure or non-success HTTP status. Never retried.
    #[error("network error: {0}")]
    Network(String),
    /// Anything else, e.g. a response body that is not a generation list.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl QueryError {
    /// Text suitable for showing to the user in place of a reply.
    pub fn display_message(&self) -> String {
        match self {
            QueryError::Timeout { attempts } => format!(
                "⏱️ Timeout: FarminAi did not respond after {} attempts. Please try again in a moment.",
                attempts
            ),
            QueryError::Network(detail) => format!("❌ Network error: {}", detail),
            QueryError::Unexpected(detail) => format!("❌ Unexpected error: {}", detail),
        }
    }
}

/// Errors raised while constructing a client.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing API token: set HF_API_TOKEN (or MY_SECRET_TOKEN) in the environment or a .env file")]
    MissingToken,
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Connection settings shared by every query.
#[derive(Clone)]
pub struct ModelConfig {
    pub base_url: String,
    pub api_token: String,
}

impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: String::new(),
        }
    }
}

impl ModelConfig {
    /// Create a new ModelConfig with custom base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Create a new ModelConfig with custom bearer token.
    pub fn with_api_token(mut self, api_token: impl Into<String>) -> Self {
        self.api_token = api_token.into();
        self
    }

    /// Full endpoint URL for a model.
    pub fn endpoint_url(&self, model: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            model.trim_start_matches('/')
        )
    }
}

/// Per-call sampling and retry options.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    pub temperature: f32,
    pub top_p: f32,
    /// Maximum number of new tokens to generate.
    pub max_tokens: u32,
    /// Deadline for a single attempt.
    pub timeout: Duration,
    /// Total number of attempts, including the first. Zero behaves as one.
    pub max_retries: u32,
    /// Fixed delay between attempts.
    pub retry_delay: Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }
}

impl QueryOptions {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the per-attempt deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the total number of attempts.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the delay between attempts.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}

/// One candidate in the inference API response.
#[derive(Debug, Deserialize)]
struct Generation {
    generated_text: String,
}

/// Outcome of a single attempt, before retry policy is applied.
enum AttemptError {
    TimedOut(String),
    Failed(QueryError),
}

impl From<reqwest::Error> for AttemptError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return AttemptError::TimedOut(err.to_string());
        }
        let detail = match err.source() {
            Some(source) => format!("{}: {}", err, source),
            None => err.to_string(),
        };
        AttemptError::Failed(QueryError::Network(detail))
    }
}

/// Client for a hosted text-generation endpoint.
///
/// Stateless between calls; the only state inside [`ModelClient::query`] is
/// the attempt counter.
#[derive(Debug, Clone)]
pub struct ModelClient {
    config: ModelConfig,
    client: Client,
}

impl ModelClient {
    /// Create a new ModelClient.
    ///
    /// Fails with [`ConfigError::MissingToken`] when no bearer token is set.
    pub fn new(config: ModelConfig) -> Result<Self, ConfigError> {
        if config.api_token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }

        let client = Client::builder()
            .user_agent(concat!("farmin-ai/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Ask the model a question.
    ///
    /// # Arguments
    /// * `prompt` - The user's question.
    /// * `model` - Model ID appended to the endpoint URL.
    /// * `options` - Sampling parameters plus timeout and retry policy.
    ///
    /// # Returns
    /// The cleaned reply, or the kind of failure. Timeouts are retried after
    /// a fixed delay up to `options.max_retries` total attempts; every other
    /// failure returns after the attempt that produced it.
    pub async fn query(
        &self,
        prompt: &str,
        model: &str,
        options: &QueryOptions,
    ) -> Result<String, QueryError> {
        let url = self.config.endpoint_url(model);
        let body = Self::build_payload(prompt, options);
        let max_attempts = options.attempts();

        for attempt in 1..=max_attempts {
            debug!(attempt, max_attempts, %url, "sending inference request");

            match self.send_request(&url, &body, options.timeout).await {
                Ok(generated) => return Ok(clean_generated_text(&generated)),
                Err(AttemptError::TimedOut(detail)) => {
                    if attempt < max_attempts {
                        warn!(
                            attempt,
                            max_attempts,
                            delay = ?options.retry_delay,
                            "request timed out ({}), retrying",
                            detail
                        );
                        sleep(options.retry_delay).await;
                    }
                }
                Err(AttemptError::Failed(e)) => {
                    error!(attempt, "inference request failed: {}", e);
                    return Err(e);
                }
            }
        }

        error!(attempts = max_attempts, "inference request timed out on every attempt");
        Err(QueryError::Timeout {
            attempts: max_attempts,
        })
    }

    /// Like [`ModelClient::query`], but failures come back as display text.
    pub async fn query_text(&self, prompt: &str, model: &str, options: &QueryOptions) -> String {
        match self.query(prompt, model, options).await {
            Ok(reply) => reply,
            Err(e) => e.display_message(),
        }
    }

    /// Build the JSON body for a question.
    pub fn build_payload(prompt: &str, options: &QueryOptions) -> Value {
        json!({
            "inputs": build_prompt(prompt),
            "parameters": {
                "max_new_tokens": options.max_tokens,
                "temperature": options.temperature,
                "top_p": options.top_p,
                "do_sample": true,
                "return_full_text": false,
                "stop": TURN_MARKERS,
            }
        })
    }

    /// Send a single attempt and extract the raw generated text.
    async fn send_request(
        &self,
        url: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<String, AttemptError> {
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.config.api_token))
            .header("Content-Type", "application/json")
            .timeout(timeout)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let error_text = error_text.trim();
            let detail = if error_text.is_empty() {
                format!("HTTP {}", status)
            } else {
                format!("HTTP {}: {}", status, error_text)
            };
            return Err(AttemptError::Failed(QueryError::Network(detail)));
        }

        let raw = response.text().await?;
        parse_generated_text(&raw).map_err(AttemptError::Failed)
    }
}

/// Pull the first candidate's text out of a response body.
fn parse_generated_text(raw: &str) -> Result<String, QueryError> {
    let generations: Vec<Generation> = serde_json::from_str(raw)
        .map_err(|e| QueryError::Unexpected(format!("Failed to parse response: {}", e)))?;

    generations
        .into_iter()
        .next()
        .map(|g| g.generated_text)
        .ok_or_else(|| QueryError::Unexpected("No generations in response".to_string()))
}

/// Cut generated text at the first turn marker and trim it.
///
/// Returns [`FALLBACK_REPLY`] when nothing is left.
pub fn clean_generated_text(text: &str) -> String {
    let cut = TURN_MARKERS
        .iter()
        .filter_map(|marker| text.find(marker))
        .min()
        .unwrap_or(text.len());

    let cleaned = text[..cut].trim();
    if cleaned.is_empty() {
        FALLBACK_REPLY.to_string()
    } else {
        cleaned.to_string()
    }
}
