//! Completion transport: wire types and the HTTP implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::time::sleep;

use super::errors::{ErrorClass, ModelError};
use super::messages::Message;

/// Default number of transport-level retry attempts (timeouts, connection
/// failures, 5xx responses).
pub const DEFAULT_TRANSPORT_RETRIES: u32 = 3;

/// Default delay between transport-level retry attempts in seconds.
pub const DEFAULT_TRANSPORT_RETRY_DELAY_SECS: u64 = 2;

/// Outbound chat-completion request.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Full message record returned by the completion endpoint, including any
/// provider metadata the endpoint attaches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refusal: Option<String>,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl CompletionMessage {
    /// Completion text, empty when the provider sent none.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// OpenAI-compatible response envelope.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: CompletionMessage,
}

/// A handle to the completion service.
///
/// Implementations own transport-level retry policy: by the time a
/// [`ModelError`] of the transport class reaches the caller, those retries
/// are already exhausted. Handles are shared read-only across concurrent
/// invocations.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    /// Execute one logical completion call.
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionMessage, ModelError>;
}

/// HTTP transport for OpenAI-compatible `/chat/completions` endpoints.
pub struct HttpTransport {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    max_retries: u32,
    retry_delay_secs: u64,
}

impl HttpTransport {
    /// Create a transport for the given endpoint.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
            max_retries: DEFAULT_TRANSPORT_RETRIES,
            retry_delay_secs: DEFAULT_TRANSPORT_RETRY_DELAY_SECS,
        }
    }

    /// Set the number of transport-level retry attempts.
    pub fn with_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the delay between transport-level retry attempts in seconds.
    pub fn with_retry_delay(mut self, delay_secs: u64) -> Self {
        self.retry_delay_secs = delay_secs;
        self
    }

    /// Send a single request to the API.
    async fn send_request(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionMessage, ModelError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                429 => ModelError::RateLimited(message),
                code if status.is_server_error() => ModelError::Server {
                    status: code,
                    message,
                },
                code => ModelError::InvalidRequest {
                    status: code,
                    message,
                },
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ModelError::MalformedPayload(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or(ModelError::EmptyCompletion)
    }
}

#[async_trait]
impl CompletionTransport for HttpTransport {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionMessage, ModelError> {
        let max_attempts = self.max_retries + 1;
        let mut last_error: Option<ModelError> = None;

        for attempt in 1..=max_attempts {
            match self.send_request(request).await {
                Ok(message) => return Ok(message),
                Err(e) => {
                    if e.class() == ErrorClass::Transport && attempt < max_attempts {
                        tracing::warn!(
                            "Transport error (attempt {}/{}): {}. Retrying in {}s",
                            attempt,
                            max_attempts,
                            e,
                            self.retry_delay_secs
                        );
                        sleep(Duration::from_secs(self.retry_delay_secs)).await;
                        last_error = Some(e);
                    } else {
                        return Err(e);
                    }
                }
            }
        }

        Err(last_error.unwrap_or(ModelError::RetriesExhausted(self.max_retries)))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ModelError {
    if err.is_timeout() {
        ModelError::Timeout(err.to_string())
    } else if err.is_connect() {
        ModelError::Connection(err.to_string())
    } else if err.is_decode() {
        ModelError::MalformedPayload(err.to_string())
    } else {
        ModelError::Connection(err.to_string())
    }
}
