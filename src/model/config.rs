//! Configuration for the LLM completion client.

/// Model used when no model name is configured.
pub const DEFAULT_MODEL: &str = "deepseek";

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.0;

/// Default completion token limit.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Default number of corrective-feedback retries after an
/// application-level failure (so at most three total attempts).
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Default completion token limit for the OpenAI-compatibility profile.
pub const COMPAT_DEFAULT_MAX_TOKENS: u32 = 8192;

/// Default sampling temperature for the OpenAI-compatibility profile.
pub const COMPAT_DEFAULT_TEMPERATURE: f32 = 0.5;

/// Configuration for an LLM completion client.
///
/// Each client instance carries its own retry bound so independently
/// configured clients never share retry behavior.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    /// Model name; `None` falls back to [`DEFAULT_MODEL`].
    pub model_name: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Maximum corrective-feedback retries for application-level failures.
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: "EMPTY".to_string(),
            base_url: "http://localhost:8000/v1".to_string(),
            model_name: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl LlmConfig {
    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Set the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the model name.
    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the completion token limit.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the maximum number of corrective-feedback retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Model name to send on the wire, falling back to the default.
    pub fn effective_model(&self) -> &str {
        self.model_name.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}
