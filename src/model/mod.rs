//! LLM completion client module.

mod client;
mod config;
mod errors;
mod messages;
mod transport;

pub use client::{LlmClient, LlmResponse, ResponseSchema, MANUAL_DECODE_MARKER};
pub use config::{
    LlmConfig, COMPAT_DEFAULT_MAX_TOKENS, COMPAT_DEFAULT_TEMPERATURE, DEFAULT_MAX_RETRIES,
    DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE,
};
pub use errors::{ErrorClass, ModelError};
pub use messages::{sanitize_content, Message, Role};
pub use transport::{
    CompletionMessage, CompletionRequest, CompletionTransport, HttpTransport,
    DEFAULT_TRANSPORT_RETRIES, DEFAULT_TRANSPORT_RETRY_DELAY_SECS,
};
