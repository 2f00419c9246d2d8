//! Failure taxonomy for the LLM completion client.

use thiserror::Error;

/// Errors surfaced by the completion client.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Quota or throughput exceeded. Never retried at this layer.
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// The model declined to comply with the request. Never retried.
    #[error("Model refused the request: {0}")]
    Refused(String),

    /// The request timed out. Transport-level; the transport owns retries
    /// for this class and has already exhausted them.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Connection-level failure. Transport-level; see [`ModelError::Timeout`].
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The server answered with a 5xx status. Transport-level.
    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// The server rejected the request (non-429 4xx). Application-level:
    /// retried with corrective feedback, since a reshaped conversation can
    /// produce a valid request.
    #[error("Invalid request (HTTP {status}): {message}")]
    InvalidRequest { status: u16, message: String },

    /// The completion body could not be decoded.
    #[error("Malformed completion payload: {0}")]
    MalformedPayload(String),

    /// The completion carried no choices.
    #[error("Empty completion: no choices returned")]
    EmptyCompletion,

    /// All corrective-feedback retries were spent without a specific error
    /// to report. Should be unreachable; kept as a defensive terminal.
    #[error("Max retries ({0}) exceeded")]
    RetriesExhausted(u32),
}

/// The four fates a failure can meet in the retry orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Propagate immediately; the quota will not recover within a retry.
    RateLimit,
    /// Propagate immediately; re-asking will not change the model's mind
    /// without new conversation content the caller must decide on.
    Refusal,
    /// Propagate immediately; the transport already retried these.
    Transport,
    /// Retry with corrective feedback appended to the conversation.
    Application,
}

impl ModelError {
    /// Classify this failure. Total and pure: depends only on the error's
    /// identity, never on retry state.
    pub fn class(&self) -> ErrorClass {
        match self {
            ModelError::RateLimited(_) => ErrorClass::RateLimit,
            ModelError::Refused(_) => ErrorClass::Refusal,
            ModelError::Timeout(_)
            | ModelError::Connection(_)
            | ModelError::Server { .. } => ErrorClass::Transport,
            ModelError::InvalidRequest { .. }
            | ModelError::MalformedPayload(_)
            | ModelError::EmptyCompletion
            | ModelError::RetriesExhausted(_) => ErrorClass::Application,
        }
    }

    /// Short label naming the error kind, used when synthesizing
    /// corrective feedback for the model.
    pub fn kind(&self) -> &'static str {
        match self {
            ModelError::RateLimited(_) => "RateLimited",
            ModelError::Refused(_) => "Refused",
            ModelError::Timeout(_) => "Timeout",
            ModelError::Connection(_) => "Connection",
            ModelError::Server { .. } => "Server",
            ModelError::InvalidRequest { .. } => "InvalidRequest",
            ModelError::MalformedPayload(_) => "MalformedPayload",
            ModelError::EmptyCompletion => "EmptyCompletion",
            ModelError::RetriesExhausted(_) => "RetriesExhausted",
        }
    }
}
