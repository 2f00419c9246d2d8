//! Conversation message types and input sanitization.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Speaker role in a chat conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in a conversation.
///
/// Messages are treated as immutable once submitted; the client sends a
/// sanitized copy and only ever appends new messages during a retry
/// sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// ASCII control characters (except newline/tab) plus zero-width code
/// points that some chat frontends leak into copied text.
static CONTROL_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F\u{200B}-\u{200D}\u{FEFF}]")
        .unwrap()
});

/// Normalize raw message content before it is sent to the model.
///
/// Removes control and zero-width characters and trims surrounding
/// whitespace. Interior whitespace (including newlines) is preserved.
pub fn sanitize_content(raw: &str) -> String {
    CONTROL_CHARS.replace_all(raw, "").trim().to_string()
}
