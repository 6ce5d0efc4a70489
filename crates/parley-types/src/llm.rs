//! Inference gateway request/response types for Parley.
//!
//! These types model the data shapes exchanged with the remote
//! model-serving gateway: conversation turns, the model target, the reply
//! with its usage counters, and the error type for failed calls.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Caller identity sent for system-originated (unbilled) gateway calls.
pub const SYSTEM_CALLER: &str = "system";

/// Response `type` the gateway uses for image output.
pub const RESPONSE_TYPE_IMAGE: &str = "image";

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single turn of a conversation as the gateway sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: MessageRole,
    pub content: String,
}

impl Turn {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// Which model the gateway should run and through which providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelTarget {
    pub system_name: String,
    pub providers: Vec<String>,
}

/// One call to the inference gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceRequest {
    pub conversation: Vec<Turn>,
    pub model: ModelTarget,
    /// Allow tool-augmented work; set only for premium subscribers.
    pub agent_mode: bool,
    /// Identity sent in the caller header (user id, or [`SYSTEM_CALLER`]).
    pub caller: String,
}

/// Token usage reported by the gateway.
///
/// Counts are informational, so malformed values (null, fractional, numeric
/// strings, negative) read as a best-effort count instead of failing the reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default, deserialize_with = "lenient_count")]
    pub prompt_tokens: u32,
    #[serde(default, deserialize_with = "lenient_count")]
    pub completion_tokens: u32,
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let count = match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(count
        .filter(|c| c.is_finite() && *c > 0.0)
        .map_or(0, |c| c.min(f64::from(u32::MAX)) as u32))
}

/// Validated reply from the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceResponse {
    pub content: String,
    /// Content kind, e.g. "text" or "image".
    #[serde(rename = "type")]
    pub kind: String,
    pub usage: Usage,
    /// Extra agent work reported out-of-band (response header).
    #[serde(default)]
    pub agent_usage: u32,
}

impl InferenceResponse {
    /// Whether the reply is binary/image output rather than chat text.
    pub fn is_image(&self) -> bool {
        self.kind.eq_ignore_ascii_case(RESPONSE_TYPE_IMAGE)
    }
}

/// Errors from inference gateway calls.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("gateway timed out after {0}s")]
    Timeout(u64),

    #[error("gateway returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid gateway response: {0}")]
    InvalidResponse(String),
}
