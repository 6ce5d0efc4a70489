//! Usage analytics event types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::llm::Usage;

/// One completed generation, as reported to the analytics sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEvent {
    /// Internal user id.
    pub user_id: Uuid,
    /// Chat the generation belongs to; used as the trace id.
    pub chat_id: Uuid,
    pub model: String,
    pub provider: String,
    pub usage: Usage,
    pub prompt: String,
    pub completion: String,
    pub timestamp: DateTime<Utc>,
}

/// Errors from analytics delivery. Always logged, never surfaced.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("analytics transport error: {0}")]
    Transport(String),

    #[error("analytics endpoint returned HTTP {0}")]
    Status(u16),

    #[error("analytics delivery timed out")]
    Timeout,

    #[error("analytics queue is full")]
    QueueFull,

    #[error("analytics worker has stopped")]
    Closed,
}
