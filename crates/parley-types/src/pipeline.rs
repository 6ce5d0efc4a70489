//! Typed input and output of the message pipeline.
//!
//! The HTTP and CLI layers validate raw input once and build a
//! [`MessageRequest`]; everything downstream works with these types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chat::ChatSelector;
use crate::enrich::FileAttachment;

/// One inbound user message, validated.
#[derive(Debug, Clone)]
pub struct MessageRequest {
    pub external_id: String,
    pub prompt: String,
    /// Base64 image for OCR enrichment.
    pub image: Option<String>,
    pub file: Option<FileAttachment>,
    pub chat: ChatSelector,
}

/// What the caller gets back once the pipeline completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReply {
    pub content: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub chat_id: Uuid,
}
