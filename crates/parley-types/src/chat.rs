//! Chat and message types for Parley.
//!
//! These types model conversations between users and the assistant:
//! chats (owned by one or more users), their messages, and the selector a
//! request uses to continue an existing chat or start a new one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Re-export MessageRole from llm module (it's used in both chat and llm contexts).
pub use crate::llm::MessageRole;

use crate::llm::Turn;

/// Chat ids clients send to mean "start a new chat".
const NEW_CHAT_SENTINELS: [&str; 2] = ["", "0"];

/// Title used when title generation yields nothing usable.
pub const FALLBACK_CHAT_TITLE: &str = "New chat";

/// A conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single message within a chat.
///
/// Messages are returned in creation order. Assistant replies carry a
/// back-reference to the user message they answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub sender_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Reduce to the `{content, role}` pair used for prompt assembly.
    pub fn to_turn(&self) -> Turn {
        Turn::new(self.role, self.content.clone())
    }
}

/// A chat together with its messages in creation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatWithHistory {
    #[serde(flatten)]
    pub chat: Chat,
    pub messages: Vec<ChatMessage>,
}

/// Which chat an inbound message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatSelector {
    /// No chat id (or the sentinel): create one with a generated title.
    New,
    /// Continue an existing chat; absence is a client error.
    Existing(Uuid),
}

impl ChatSelector {
    /// Parse a client-supplied chat id.
    ///
    /// `None`, `""` and `"0"` select a new chat; anything else must be a UUID.
    pub fn parse(raw: Option<&str>) -> Result<Self, String> {
        match raw.map(str::trim) {
            None => Ok(ChatSelector::New),
            Some(s) if NEW_CHAT_SENTINELS.contains(&s) => Ok(ChatSelector::New),
            Some(s) => s
                .parse::<Uuid>()
                .map(ChatSelector::Existing)
                .map_err(|_| format!("invalid chat id: '{s}'")),
        }
    }
}

/// Request body for explicitly creating a chat.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateChatRequest {
    pub external_id: String,
    pub title: String,
}

/// Request body for renaming a chat.
#[derive(Debug, Clone, Deserialize)]
pub struct RenameChatRequest {
    pub external_id: String,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_sentinels_mean_new() {
        assert_eq!(ChatSelector::parse(None).unwrap(), ChatSelector::New);
        assert_eq!(ChatSelector::parse(Some("")).unwrap(), ChatSelector::New);
        assert_eq!(ChatSelector::parse(Some("0")).unwrap(), ChatSelector::New);
        assert_eq!(ChatSelector::parse(Some("  ")).unwrap(), ChatSelector::New);
    }

    #[test]
    fn test_selector_parses_uuid() {
        let id = Uuid::now_v7();
        let selector = ChatSelector::parse(Some(&id.to_string())).unwrap();
        assert_eq!(selector, ChatSelector::Existing(id));
    }

    #[test]
    fn test_selector_rejects_garbage() {
        let err = ChatSelector::parse(Some("chat-17")).unwrap_err();
        assert!(err.contains("chat-17"));
    }

    #[test]
    fn test_chat_with_history_flattens_chat() {
        let chat = Chat {
            id: Uuid::now_v7(),
            title: "Budget Japan Trip".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(ChatWithHistory {
            chat,
            messages: Vec::new(),
        })
        .unwrap();
        assert_eq!(json["title"], "Budget Japan Trip");
        assert!(json["messages"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_message_to_turn() {
        let msg = ChatMessage {
            id: Uuid::now_v7(),
            chat_id: Uuid::now_v7(),
            sender_id: Uuid::now_v7(),
            role: MessageRole::Assistant,
            content: "Hi there!".to_string(),
            reply_to_id: None,
            created_at: Utc::now(),
        };
        assert_eq!(msg.to_turn(), Turn::assistant("Hi there!"));
    }
}
