//! Conversation store: chat lifecycle, history and message persistence.
//!
//! `ConversationStore` coordinates the `ChatRepository` and the title
//! generator. Every read is scoped to a member user; a chat the user does
//! not belong to is reported as not found.

use chrono::Utc;
use parley_types::chat::{Chat, ChatMessage, ChatSelector, ChatWithHistory, MessageRole};
use parley_types::error::ServiceError;
use parley_types::llm::Turn;
use tracing::info;
use uuid::Uuid;

use crate::chat::repository::ChatRepository;
use crate::llm::title::TitleGenerator;
use crate::repository::Page;

const MAX_TITLE_CHARS: usize = 200;

/// A chat plus the prior turns to replay to the model.
#[derive(Debug, Clone)]
pub struct ResolvedChat {
    pub chat: Chat,
    pub history: Vec<Turn>,
    /// Whether the chat was created by this call.
    pub created: bool,
}

pub struct ConversationStore<C: ChatRepository> {
    chats: C,
    titles: TitleGenerator,
}

impl<C: ChatRepository> ConversationStore<C> {
    pub fn new(chats: C, titles: TitleGenerator) -> Self {
        Self { chats, titles }
    }

    /// Access the chat repository.
    pub fn chat_repo(&self) -> &C {
        &self.chats
    }

    // --- Chat lifecycle ---

    /// Create a chat owned by `user_id` with an explicit title.
    pub async fn create_chat(&self, user_id: Uuid, title: &str) -> Result<Chat, ServiceError> {
        let title = normalize_title(title)?;
        self.insert_chat(user_id, title).await
    }

    /// List a user's chats, most recently active first.
    pub async fn list_chats(&self, user_id: &Uuid, page: Page) -> Result<Vec<Chat>, ServiceError> {
        Ok(self.chats.list_chats(user_id, page).await?)
    }

    pub async fn get_chat(&self, user_id: &Uuid, chat_id: &Uuid) -> Result<Chat, ServiceError> {
        self.chats
            .get_chat(user_id, chat_id)
            .await?
            .ok_or_else(chat_not_found)
    }

    /// A chat with all its messages in insertion order.
    pub async fn get_chat_with_history(
        &self,
        user_id: &Uuid,
        chat_id: &Uuid,
    ) -> Result<ChatWithHistory, ServiceError> {
        let chat = self.get_chat(user_id, chat_id).await?;
        let messages = self.chats.get_messages(&chat.id).await?;
        Ok(ChatWithHistory { chat, messages })
    }

    pub async fn rename_chat(
        &self,
        user_id: &Uuid,
        chat_id: &Uuid,
        title: &str,
    ) -> Result<Chat, ServiceError> {
        let title = normalize_title(title)?;
        self.get_chat(user_id, chat_id).await?;
        self.chats.update_title(chat_id, &title).await?;
        info!(chat_id = %chat_id, "chat renamed");
        self.get_chat(user_id, chat_id).await
    }

    /// Delete a chat together with all of its messages.
    pub async fn delete_chat(&self, user_id: &Uuid, chat_id: &Uuid) -> Result<(), ServiceError> {
        self.get_chat(user_id, chat_id).await?;
        self.chats.delete_chat(chat_id).await?;
        info!(chat_id = %chat_id, "chat deleted");
        Ok(())
    }

    // --- Pipeline support ---

    /// Continue the selected chat or create a titled one.
    ///
    /// An explicit id that the user cannot see is `NotFound`, never a new
    /// chat. A new chat costs one title-generation call that is not billed.
    pub async fn resolve_or_create_chat(
        &self,
        user_id: Uuid,
        selector: ChatSelector,
        prompt: &str,
    ) -> Result<ResolvedChat, ServiceError> {
        match selector {
            ChatSelector::Existing(chat_id) => {
                let chat = self.get_chat(&user_id, &chat_id).await?;
                let history = self
                    .chats
                    .get_messages(&chat.id)
                    .await?
                    .iter()
                    .map(ChatMessage::to_turn)
                    .collect();
                Ok(ResolvedChat {
                    chat,
                    history,
                    created: false,
                })
            }
            ChatSelector::New => {
                let title = self.titles.generate(prompt).await?;
                let title: String = title.chars().take(MAX_TITLE_CHARS).collect();
                let chat = self.insert_chat(user_id, title).await?;
                Ok(ResolvedChat {
                    chat,
                    history: Vec::new(),
                    created: true,
                })
            }
        }
    }

    /// Persist one message and return it.
    pub async fn append_message(
        &self,
        chat_id: Uuid,
        sender_id: Uuid,
        role: MessageRole,
        content: String,
        reply_to_id: Option<Uuid>,
    ) -> Result<ChatMessage, ServiceError> {
        let message = ChatMessage {
            id: Uuid::now_v7(),
            chat_id,
            sender_id,
            role,
            content,
            reply_to_id,
            created_at: Utc::now(),
        };
        self.chats.save_message(&message).await?;
        Ok(message)
    }

    async fn insert_chat(&self, user_id: Uuid, title: String) -> Result<Chat, ServiceError> {
        let now = Utc::now();
        let chat = Chat {
            id: Uuid::now_v7(),
            title,
            created_at: now,
            updated_at: now,
        };
        let chat = self.chats.create_chat(&chat, &user_id).await?;
        info!(chat_id = %chat.id, user_id = %user_id, "chat created");
        Ok(chat)
    }
}

fn chat_not_found() -> ServiceError {
    ServiceError::not_found("chat not found, try selecting another one")
}

fn normalize_title(raw: &str) -> Result<String, ServiceError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ServiceError::validation("title must not be empty"));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(ServiceError::validation(format!(
            "title exceeds {MAX_TITLE_CHARS} characters"
        )));
    }
    Ok(title.to_string())
}
