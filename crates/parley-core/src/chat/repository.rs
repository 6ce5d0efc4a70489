//! ChatRepository trait definition.
//!
//! Provides CRUD operations for chats, their membership, and messages.
//! Follows the same RPITIT pattern as the other repositories.

use parley_types::chat::{Chat, ChatMessage};
use parley_types::error::RepositoryError;
use uuid::Uuid;

use crate::repository::Page;

/// Repository trait for chat and message persistence.
///
/// Implementations live in parley-infra (e.g., `SqliteChatRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ChatRepository: Send + Sync {
    /// Create a chat and record `owner_id` as its first member.
    fn create_chat(
        &self,
        chat: &Chat,
        owner_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Chat, RepositoryError>> + Send;

    /// Get a chat by id, only if `user_id` is a member.
    fn get_chat(
        &self,
        user_id: &Uuid,
        chat_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Chat>, RepositoryError>> + Send;

    /// List a member's chats, most recently updated first.
    fn list_chats(
        &self,
        user_id: &Uuid,
        page: Page,
    ) -> impl std::future::Future<Output = Result<Vec<Chat>, RepositoryError>> + Send;

    /// Set a chat's title and bump `updated_at`.
    fn update_title(
        &self,
        chat_id: &Uuid,
        title: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a chat's messages, memberships and the chat in one transaction.
    fn delete_chat(
        &self,
        chat_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Append a message and bump the chat's `updated_at`.
    fn save_message(
        &self,
        message: &ChatMessage,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// All messages of a chat in insertion order.
    fn get_messages(
        &self,
        chat_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;
}
