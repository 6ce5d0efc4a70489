//! SQLite chat repository implementation.
//!
//! Implements `ChatRepository` from `parley-core` using sqlx with split read/write pools.
//! Chats are visible only to their members; messages are read back in insertion order.

use parley_core::chat::repository::ChatRepository;
use parley_core::repository::Page;
use parley_types::chat::{Chat, ChatMessage, MessageRole};
use parley_types::error::RepositoryError;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, parse_uuid};

/// SQLite-backed implementation of `ChatRepository`.
pub struct SqliteChatRepository {
    pool: DatabasePool,
}

impl SqliteChatRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ChatRow {
    id: String,
    title: String,
    created_at: String,
    updated_at: String,
}

impl ChatRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_chat(self) -> Result<Chat, RepositoryError> {
        Ok(Chat {
            id: parse_uuid(&self.id, "chat id")?,
            title: self.title,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct ChatMessageRow {
    id: String,
    chat_id: String,
    sender_id: String,
    role: String,
    content: String,
    reply_to_id: Option<String>,
    created_at: String,
}

impl ChatMessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            chat_id: row.try_get("chat_id")?,
            sender_id: row.try_get("sender_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            reply_to_id: row.try_get("reply_to_id")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let role: MessageRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(ChatMessage {
            id: parse_uuid(&self.id, "message id")?,
            chat_id: parse_uuid(&self.chat_id, "chat id")?,
            sender_id: parse_uuid(&self.sender_id, "sender id")?,
            role,
            content: self.content,
            reply_to_id: self
                .reply_to_id
                .as_deref()
                .map(|id| parse_uuid(id, "reply_to id"))
                .transpose()?,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

impl ChatRepository for SqliteChatRepository {
    async fn create_chat(&self, chat: &Chat, owner_id: &Uuid) -> Result<Chat, RepositoryError> {
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        sqlx::query("INSERT INTO chats (id, title, created_at, updated_at) VALUES (?, ?, ?, ?)")
            .bind(chat.id.to_string())
            .bind(&chat.title)
            .bind(format_datetime(&chat.created_at))
            .bind(format_datetime(&chat.updated_at))
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        sqlx::query("INSERT INTO chat_members (chat_id, user_id) VALUES (?, ?)")
            .bind(chat.id.to_string())
            .bind(owner_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(chat.clone())
    }

    async fn get_chat(
        &self,
        user_id: &Uuid,
        chat_id: &Uuid,
    ) -> Result<Option<Chat>, RepositoryError> {
        let row = sqlx::query(
            "SELECT c.* FROM chats c
             JOIN chat_members m ON m.chat_id = c.id
             WHERE c.id = ? AND m.user_id = ?",
        )
        .bind(chat_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let chat_row =
                    ChatRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(chat_row.into_chat()?))
            }
            None => Ok(None),
        }
    }

    async fn list_chats(&self, user_id: &Uuid, page: Page) -> Result<Vec<Chat>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT c.* FROM chats c
             JOIN chat_members m ON m.chat_id = c.id
             WHERE m.user_id = ?
             ORDER BY c.updated_at DESC
             LIMIT ? OFFSET ?",
        )
        .bind(user_id.to_string())
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut chats = Vec::with_capacity(rows.len());
        for row in &rows {
            let chat_row =
                ChatRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            chats.push(chat_row.into_chat()?);
        }
        Ok(chats)
    }

    async fn update_title(&self, chat_id: &Uuid, title: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE chats SET title = ?, updated_at = ? WHERE id = ?")
            .bind(title)
            .bind(format_datetime(&chrono::Utc::now()))
            .bind(chat_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_chat(&self, chat_id: &Uuid) -> Result<(), RepositoryError> {
        let id = chat_id.to_string();
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        sqlx::query("DELETE FROM messages WHERE chat_id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        sqlx::query("DELETE FROM chat_members WHERE chat_id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let result = sqlx::query("DELETE FROM chats WHERE id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls it back.
            return Err(RepositoryError::NotFound);
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(())
    }

    async fn save_message(&self, message: &ChatMessage) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        sqlx::query(
            "INSERT INTO messages (id, chat_id, sender_id, role, content, reply_to_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(message.id.to_string())
        .bind(message.chat_id.to_string())
        .bind(message.sender_id.to_string())
        .bind(message.role.to_string())
        .bind(&message.content)
        .bind(message.reply_to_id.map(|id| id.to_string()))
        .bind(format_datetime(&message.created_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        sqlx::query("UPDATE chats SET updated_at = ? WHERE id = ?")
            .bind(format_datetime(&message.created_at))
            .bind(message.chat_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(())
    }

    async fn get_messages(&self, chat_id: &Uuid) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM messages WHERE chat_id = ? ORDER BY created_at, rowid")
            .bind(chat_id.to_string())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let msg_row =
                ChatMessageRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            messages.push(msg_row.into_message()?);
        }
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_support::{seed_model, seed_user, test_pool};
    use chrono::{Duration, Utc};

    fn make_chat(title: &str) -> Chat {
        let now = Utc::now();
        Chat {
            id: Uuid::now_v7(),
            title: title.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn make_message(chat_id: Uuid, sender_id: Uuid, role: MessageRole, content: &str) -> ChatMessage {
        ChatMessage {
            id: Uuid::now_v7(),
            chat_id,
            sender_id,
            role,
            content: content.to_string(),
            reply_to_id: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_chat_visible_only_to_members() {
        let pool = test_pool().await;
        let model = seed_model(&pool).await;
        let owner = seed_user(&pool, "1001", model.id).await;
        let stranger = seed_user(&pool, "1002", model.id).await;
        let repo = SqliteChatRepository::new(pool);

        let chat = make_chat("Trip planning");
        repo.create_chat(&chat, &owner.id).await.unwrap();

        let found = repo.get_chat(&owner.id, &chat.id).await.unwrap().unwrap();
        assert_eq!(found.title, "Trip planning");
        assert!(repo.get_chat(&stranger.id, &chat.id).await.unwrap().is_none());
        assert!(repo.list_chats(&stranger.id, Page::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_messages_keep_insertion_order_with_equal_timestamps() {
        let pool = test_pool().await;
        let model = seed_model(&pool).await;
        let user = seed_user(&pool, "1001", model.id).await;
        let repo = SqliteChatRepository::new(pool);
        let chat = make_chat("Order");
        repo.create_chat(&chat, &user.id).await.unwrap();

        let at = Utc::now();
        let mut question = make_message(chat.id, user.id, MessageRole::User, "first");
        question.created_at = at;
        let mut answer = make_message(chat.id, user.id, MessageRole::Assistant, "second");
        answer.created_at = at;
        answer.reply_to_id = Some(question.id);

        repo.save_message(&question).await.unwrap();
        repo.save_message(&answer).await.unwrap();

        let messages = repo.get_messages(&chat.id).await.unwrap();
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert_eq!(messages[1].reply_to_id, Some(question.id));
    }

    #[tokio::test]
    async fn test_list_orders_by_recent_activity() {
        let pool = test_pool().await;
        let model = seed_model(&pool).await;
        let user = seed_user(&pool, "1001", model.id).await;
        let repo = SqliteChatRepository::new(pool);

        let mut older = make_chat("Older");
        older.created_at = Utc::now() - Duration::hours(2);
        older.updated_at = older.created_at;
        let newer = make_chat("Newer");
        repo.create_chat(&older, &user.id).await.unwrap();
        repo.create_chat(&newer, &user.id).await.unwrap();

        let titles: Vec<String> = repo
            .list_chats(&user.id, Page::default())
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(titles, vec!["Newer", "Older"]);

        // A new message moves the older chat to the top.
        let msg = make_message(older.id, user.id, MessageRole::User, "ping");
        repo.save_message(&msg).await.unwrap();
        let first = repo.list_chats(&user.id, Page::new(Some(1), None)).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].title, "Older");
    }

    #[tokio::test]
    async fn test_update_title() {
        let pool = test_pool().await;
        let model = seed_model(&pool).await;
        let user = seed_user(&pool, "1001", model.id).await;
        let repo = SqliteChatRepository::new(pool);
        let chat = make_chat("Draft");
        repo.create_chat(&chat, &user.id).await.unwrap();

        repo.update_title(&chat.id, "Final").await.unwrap();
        let found = repo.get_chat(&user.id, &chat.id).await.unwrap().unwrap();
        assert_eq!(found.title, "Final");

        let err = repo.update_title(&Uuid::now_v7(), "x").await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_delete_chat_removes_messages_and_members() {
        let pool = test_pool().await;
        let model = seed_model(&pool).await;
        let user = seed_user(&pool, "1001", model.id).await;
        let repo = SqliteChatRepository::new(pool.clone());
        let chat = make_chat("Doomed");
        repo.create_chat(&chat, &user.id).await.unwrap();
        repo.save_message(&make_message(chat.id, user.id, MessageRole::User, "hi"))
            .await
            .unwrap();

        repo.delete_chat(&chat.id).await.unwrap();

        assert!(repo.get_chat(&user.id, &chat.id).await.unwrap().is_none());
        assert!(repo.get_messages(&chat.id).await.unwrap().is_empty());
        let (members,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chat_members")
            .fetch_one(&pool.reader)
            .await
            .unwrap();
        assert_eq!(members, 0);

        let err = repo.delete_chat(&chat.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }
}
