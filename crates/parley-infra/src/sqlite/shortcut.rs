//! SQLite shortcut repository implementation.
//!
//! Every query is scoped by owner so one user can never read or change
//! another user's shortcuts.

use parley_core::repository::shortcut::ShortcutRepository;
use parley_types::error::RepositoryError;
use parley_types::shortcut::Shortcut;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, parse_uuid};

/// SQLite-backed implementation of `ShortcutRepository`.
pub struct SqliteShortcutRepository {
    pool: DatabasePool,
}

impl SqliteShortcutRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct ShortcutRow {
    id: String,
    user_id: String,
    command: String,
    instruction: String,
    model_id: Option<String>,
    created_at: String,
}

impl ShortcutRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            command: row.try_get("command")?,
            instruction: row.try_get("instruction")?,
            model_id: row.try_get("model_id")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_shortcut(self) -> Result<Shortcut, RepositoryError> {
        Ok(Shortcut {
            id: parse_uuid(&self.id, "shortcut id")?,
            user_id: parse_uuid(&self.user_id, "user id")?,
            command: self.command,
            instruction: self.instruction,
            model_id: self
                .model_id
                .as_deref()
                .map(|id| parse_uuid(id, "model id"))
                .transpose()?,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn map_row(row: Option<sqlx::sqlite::SqliteRow>) -> Result<Option<Shortcut>, RepositoryError> {
    match row {
        Some(row) => {
            let shortcut_row =
                ShortcutRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            Ok(Some(shortcut_row.into_shortcut()?))
        }
        None => Ok(None),
    }
}

fn conflict_or_query(err: sqlx::Error, command: &str) -> RepositoryError {
    match err {
        sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE") => {
            RepositoryError::Conflict(format!("shortcut '{command}' already exists"))
        }
        e => RepositoryError::Query(e.to_string()),
    }
}

impl ShortcutRepository for SqliteShortcutRepository {
    async fn create(&self, shortcut: &Shortcut) -> Result<Shortcut, RepositoryError> {
        sqlx::query(
            "INSERT INTO shortcuts (id, user_id, command, instruction, model_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(shortcut.id.to_string())
        .bind(shortcut.user_id.to_string())
        .bind(&shortcut.command)
        .bind(&shortcut.instruction)
        .bind(shortcut.model_id.map(|id| id.to_string()))
        .bind(format_datetime(&shortcut.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| conflict_or_query(e, &shortcut.command))?;

        Ok(shortcut.clone())
    }

    async fn find_by_command(
        &self,
        user_id: &Uuid,
        command: &str,
    ) -> Result<Option<Shortcut>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM shortcuts WHERE user_id = ? AND command = ?")
            .bind(user_id.to_string())
            .bind(command)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        map_row(row)
    }

    async fn get(&self, user_id: &Uuid, id: &Uuid) -> Result<Option<Shortcut>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM shortcuts WHERE user_id = ? AND id = ?")
            .bind(user_id.to_string())
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        map_row(row)
    }

    async fn list(&self, user_id: &Uuid) -> Result<Vec<Shortcut>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM shortcuts WHERE user_id = ? ORDER BY command")
            .bind(user_id.to_string())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut shortcuts = Vec::with_capacity(rows.len());
        for row in &rows {
            let shortcut_row =
                ShortcutRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            shortcuts.push(shortcut_row.into_shortcut()?);
        }
        Ok(shortcuts)
    }

    async fn update(&self, shortcut: &Shortcut) -> Result<Shortcut, RepositoryError> {
        let result = sqlx::query(
            "UPDATE shortcuts SET command = ?, instruction = ?, model_id = ?
             WHERE id = ? AND user_id = ?",
        )
        .bind(&shortcut.command)
        .bind(&shortcut.instruction)
        .bind(shortcut.model_id.map(|id| id.to_string()))
        .bind(shortcut.id.to_string())
        .bind(shortcut.user_id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| conflict_or_query(e, &shortcut.command))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(shortcut.clone())
    }

    async fn delete(&self, user_id: &Uuid, id: &Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shortcuts WHERE id = ? AND user_id = ?")
            .bind(id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
