//! SQLite model catalog repository implementation.
//!
//! Implements `ModelRepository` from `parley-core`. Provider ids and
//! capability tags are stored as JSON arrays.

use parley_core::repository::model::ModelRepository;
use parley_types::error::RepositoryError;
use parley_types::model::AiModel;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, parse_uuid};

/// SQLite-backed implementation of `ModelRepository`.
pub struct SqliteModelRepository {
    pool: DatabasePool,
}

impl SqliteModelRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct ModelRow {
    id: String,
    system_name: String,
    display_name: String,
    providers: String,
    premium: bool,
    capabilities: String,
    created_at: String,
}

impl ModelRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            system_name: row.try_get("system_name")?,
            display_name: row.try_get("display_name")?,
            providers: row.try_get("providers")?,
            premium: row.try_get("premium")?,
            capabilities: row.try_get("capabilities")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_model(self) -> Result<AiModel, RepositoryError> {
        let providers: Vec<String> = serde_json::from_str(&self.providers)
            .map_err(|e| RepositoryError::Query(format!("invalid providers JSON: {e}")))?;
        let capabilities: Vec<String> = serde_json::from_str(&self.capabilities)
            .map_err(|e| RepositoryError::Query(format!("invalid capabilities JSON: {e}")))?;

        Ok(AiModel {
            id: parse_uuid(&self.id, "model id")?,
            system_name: self.system_name,
            display_name: self.display_name,
            providers,
            premium: self.premium,
            capabilities,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

impl SqliteModelRepository {
    async fn fetch_one(
        &self,
        sql: &str,
        key: String,
    ) -> Result<Option<AiModel>, RepositoryError> {
        let row = sqlx::query(sql)
            .bind(key)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let model_row =
                    ModelRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(model_row.into_model()?))
            }
            None => Ok(None),
        }
    }
}

impl ModelRepository for SqliteModelRepository {
    async fn create(&self, model: &AiModel) -> Result<AiModel, RepositoryError> {
        let providers_json = serde_json::to_string(&model.providers)
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        let capabilities_json = serde_json::to_string(&model.capabilities)
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let result = sqlx::query(
            "INSERT INTO models (id, system_name, display_name, providers, premium, capabilities, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(model.id.to_string())
        .bind(&model.system_name)
        .bind(&model.display_name)
        .bind(&providers_json)
        .bind(model.premium)
        .bind(&capabilities_json)
        .bind(format_datetime(&model.created_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(model.clone()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => {
                Err(RepositoryError::Conflict(format!(
                    "model '{}' already exists",
                    model.system_name
                )))
            }
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn get_by_id(&self, id: &Uuid) -> Result<Option<AiModel>, RepositoryError> {
        self.fetch_one("SELECT * FROM models WHERE id = ?", id.to_string())
            .await
    }

    async fn get_by_system_name(
        &self,
        system_name: &str,
    ) -> Result<Option<AiModel>, RepositoryError> {
        self.fetch_one(
            "SELECT * FROM models WHERE system_name = ?",
            system_name.to_string(),
        )
        .await
    }

    async fn list(&self) -> Result<Vec<AiModel>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM models ORDER BY premium ASC, display_name ASC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut models = Vec::with_capacity(rows.len());
        for row in &rows {
            let model_row =
                ModelRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            models.push(model_row.into_model()?);
        }
        Ok(models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_support::{make_model, test_pool};

    #[tokio::test]
    async fn test_create_and_get_model() {
        let repo = SqliteModelRepository::new(test_pool().await);
        let mut model = make_model("llama3.3-70b", false);
        model.capabilities = vec!["vision".to_string()];

        repo.create(&model).await.unwrap();

        let found = repo.get_by_id(&model.id).await.unwrap().unwrap();
        assert_eq!(found.system_name, "llama3.3-70b");
        assert_eq!(found.providers, vec!["cerebras".to_string()]);
        assert_eq!(found.capabilities, vec!["vision".to_string()]);
        assert!(!found.premium);

        let by_name = repo.get_by_system_name("llama3.3-70b").await.unwrap();
        assert_eq!(by_name.map(|m| m.id), Some(model.id));
    }

    #[tokio::test]
    async fn test_duplicate_system_name_conflicts() {
        let repo = SqliteModelRepository::new(test_pool().await);
        repo.create(&make_model("gpt-4o", true)).await.unwrap();

        let err = repo.create(&make_model("gpt-4o", true)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_puts_free_models_first() {
        let repo = SqliteModelRepository::new(test_pool().await);
        repo.create(&make_model("claude-opus", true)).await.unwrap();
        repo.create(&make_model("mistral-small", false)).await.unwrap();
        repo.create(&make_model("gemma", false)).await.unwrap();

        let names: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.system_name)
            .collect();
        assert_eq!(names, vec!["gemma", "mistral-small", "claude-opus"]);
    }

    #[tokio::test]
    async fn test_missing_model_is_none() {
        let repo = SqliteModelRepository::new(test_pool().await);
        assert!(repo.get_by_id(&Uuid::now_v7()).await.unwrap().is_none());
        assert!(repo.get_by_system_name("nope").await.unwrap().is_none());
    }
}
