//! SQLite storage layer.
//!
//! Repository implementations backed by SQLite with WAL mode and split
//! read/write connection pools.

pub mod chat;
pub mod model;
pub mod pool;
pub mod shortcut;
pub mod user;

use chrono::{DateTime, SecondsFormat, Utc};
use parley_types::error::RepositoryError;
use uuid::Uuid;

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width UTC timestamps so lexical order matches chronological order.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_uuid(s: &str, what: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(s).map_err(|e| RepositoryError::Query(format!("invalid {what}: {e}")))
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use parley_core::repository::model::ModelRepository;
    use parley_core::repository::user::UserRepository;
    use parley_types::model::AiModel;
    use parley_types::user::User;
    use uuid::Uuid;

    use super::model::SqliteModelRepository;
    use super::pool::DatabasePool;
    use super::user::SqliteUserRepository;

    pub async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    pub fn make_model(system_name: &str, premium: bool) -> AiModel {
        AiModel {
            id: Uuid::now_v7(),
            system_name: system_name.to_string(),
            display_name: system_name.to_string(),
            providers: vec!["cerebras".to_string()],
            premium,
            capabilities: vec![],
            created_at: Utc::now(),
        }
    }

    pub fn make_user(external_id: &str, default_model_id: Uuid) -> User {
        let now = Utc::now();
        User {
            id: Uuid::now_v7(),
            external_id: external_id.to_string(),
            display_name: format!("user-{external_id}"),
            free_questions: 25,
            premium_questions: 3,
            default_model_id,
            system_prompt: String::new(),
            subscriptions: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    /// Users reference a catalog model, so most tests need one first.
    pub async fn seed_model(pool: &DatabasePool) -> AiModel {
        SqliteModelRepository::new(pool.clone())
            .create(&make_model("llama3.3-70b", false))
            .await
            .unwrap()
    }

    pub async fn seed_user(pool: &DatabasePool, external_id: &str, model_id: Uuid) -> User {
        SqliteUserRepository::new(pool.clone())
            .create(&make_user(external_id, model_id))
            .await
            .unwrap()
    }
}
