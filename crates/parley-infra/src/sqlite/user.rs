//! SQLite user repository implementation.
//!
//! Implements `UserRepository` from `parley-core`. Users are returned with
//! their subscriptions attached; balances change only through
//! [`UserRepository::debit_balance`], which is a single atomic UPDATE.

use parley_core::repository::user::UserRepository;
use parley_types::error::RepositoryError;
use parley_types::user::{QuotaBucket, Subscription, User};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, parse_uuid};

/// SQLite-backed implementation of `UserRepository`.
pub struct SqliteUserRepository {
    pool: DatabasePool,
}

impl SqliteUserRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct UserRow {
    id: String,
    external_id: String,
    display_name: String,
    free_questions: i64,
    premium_questions: i64,
    default_model_id: String,
    system_prompt: String,
    created_at: String,
    updated_at: String,
}

impl UserRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            external_id: row.try_get("external_id")?,
            display_name: row.try_get("display_name")?,
            free_questions: row.try_get("free_questions")?,
            premium_questions: row.try_get("premium_questions")?,
            default_model_id: row.try_get("default_model_id")?,
            system_prompt: row.try_get("system_prompt")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_user(self, subscriptions: Vec<Subscription>) -> Result<User, RepositoryError> {
        Ok(User {
            id: parse_uuid(&self.id, "user id")?,
            external_id: self.external_id,
            display_name: self.display_name,
            free_questions: balance(self.free_questions)?,
            premium_questions: balance(self.premium_questions)?,
            default_model_id: parse_uuid(&self.default_model_id, "model id")?,
            system_prompt: self.system_prompt,
            subscriptions,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct SubscriptionRow {
    id: String,
    user_id: String,
    plan: String,
    status: String,
    kind: String,
    valid_until: String,
    payment_reference: Option<String>,
    provider_payment_reference: Option<String>,
    created_at: String,
}

impl SubscriptionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            plan: row.try_get("plan")?,
            status: row.try_get("status")?,
            kind: row.try_get("kind")?,
            valid_until: row.try_get("valid_until")?,
            payment_reference: row.try_get("payment_reference")?,
            provider_payment_reference: row.try_get("provider_payment_reference")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_subscription(self) -> Result<Subscription, RepositoryError> {
        Ok(Subscription {
            id: parse_uuid(&self.id, "subscription id")?,
            user_id: parse_uuid(&self.user_id, "user id")?,
            plan: self.plan,
            status: self.status.parse().map_err(RepositoryError::Query)?,
            kind: self.kind.parse().map_err(RepositoryError::Query)?,
            valid_until: parse_datetime(&self.valid_until)?,
            payment_reference: self.payment_reference,
            provider_payment_reference: self.provider_payment_reference,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn balance(value: i64) -> Result<u32, RepositoryError> {
    u32::try_from(value).map_err(|_| RepositoryError::Query(format!("invalid balance: {value}")))
}

impl SqliteUserRepository {
    async fn subscriptions_of(&self, user_id: &str) -> Result<Vec<Subscription>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM subscriptions WHERE user_id = ? ORDER BY created_at")
            .bind(user_id)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut subscriptions = Vec::with_capacity(rows.len());
        for row in &rows {
            let sub_row = SubscriptionRow::from_row(row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            subscriptions.push(sub_row.into_subscription()?);
        }
        Ok(subscriptions)
    }

    async fn fetch_user(&self, sql: &str, key: String) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(sql)
            .bind(key)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let user_row = UserRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
        let subscriptions = self.subscriptions_of(&user_row.id).await?;
        Ok(Some(user_row.into_user(subscriptions)?))
    }
}

impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: &User) -> Result<User, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO users (id, external_id, display_name, free_questions, premium_questions, default_model_id, system_prompt, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id.to_string())
        .bind(&user.external_id)
        .bind(&user.display_name)
        .bind(i64::from(user.free_questions))
        .bind(i64::from(user.premium_questions))
        .bind(user.default_model_id.to_string())
        .bind(&user.system_prompt)
        .bind(format_datetime(&user.created_at))
        .bind(format_datetime(&user.updated_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(user.clone()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => {
                Err(RepositoryError::Conflict(format!(
                    "user '{}' already exists",
                    user.external_id
                )))
            }
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn get_by_external_id(&self, external_id: &str) -> Result<Option<User>, RepositoryError> {
        self.fetch_user(
            "SELECT * FROM users WHERE external_id = ?",
            external_id.to_string(),
        )
        .await
    }

    async fn get_by_id(&self, id: &Uuid) -> Result<Option<User>, RepositoryError> {
        self.fetch_user("SELECT * FROM users WHERE id = ?", id.to_string())
            .await
    }

    async fn update_profile(&self, user: &User) -> Result<User, RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET display_name = ?, system_prompt = ?, default_model_id = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&user.display_name)
        .bind(&user.system_prompt)
        .bind(user.default_model_id.to_string())
        .bind(format_datetime(&user.updated_at))
        .bind(user.id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get_by_id(&user.id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn debit_balance(
        &self,
        user_id: &Uuid,
        bucket: QuotaBucket,
        cost: u32,
    ) -> Result<u32, RepositoryError> {
        let column = bucket.column();
        let sql = format!(
            "UPDATE users SET {column} = MAX({column} - ?, 0), updated_at = ? WHERE id = ? RETURNING {column}"
        );

        let row = sqlx::query(&sql)
            .bind(i64::from(cost))
            .bind(format_datetime(&chrono::Utc::now()))
            .bind(user_id.to_string())
            .fetch_optional(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let row = row.ok_or(RepositoryError::NotFound)?;
        let remaining: i64 = row
            .try_get(column)
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        balance(remaining)
    }

    async fn upsert_subscription(
        &self,
        subscription: &Subscription,
    ) -> Result<Subscription, RepositoryError> {
        let row = sqlx::query(
            "INSERT INTO subscriptions (id, user_id, plan, status, kind, valid_until, payment_reference, provider_payment_reference, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(user_id, plan) DO UPDATE SET
                status = excluded.status,
                kind = excluded.kind,
                valid_until = excluded.valid_until,
                payment_reference = excluded.payment_reference,
                provider_payment_reference = excluded.provider_payment_reference
             RETURNING *",
        )
        .bind(subscription.id.to_string())
        .bind(subscription.user_id.to_string())
        .bind(&subscription.plan)
        .bind(subscription.status.to_string())
        .bind(subscription.kind.to_string())
        .bind(format_datetime(&subscription.valid_until))
        .bind(&subscription.payment_reference)
        .bind(&subscription.provider_payment_reference)
        .bind(format_datetime(&subscription.created_at))
        .fetch_one(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        SubscriptionRow::from_row(&row)
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            .into_subscription()
    }
}
