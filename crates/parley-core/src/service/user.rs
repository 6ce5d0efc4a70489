//! User accounts: login, lookup and profile updates.

use chrono::Utc;
use parley_types::config::QuotaConfig;
use parley_types::error::{RepositoryError, ServiceError};
use parley_types::user::{UpdateProfileRequest, User};
use tracing::info;
use uuid::Uuid;

use crate::repository::model::ModelRepository;
use crate::repository::user::UserRepository;

pub struct UserService<U: UserRepository, M: ModelRepository> {
    users: U,
    models: M,
    signup: QuotaConfig,
}

impl<U: UserRepository, M: ModelRepository> UserService<U, M> {
    pub fn new(users: U, models: M, signup: QuotaConfig) -> Self {
        Self {
            users,
            models,
            signup,
        }
    }

    /// Return the user for `external_id`, creating it on first sight.
    ///
    /// New users get the configured signup balances and default model.
    /// An existing user's display name is refreshed when one is supplied.
    pub async fn login(
        &self,
        external_id: &str,
        display_name: Option<&str>,
    ) -> Result<User, ServiceError> {
        let external_id = external_id.trim();
        if external_id.is_empty() {
            return Err(ServiceError::validation("external_id is required"));
        }

        if let Some(mut user) = self.users.get_by_external_id(external_id).await? {
            if let Some(name) = display_name.filter(|n| *n != user.display_name) {
                user.display_name = name.to_string();
                user.updated_at = Utc::now();
                return Ok(self.users.update_profile(&user).await?);
            }
            return Ok(user);
        }

        let default_model_id = self.signup_model().await?;
        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            external_id: external_id.to_string(),
            display_name: display_name.unwrap_or_default().to_string(),
            free_questions: self.signup.signup_free_questions,
            premium_questions: self.signup.signup_premium_questions,
            default_model_id,
            system_prompt: String::new(),
            subscriptions: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        match self.users.create(&user).await {
            Ok(created) => {
                info!(user_id = %created.id, external_id, "user registered");
                Ok(created)
            }
            // Lost a race with a concurrent login for the same account.
            Err(RepositoryError::Conflict(_)) => self.get_user(external_id).await,
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_user(&self, external_id: &str) -> Result<User, ServiceError> {
        self.users
            .get_by_external_id(external_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("user '{external_id}' not found")))
    }

    pub async fn update_profile(
        &self,
        external_id: &str,
        changes: UpdateProfileRequest,
    ) -> Result<User, ServiceError> {
        let mut user = self.get_user(external_id).await?;
        if let Some(name) = changes.display_name {
            user.display_name = name.trim().to_string();
        }
        if let Some(prompt) = changes.system_prompt {
            user.system_prompt = prompt;
        }
        if let Some(model_id) = changes.default_model_id {
            if self.models.get_by_id(&model_id).await?.is_none() {
                return Err(ServiceError::not_found(format!("model '{model_id}' not found")));
            }
            user.default_model_id = model_id;
        }
        user.updated_at = Utc::now();
        let updated = self.users.update_profile(&user).await?;
        info!(user_id = %updated.id, "profile updated");
        Ok(updated)
    }

    async fn signup_model(&self) -> Result<Uuid, ServiceError> {
        if let Some(id) = self.signup.default_model_id {
            return match self.models.get_by_id(&id).await? {
                Some(model) => Ok(model.id),
                None => Err(ServiceError::Internal(format!(
                    "configured default model {id} is not in the catalog"
                ))),
            };
        }
        self.models
            .list()
            .await?
            .into_iter()
            .find(|m| !m.premium)
            .map(|m| m.id)
            .ok_or_else(|| ServiceError::Internal("model catalog has no free model".to_string()))
    }
}
