//! Model catalog access.

use chrono::Utc;
use parley_types::error::{RepositoryError, ServiceError};
use parley_types::model::{AiModel, NewModel};
use tracing::info;
use uuid::Uuid;

use crate::repository::model::ModelRepository;

pub struct ModelService<M: ModelRepository> {
    models: M,
}

impl<M: ModelRepository> ModelService<M> {
    pub fn new(models: M) -> Self {
        Self { models }
    }

    pub async fn list_models(&self) -> Result<Vec<AiModel>, ServiceError> {
        Ok(self.models.list().await?)
    }

    pub async fn get_model(&self, id: &Uuid) -> Result<AiModel, ServiceError> {
        self.models
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("model '{id}' not found")))
    }

    /// Add a catalog entry. The display name defaults to the system name.
    pub async fn add_model(&self, new: NewModel) -> Result<AiModel, ServiceError> {
        let system_name = new.system_name.trim().to_string();
        if system_name.is_empty() {
            return Err(ServiceError::validation("system_name must not be empty"));
        }
        let providers: Vec<String> = new
            .providers
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if providers.is_empty() {
            return Err(ServiceError::validation("at least one provider is required"));
        }

        let model = AiModel {
            id: Uuid::now_v7(),
            display_name: new
                .display_name
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| system_name.clone()),
            system_name,
            providers,
            premium: new.premium,
            capabilities: new.capabilities,
            created_at: Utc::now(),
        };
        let created = self.models.create(&model).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => ServiceError::validation(format!(
                "model '{}' already exists",
                model.system_name
            )),
            other => other.into(),
        })?;
        info!(model_id = %created.id, system_name = %created.system_name, "model added");
        Ok(created)
    }
}
