//! Model catalog repository trait definition.

use parley_types::error::RepositoryError;
use parley_types::model::AiModel;
use uuid::Uuid;

/// Repository trait for the model catalog.
pub trait ModelRepository: Send + Sync {
    /// Add a model. Fails with `Conflict` on a duplicate system name.
    fn create(
        &self,
        model: &AiModel,
    ) -> impl std::future::Future<Output = Result<AiModel, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<AiModel>, RepositoryError>> + Send;

    fn get_by_system_name(
        &self,
        system_name: &str,
    ) -> impl std::future::Future<Output = Result<Option<AiModel>, RepositoryError>> + Send;

    /// List the catalog, non-premium models first, then by display name.
    fn list(&self) -> impl std::future::Future<Output = Result<Vec<AiModel>, RepositoryError>> + Send;
}
