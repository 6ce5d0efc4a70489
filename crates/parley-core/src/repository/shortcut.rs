//! Shortcut repository trait definition.

use parley_types::error::RepositoryError;
use parley_types::shortcut::Shortcut;
use uuid::Uuid;

/// Repository trait for user-scoped shortcuts.
///
/// All lookups take the owning user's id; a shortcut owned by someone else
/// is indistinguishable from a missing one.
pub trait ShortcutRepository: Send + Sync {
    /// Insert a shortcut. Fails with `Conflict` if the user already owns the command.
    fn create(
        &self,
        shortcut: &Shortcut,
    ) -> impl std::future::Future<Output = Result<Shortcut, RepositoryError>> + Send;

    /// Exact-match lookup of a command token.
    fn find_by_command(
        &self,
        user_id: &Uuid,
        command: &str,
    ) -> impl std::future::Future<Output = Result<Option<Shortcut>, RepositoryError>> + Send;

    fn get(
        &self,
        user_id: &Uuid,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Shortcut>, RepositoryError>> + Send;

    /// List a user's shortcuts ordered by command.
    fn list(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Shortcut>, RepositoryError>> + Send;

    /// Overwrite command, instruction and model override.
    fn update(
        &self,
        shortcut: &Shortcut,
    ) -> impl std::future::Future<Output = Result<Shortcut, RepositoryError>> + Send;

    /// Delete a shortcut. Returns `NotFound` if the user owns no such shortcut.
    fn delete(
        &self,
        user_id: &Uuid,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
