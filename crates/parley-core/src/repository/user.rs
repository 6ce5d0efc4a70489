//! User repository trait definition.

use parley_types::error::RepositoryError;
use parley_types::user::{QuotaBucket, Subscription, User};
use uuid::Uuid;

/// Repository trait for users, their balances and subscriptions.
///
/// Every `User` returned carries its subscriptions (eager fetch shape).
/// Implementations live in parley-infra (e.g., SqliteUserRepository).
pub trait UserRepository: Send + Sync {
    /// Insert a new user. Fails with `Conflict` if the external id exists.
    fn create(
        &self,
        user: &User,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;

    /// Look up a user by the id of the external platform account.
    fn get_by_external_id(
        &self,
        external_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Look up a user by internal id.
    fn get_by_id(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Persist profile fields (display name, system prompt, default model).
    ///
    /// Balances are never written here; see [`UserRepository::debit_balance`].
    fn update_profile(
        &self,
        user: &User,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;

    /// Atomically subtract `cost` from one balance, flooring at zero.
    ///
    /// Returns the balance after the debit, or `NotFound` for an unknown user.
    fn debit_balance(
        &self,
        user_id: &Uuid,
        bucket: QuotaBucket,
        cost: u32,
    ) -> impl std::future::Future<Output = Result<u32, RepositoryError>> + Send;

    /// Insert or replace the user's subscription for `subscription.plan`.
    fn upsert_subscription(
        &self,
        subscription: &Subscription,
    ) -> impl std::future::Future<Output = Result<Subscription, RepositoryError>> + Send;
}
