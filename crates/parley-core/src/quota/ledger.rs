//! Quota ledger: eligibility checks and debits over the user store.

use parley_types::error::ServiceError;
use parley_types::model::AiModel;
use parley_types::user::{QuotaBucket, User};
use tracing::info;

use crate::repository::user::UserRepository;

const PREMIUM_EXHAUSTED: &str =
    "You have run out of premium questions. Want more? Try the PRO subscription: /pro";
const FREE_EXHAUSTED: &str =
    "You have run out of free questions. Want more? Try the PRO subscription: /pro";

/// Which balance a model draws from.
pub fn bucket_for(model: &AiModel) -> QuotaBucket {
    if model.premium {
        QuotaBucket::Premium
    } else {
        QuotaBucket::Free
    }
}

/// Decide whether `user` may ask `model` a question.
///
/// Premium models need an ACTIVE subscription and a positive premium
/// balance; other models need a positive free balance. Subscription status
/// is authoritative, expiry timestamps are not consulted.
pub fn check_eligibility(user: &User, model: &AiModel) -> Result<QuotaBucket, ServiceError> {
    match bucket_for(model) {
        QuotaBucket::Premium if !user.has_active_subscription() || user.premium_questions == 0 => {
            Err(ServiceError::denied(PREMIUM_EXHAUSTED))
        }
        QuotaBucket::Free if user.free_questions == 0 => Err(ServiceError::denied(FREE_EXHAUSTED)),
        bucket => Ok(bucket),
    }
}

/// Account lookups and balance debits.
///
/// The store is the single source of truth; nothing is cached between calls.
pub struct QuotaLedger<U: UserRepository> {
    users: U,
}

impl<U: UserRepository> QuotaLedger<U> {
    pub fn new(users: U) -> Self {
        Self { users }
    }

    /// Load a user with subscriptions by external id.
    pub async fn find_account(&self, external_id: &str) -> Result<User, ServiceError> {
        self.users
            .get_by_external_id(external_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("user '{external_id}' not found")))
    }

    /// Subtract `cost` from the balance selected by the model's premium flag.
    ///
    /// The store floors the balance at zero in a single statement, so
    /// concurrent debits never drive it negative. Returns the new balance.
    pub async fn debit(&self, user: &User, model: &AiModel, cost: u32) -> Result<u32, ServiceError> {
        let bucket = bucket_for(model);
        let remaining = self.users.debit_balance(&user.id, bucket, cost).await?;
        info!(
            user_id = %user.id,
            bucket = %bucket,
            cost,
            remaining,
            "quota debited"
        );
        Ok(remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryUsers, sample_model, sample_user, subscription};
    use parley_types::error::ErrorKind;
    use parley_types::user::SubscriptionStatus;

    #[test]
    fn test_free_model_with_zero_free_balance_is_denied() {
        let mut user = sample_user();
        user.free_questions = 0;
        let err = check_eligibility(&user, &sample_model(false)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        assert!(err.to_string().contains("free questions"));
    }

    #[test]
    fn test_premium_model_without_subscription_is_denied() {
        let mut user = sample_user();
        user.premium_questions = 10;
        let err = check_eligibility(&user, &sample_model(true)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_premium_model_with_expired_subscription_is_denied() {
        let mut user = sample_user();
        user.premium_questions = 10;
        user.subscriptions = vec![subscription(&user, SubscriptionStatus::Expired)];
        assert!(check_eligibility(&user, &sample_model(true)).is_err());
    }

    #[test]
    fn test_premium_model_with_zero_balance_is_denied() {
        let mut user = sample_user();
        user.premium_questions = 0;
        user.subscriptions = vec![subscription(&user, SubscriptionStatus::Active)];
        assert!(check_eligibility(&user, &sample_model(true)).is_err());
    }

    #[test]
    fn test_eligible_requests_report_bucket() {
        let mut user = sample_user();
        user.premium_questions = 3;
        user.subscriptions = vec![subscription(&user, SubscriptionStatus::Active)];
        assert_eq!(
            check_eligibility(&user, &sample_model(true)).unwrap(),
            QuotaBucket::Premium
        );
        assert_eq!(
            check_eligibility(&user, &sample_model(false)).unwrap(),
            QuotaBucket::Free
        );
    }

    #[tokio::test]
    async fn test_find_account_missing_user() {
        let ledger = QuotaLedger::new(InMemoryUsers::new());
        let err = ledger.find_account("nobody").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_debit_clamps_at_zero() {
        let users = InMemoryUsers::new();
        let mut user = sample_user();
        user.free_questions = 1;
        users.insert(user.clone());
        let ledger = QuotaLedger::new(users.clone());

        let remaining = ledger.debit(&user, &sample_model(false), 3).await.unwrap();
        assert_eq!(remaining, 0);
        assert_eq!(users.get(&user.id).unwrap().free_questions, 0);
    }

    #[tokio::test]
    async fn test_debit_premium_model_leaves_free_balance() {
        let users = InMemoryUsers::new();
        let mut user = sample_user();
        user.free_questions = 5;
        user.premium_questions = 5;
        users.insert(user.clone());
        let ledger = QuotaLedger::new(users.clone());

        ledger.debit(&user, &sample_model(true), 2).await.unwrap();
        let stored = users.get(&user.id).unwrap();
        assert_eq!(stored.premium_questions, 3);
        assert_eq!(stored.free_questions, 5);
    }
}
