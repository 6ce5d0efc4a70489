//! Subscription activation.

use chrono::{Months, Utc};
use parley_types::error::ServiceError;
use parley_types::user::{ActivateSubscriptionRequest, Subscription, SubscriptionStatus};
use tracing::info;
use uuid::Uuid;

use crate::repository::user::UserRepository;

/// Validity window granted by one activation.
const VALIDITY_MONTHS: u32 = 1;

pub struct SubscriptionService<U: UserRepository> {
    users: U,
}

impl<U: UserRepository> SubscriptionService<U> {
    pub fn new(users: U) -> Self {
        Self { users }
    }

    /// Create or re-activate the user's subscription for the requested plan.
    ///
    /// The subscription is ACTIVE for one month from now. Expiring it is
    /// the maintenance job's concern.
    pub async fn activate(
        &self,
        request: ActivateSubscriptionRequest,
    ) -> Result<Subscription, ServiceError> {
        let plan = request.plan.trim().to_uppercase();
        if plan.is_empty() {
            return Err(ServiceError::validation("plan must not be empty"));
        }
        let user = self
            .users
            .get_by_external_id(&request.external_id)
            .await?
            .ok_or_else(|| {
                ServiceError::not_found(format!("user '{}' not found", request.external_id))
            })?;

        let now = Utc::now();
        let valid_until = now
            .checked_add_months(Months::new(VALIDITY_MONTHS))
            .ok_or_else(|| ServiceError::Internal("subscription expiry overflow".to_string()))?;
        let existing = user.subscriptions.iter().find(|s| s.plan == plan);

        let subscription = Subscription {
            id: existing.map_or_else(Uuid::now_v7, |s| s.id),
            user_id: user.id,
            plan,
            status: SubscriptionStatus::Active,
            kind: request.kind,
            valid_until,
            payment_reference: request.payment_reference,
            provider_payment_reference: request.provider_payment_reference,
            created_at: existing.map_or(now, |s| s.created_at),
        };
        let saved = self.users.upsert_subscription(&subscription).await?;
        info!(
            user_id = %user.id,
            plan = %saved.plan,
            valid_until = %saved.valid_until,
            "subscription activated"
        );
        Ok(saved)
    }
}
