//! User and subscription types for Parley.
//!
//! A user is identified externally by the id of the messaging platform it
//! signed up from (`external_id`) and internally by a UUIDv7. Quota balances
//! live on the user row; subscriptions are separate records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Plan tag that grants agent mode when the subscription is active.
pub const PREMIUM_PLAN: &str = "PRO";

/// A platform user with quota balances and subscriptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Identity key on the external platform (unique).
    pub external_id: String,
    pub display_name: String,
    /// Remaining free-tier questions. Never negative.
    pub free_questions: u32,
    /// Remaining premium questions. Never negative.
    pub premium_questions: u32,
    pub default_model_id: Uuid,
    pub system_prompt: String,
    /// Eagerly loaded subscription records.
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether any subscription is currently ACTIVE.
    ///
    /// Status is authoritative; the expiry timestamp is only acted on by
    /// the maintenance job that flips records to EXPIRED.
    pub fn has_active_subscription(&self) -> bool {
        self.subscriptions
            .iter()
            .any(|s| s.status == SubscriptionStatus::Active)
    }

    /// Whether the user holds an active premium-tier subscription (agent mode).
    pub fn has_premium_subscription(&self) -> bool {
        self.subscriptions.iter().any(Subscription::is_active_premium)
    }
}

/// Lifecycle status of a subscription.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (status IN ('ACTIVE', 'EXPIRED'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubscriptionStatus {
    Active,
    Expired,
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionStatus::Active => write!(f, "ACTIVE"),
            SubscriptionStatus::Expired => write!(f, "EXPIRED"),
        }
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Ok(SubscriptionStatus::Active),
            "EXPIRED" => Ok(SubscriptionStatus::Expired),
            other => Err(format!("invalid subscription status: '{other}'")),
        }
    }
}

/// How the subscription was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubscriptionKind {
    Trial,
    Paid,
}

impl Default for SubscriptionKind {
    fn default() -> Self {
        SubscriptionKind::Paid
    }
}

impl fmt::Display for SubscriptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionKind::Trial => write!(f, "TRIAL"),
            SubscriptionKind::Paid => write!(f, "PAID"),
        }
    }
}

impl FromStr for SubscriptionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TRIAL" => Ok(SubscriptionKind::Trial),
            "PAID" => Ok(SubscriptionKind::Paid),
            other => Err(format!("invalid subscription kind: '{other}'")),
        }
    }
}

/// A subscription record belonging to exactly one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan: String,
    pub status: SubscriptionStatus,
    pub kind: SubscriptionKind,
    pub valid_until: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    pub fn is_active_premium(&self) -> bool {
        self.status == SubscriptionStatus::Active && self.plan.eq_ignore_ascii_case(PREMIUM_PLAN)
    }
}

/// Which balance a request draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaBucket {
    Free,
    Premium,
}

impl QuotaBucket {
    /// Column holding this bucket's balance.
    pub fn column(&self) -> &'static str {
        match self {
            QuotaBucket::Free => "free_questions",
            QuotaBucket::Premium => "premium_questions",
        }
    }
}

impl fmt::Display for QuotaBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuotaBucket::Free => write!(f, "free"),
            QuotaBucket::Premium => write!(f, "premium"),
        }
    }
}

/// Request body for logging a user in (creating on first sight).
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub external_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Partial profile update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub system_prompt: Option<String>,
    pub default_model_id: Option<Uuid>,
}

/// Request body for activating a subscription after a payment.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivateSubscriptionRequest {
    pub external_id: String,
    #[serde(default = "default_plan")]
    pub plan: String,
    #[serde(default)]
    pub kind: SubscriptionKind,
    #[serde(default)]
    pub payment_reference: Option<String>,
    #[serde(default)]
    pub provider_payment_reference: Option<String>,
}

fn default_plan() -> String {
    PREMIUM_PLAN.to_string()
}
