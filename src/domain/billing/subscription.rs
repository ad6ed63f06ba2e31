//! Subscription entity with lazy expiry.
//!
//! A subscription exists only as the consequence of a payment attempt
//! completing. Expiry is evaluated at read time; no background sweeper
//! rewrites statuses.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PaymentToken, PlanId, SubscriptionId, Timestamp, UserId};

/// Stored status of a subscription.
///
/// Expiry is deliberately not a stored status: a subscription past its
/// `expires_at` is inactive regardless of what this field says.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    /// Currently granted (subject to lazy expiry).
    Active,
    /// Deactivated by a verified refund.
    Canceled,
    /// Replaced by a newer grant for the same user.
    Superseded,
}

impl SubscriptionStatus {
    /// Stable string form used in storage and audit payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Superseded => "superseded",
        }
    }

    /// Parses the stable string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(SubscriptionStatus::Active),
            "canceled" => Some(SubscriptionStatus::Canceled),
            "superseded" => Some(SubscriptionStatus::Superseded),
            _ => None,
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A subscription grant produced by a completed payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub plan_id: PlanId,
    /// Token of the payment that produced this grant.
    pub payment_token: PaymentToken,
    pub status: SubscriptionStatus,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
}

impl Subscription {
    /// Creates a new active subscription.
    ///
    /// `expires_at` is computed by the caller from the plan's duration
    /// at grant time.
    pub fn new_active(
        user_id: UserId,
        plan_id: PlanId,
        payment_token: PaymentToken,
        expires_at: Timestamp,
        now: Timestamp,
    ) -> Self {
        Self {
            id: SubscriptionId::new(),
            user_id,
            plan_id,
            payment_token,
            status: SubscriptionStatus::Active,
            expires_at,
            created_at: now,
        }
    }

    /// Whether this subscription grants access at `now`.
    ///
    /// Lazy expiry: an Active record past `expires_at` is inactive
    /// without any status write.
    pub fn is_active_at(&self, now: Timestamp) -> bool {
        self.status == SubscriptionStatus::Active && self.expires_at.is_after(&now)
    }

    /// Deactivates the subscription following a verified refund.
    pub fn cancel(&mut self) {
        self.status = SubscriptionStatus::Canceled;
    }

    /// Deactivates the subscription because a newer grant replaced it.
    pub fn supersede(&mut self) {
        self.status = SubscriptionStatus::Superseded;
    }
}
