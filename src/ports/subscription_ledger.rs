//! SubscriptionLedger port - Idempotent subscription grants.
//!
//! The ledger is the only synchronization point of the notification
//! path. Grants are idempotent on the payment token, tolerating the
//! processor's at-least-once delivery, and atomic per token/user so two
//! near-simultaneous deliveries cannot produce two subscriptions.
//!
//! ## Why grant owns the payment transition
//!
//! Marking the attempt completed, superseding the prior subscription,
//! and inserting the new one must happen as a single atomic unit. The
//! implementations hold that invariant (one write-lock critical section
//! in memory; a transaction plus unique token constraint in PostgreSQL)
//! and never across a network call.

use async_trait::async_trait;

use crate::domain::billing::Subscription;
use crate::domain::foundation::{DomainError, PaymentToken, PlanId, Timestamp, UserId};

/// Result of a grant request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantOutcome {
    /// A new subscription was created.
    Granted(Subscription),
    /// A completed attempt already existed for the token; the existing
    /// subscription is returned unchanged and nothing was written.
    AlreadyGranted(Subscription),
}

impl GrantOutcome {
    /// The subscription associated with the token after the call.
    pub fn subscription(&self) -> &Subscription {
        match self {
            GrantOutcome::Granted(s) | GrantOutcome::AlreadyGranted(s) => s,
        }
    }
}

/// Result of a cancel request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The attempt was completed; its subscription is now canceled and
    /// the attempt moved to refunded.
    Canceled(Subscription),
    /// Unknown or non-completed token; nothing changed. Still recorded
    /// by the caller as a refund-without-grant anomaly.
    NoEffect,
}

/// Port for the subscription grant ledger.
#[async_trait]
pub trait SubscriptionLedger: Send + Sync {
    /// Idempotently grant a subscription for a verified, fraud-checked
    /// payment.
    ///
    /// If a completed attempt already exists for `token`, returns the
    /// existing subscription with no writes. Otherwise atomically:
    /// marks the attempt completed (creating it from the notification
    /// data when checkout glue never recorded one), supersedes any
    /// prior active subscription for `user_id`, and inserts the new
    /// subscription expiring at `expires_at`.
    async fn grant(
        &self,
        user_id: &UserId,
        plan_id: &PlanId,
        token: &PaymentToken,
        amount: i64,
        expires_at: Timestamp,
    ) -> Result<GrantOutcome, DomainError>;

    /// The user's current subscription, only if active and unexpired.
    ///
    /// Lazy expiry: never mutates; an expired record simply yields
    /// `None`.
    async fn find_active(&self, user_id: &UserId) -> Result<Option<Subscription>, DomainError>;

    /// Cancel the subscription granted for `token` following a refund.
    ///
    /// No-op (with `NoEffect`) when the token is unknown or its attempt
    /// never completed; a refund for a payment that granted nothing is
    /// recorded, not surfaced as an error.
    async fn cancel(&self, token: &PaymentToken) -> Result<CancelOutcome, DomainError>;
}
