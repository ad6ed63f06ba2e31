//! PaymentStore port - Payment attempt lifecycle.
//!
//! Tracks individual payment attempts keyed by their external token.
//! Implementations must enforce at most one attempt per token and apply
//! status changes through the PaymentStatus state machine only.

use async_trait::async_trait;

use crate::domain::billing::{PaymentAttempt, PaymentStatus};
use crate::domain::foundation::{DomainError, PaymentToken, PlanId, UserId};

/// Result of a status update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    /// Transition was legal and has been applied.
    Applied(PaymentAttempt),
    /// Attempt already carried the requested status; nothing written.
    NoOp,
    /// No attempt exists for the token.
    NotFound,
    /// Transition contradicts the state machine (e.g. failed →
    /// completed). Rejected; the caller records the anomaly.
    Anomalous {
        /// Status the attempt actually holds.
        current: PaymentStatus,
    },
}

/// Port for persisting payment attempts.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Create a pending attempt for a fresh checkout.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if an attempt already exists for the token
    /// - `DatabaseError` on persistence failure
    async fn create(
        &self,
        user_id: &UserId,
        plan_id: &PlanId,
        token: &PaymentToken,
        amount: i64,
    ) -> Result<PaymentAttempt, DomainError>;

    /// Find an attempt by its external token.
    async fn find_by_token(
        &self,
        token: &PaymentToken,
    ) -> Result<Option<PaymentAttempt>, DomainError>;

    /// Apply a status transition idempotently.
    ///
    /// Same-status requests are no-ops; contradictory terminal
    /// transitions return `Anomalous` without being applied; unknown
    /// tokens return `NotFound`. Nothing here ever forces a write the
    /// state machine forbids.
    async fn update_status(
        &self,
        token: &PaymentToken,
        new_status: PaymentStatus,
    ) -> Result<StatusUpdate, DomainError>;
}
