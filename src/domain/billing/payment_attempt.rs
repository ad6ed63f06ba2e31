//! PaymentAttempt entity and its status state machine.
//!
//! One attempt per external payment token. Attempts are never deleted;
//! terminal states are retained for audit.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PaymentAttemptId, PaymentToken, PlanId, Timestamp, UserId};

/// Lifecycle status of a payment attempt.
///
/// # State Machine
///
/// ```text
/// Pending ──▶ Completed ──▶ Refunded
///    │
///    └──▶ Failed
/// ```
///
/// Transitions are monotonic; Failed and Refunded are terminal. Anything
/// else is an anomaly, rejected and logged rather than applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Checkout initiated, no verified notification yet.
    Pending,
    /// Verified success notification passed the fraud guard.
    Completed,
    /// Verified failure notification.
    Failed,
    /// Verified refund of a completed payment.
    Refunded,
}

impl PaymentStatus {
    /// Whether a direct transition to `next` is legal.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pending, PaymentStatus::Completed)
                | (PaymentStatus::Pending, PaymentStatus::Failed)
                | (PaymentStatus::Completed, PaymentStatus::Refunded)
        )
    }

    /// Whether this status admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Failed | PaymentStatus::Refunded)
    }

    /// Stable string form used in storage and audit payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    /// Parses the stable string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "completed" => Some(PaymentStatus::Completed),
            "failed" => Some(PaymentStatus::Failed),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single payment attempt, keyed by its external token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAttempt {
    pub id: PaymentAttemptId,
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub token: PaymentToken,
    /// Amount in minor currency units agreed at checkout time.
    pub amount: i64,
    pub status: PaymentStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PaymentAttempt {
    /// Creates a new pending attempt at checkout initiation.
    pub fn new_pending(
        user_id: UserId,
        plan_id: PlanId,
        token: PaymentToken,
        amount: i64,
        now: Timestamp,
    ) -> Self {
        Self {
            id: PaymentAttemptId::new(),
            user_id,
            plan_id,
            token,
            amount,
            status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a status transition if the state machine permits it.
    ///
    /// Returns `true` when applied, `false` when the transition is
    /// illegal. A same-status transition is not an error but also not a
    /// write; callers treat it as a no-op.
    pub fn transition_to(&mut self, next: PaymentStatus, now: Timestamp) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        self.updated_at = now;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt() -> PaymentAttempt {
        PaymentAttempt::new_pending(
            UserId::new("u1").unwrap(),
            PlanId::new("starter").unwrap(),
            PaymentToken::new("tok_1").unwrap(),
            9800,
            Timestamp::now(),
        )
    }

    // ══════════════════════════════════════════════════════════════
    // State Machine Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn pending_can_complete_or_fail() {
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Completed));
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Failed));
        assert!(!PaymentStatus::Pending.can_transition_to(PaymentStatus::Refunded));
    }

    #[test]
    fn completed_can_only_refund() {
        assert!(PaymentStatus::Completed.can_transition_to(PaymentStatus::Refunded));
        assert!(!PaymentStatus::Completed.can_transition_to(PaymentStatus::Pending));
        assert!(!PaymentStatus::Completed.can_transition_to(PaymentStatus::Failed));
    }

    #[test]
    fn terminal_states_admit_nothing() {
        for terminal in [PaymentStatus::Failed, PaymentStatus::Refunded] {
            assert!(terminal.is_terminal());
            for next in [
                PaymentStatus::Pending,
                PaymentStatus::Completed,
                PaymentStatus::Failed,
                PaymentStatus::Refunded,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn same_status_is_never_a_transition() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Completed,
            PaymentStatus::Failed,
            PaymentStatus::Refunded,
        ] {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn status_string_roundtrip() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Completed,
            PaymentStatus::Failed,
            PaymentStatus::Refunded,
        ] {
            assert_eq!(PaymentStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(PaymentStatus::parse("disputed"), None);
    }

    // ══════════════════════════════════════════════════════════════
    // Entity Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn new_attempt_starts_pending() {
        let attempt = attempt();
        assert_eq!(attempt.status, PaymentStatus::Pending);
        assert_eq!(attempt.amount, 9800);
    }

    #[test]
    fn legal_transition_updates_status_and_time() {
        let mut attempt = attempt();
        let later = attempt.created_at.plus_secs(5);

        assert!(attempt.transition_to(PaymentStatus::Completed, later));

        assert_eq!(attempt.status, PaymentStatus::Completed);
        assert_eq!(attempt.updated_at, later);
    }

    #[test]
    fn illegal_transition_leaves_attempt_untouched() {
        let mut attempt = attempt();
        attempt.transition_to(PaymentStatus::Failed, Timestamp::now());
        let before = attempt.clone();

        assert!(!attempt.transition_to(PaymentStatus::Completed, Timestamp::now()));

        assert_eq!(attempt, before);
    }
}
