//! AuditLog port - Append-only security event record.
//!
//! Every security-relevant decision leaves an entry: grants, refusals,
//! fraud verdicts, anomalies, and resource deliveries. Entries are
//! never updated or deleted.
//!
//! Writes are attempted synchronously but must not block or roll back
//! the operation that produced the event; implementations swallow their
//! own failures after escalating them to the error log.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AuditEntryId, Timestamp, UserId};

/// Action tag of an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Checkout created a pending payment attempt.
    CheckoutInitiated,
    /// A verified payment produced a subscription.
    SubscriptionGranted,
    /// A verified refund deactivated a subscription.
    SubscriptionCanceled,
    /// A verified failure notification closed an attempt.
    PaymentFailed,
    /// Claimed amount contradicted the catalog price.
    FraudDetected,
    /// Refund arrived for a token that never granted access.
    RefundWithoutGrant,
    /// A status update contradicted the payment state machine.
    AnomalousTransition,
    /// A protected resource was delivered.
    ResourceAccessed,
}

impl AuditAction {
    /// Stable string tag used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::CheckoutInitiated => "checkout_initiated",
            AuditAction::SubscriptionGranted => "subscription_granted",
            AuditAction::SubscriptionCanceled => "subscription_canceled",
            AuditAction::PaymentFailed => "payment_failed",
            AuditAction::FraudDetected => "fraud_detected",
            AuditAction::RefundWithoutGrant => "refund_without_grant",
            AuditAction::AnomalousTransition => "anomalous_transition",
            AuditAction::ResourceAccessed => "resource_accessed",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One append-only audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditEntryId,
    /// Subject user when one is known; anomalies for unknown tokens
    /// have none.
    pub user_id: Option<UserId>,
    pub action: AuditAction,
    /// Structured event payload.
    pub details: serde_json::Value,
    pub source_ip: Option<String>,
    pub timestamp: Timestamp,
}

impl AuditEntry {
    /// Creates an entry for the given action and payload.
    pub fn new(action: AuditAction, details: serde_json::Value) -> Self {
        Self {
            id: AuditEntryId::new(),
            user_id: None,
            action,
            details,
            source_ip: None,
            timestamp: Timestamp::now(),
        }
    }

    /// Attaches the subject user.
    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Attaches the request source address.
    pub fn with_source_ip(mut self, ip: impl Into<String>) -> Self {
        self.source_ip = Some(ip.into());
        self
    }
}

/// Port for the append-only audit log.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Append an entry.
    ///
    /// Infallible from the caller's perspective: implementations must
    /// attempt the write synchronously and report their own failures to
    /// the error channel instead of propagating them.
    async fn append(&self, entry: AuditEntry);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entry_builder_attaches_user_and_ip() {
        let entry = AuditEntry::new(AuditAction::FraudDetected, json!({"expected": 9800}))
            .with_user(UserId::new("u1").unwrap())
            .with_source_ip("203.0.113.9");

        assert_eq!(entry.action, AuditAction::FraudDetected);
        assert_eq!(entry.user_id.as_ref().unwrap().as_str(), "u1");
        assert_eq!(entry.source_ip.as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn action_tags_are_stable() {
        assert_eq!(AuditAction::FraudDetected.as_str(), "fraud_detected");
        assert_eq!(AuditAction::ResourceAccessed.as_str(), "resource_accessed");
        assert_eq!(AuditAction::RefundWithoutGrant.as_str(), "refund_without_grant");
    }

    #[test]
    fn action_serializes_as_snake_case() {
        let json = serde_json::to_string(&AuditAction::SubscriptionGranted).unwrap();
        assert_eq!(json, "\"subscription_granted\"");
    }

    #[test]
    fn audit_log_is_object_safe() {
        fn _accepts_dyn(_log: &dyn AuditLog) {}
    }
}
