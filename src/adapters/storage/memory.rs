//! In-memory billing store.
//!
//! Implements `PaymentStore` and `SubscriptionLedger` over one shared
//! state behind a `tokio::sync::RwLock`: reads never block other reads,
//! and the grant/cancel critical sections are the atomic units the
//! ledger contract requires. Suitable for tests and databaseless
//! deployments; the PostgreSQL adapter carries the same semantics for
//! multi-instance setups.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::billing::{PaymentAttempt, PaymentStatus, Subscription, SubscriptionStatus};
use crate::domain::foundation::{
    DomainError, ErrorCode, PaymentToken, PlanId, Timestamp, UserId,
};
use crate::ports::{
    AuditEntry, AuditLog, CancelOutcome, GrantOutcome, PaymentStore, StatusUpdate,
    SubscriptionLedger,
};

/// Shared mutable state of the in-memory store.
#[derive(Debug, Default)]
struct LedgerState {
    /// Payment attempts keyed by their external token.
    payments: HashMap<String, PaymentAttempt>,
    subscriptions: Vec<Subscription>,
}

/// In-memory payment store and subscription ledger.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryLedger {
    async fn create(
        &self,
        user_id: &UserId,
        plan_id: &PlanId,
        token: &PaymentToken,
        amount: i64,
    ) -> Result<PaymentAttempt, DomainError> {
        let mut state = self.state.write().await;
        if state.payments.contains_key(token.as_str()) {
            return Err(DomainError::validation(
                "token",
                "A payment attempt already exists for this token",
            ));
        }

        let attempt = PaymentAttempt::new_pending(
            user_id.clone(),
            plan_id.clone(),
            token.clone(),
            amount,
            Timestamp::now(),
        );
        state
            .payments
            .insert(token.as_str().to_string(), attempt.clone());
        Ok(attempt)
    }

    async fn find_by_token(
        &self,
        token: &PaymentToken,
    ) -> Result<Option<PaymentAttempt>, DomainError> {
        let state = self.state.read().await;
        Ok(state.payments.get(token.as_str()).cloned())
    }

    async fn update_status(
        &self,
        token: &PaymentToken,
        new_status: PaymentStatus,
    ) -> Result<StatusUpdate, DomainError> {
        let mut state = self.state.write().await;
        let attempt = match state.payments.get_mut(token.as_str()) {
            Some(attempt) => attempt,
            None => return Ok(StatusUpdate::NotFound),
        };

        if attempt.status == new_status {
            return Ok(StatusUpdate::NoOp);
        }
        if attempt.transition_to(new_status, Timestamp::now()) {
            Ok(StatusUpdate::Applied(attempt.clone()))
        } else {
            Ok(StatusUpdate::Anomalous {
                current: attempt.status,
            })
        }
    }
}

#[async_trait]
impl SubscriptionLedger for InMemoryLedger {
    async fn grant(
        &self,
        user_id: &UserId,
        plan_id: &PlanId,
        token: &PaymentToken,
        amount: i64,
        expires_at: Timestamp,
    ) -> Result<GrantOutcome, DomainError> {
        // One write lock spans the idempotency check, the attempt
        // transition, the supersede, and the insert: the atomic unit.
        let mut state = self.state.write().await;
        let now = Timestamp::now();

        if let Some(attempt) = state.payments.get(token.as_str()) {
            if attempt.status == PaymentStatus::Completed {
                let existing = state
                    .subscriptions
                    .iter()
                    .find(|s| s.payment_token == *token)
                    .cloned()
                    .ok_or_else(|| {
                        DomainError::new(
                            ErrorCode::InternalError,
                            "Completed attempt has no subscription",
                        )
                    })?;
                return Ok(GrantOutcome::AlreadyGranted(existing));
            }
        }

        match state.payments.get_mut(token.as_str()) {
            Some(attempt) => {
                if !attempt.transition_to(PaymentStatus::Completed, now) {
                    return Err(DomainError::new(
                        ErrorCode::InvalidStateTransition,
                        format!(
                            "Attempt for token cannot complete from {}",
                            attempt.status
                        ),
                    ));
                }
            }
            None => {
                // Checkout glue never recorded this token; create the
                // attempt from notification data inside the same unit.
                let mut attempt = PaymentAttempt::new_pending(
                    user_id.clone(),
                    plan_id.clone(),
                    token.clone(),
                    amount,
                    now,
                );
                attempt.transition_to(PaymentStatus::Completed, now);
                state.payments.insert(token.as_str().to_string(), attempt);
            }
        }

        for subscription in state.subscriptions.iter_mut() {
            if subscription.user_id == *user_id
                && subscription.status == SubscriptionStatus::Active
            {
                subscription.supersede();
            }
        }

        let subscription = Subscription::new_active(
            user_id.clone(),
            plan_id.clone(),
            token.clone(),
            expires_at,
            now,
        );
        state.subscriptions.push(subscription.clone());
        Ok(GrantOutcome::Granted(subscription))
    }

    async fn find_active(&self, user_id: &UserId) -> Result<Option<Subscription>, DomainError> {
        let state = self.state.read().await;
        let now = Timestamp::now();
        Ok(state
            .subscriptions
            .iter()
            .find(|s| s.user_id == *user_id && s.is_active_at(now))
            .cloned())
    }

    async fn cancel(&self, token: &PaymentToken) -> Result<CancelOutcome, DomainError> {
        let mut state = self.state.write().await;

        let completed = state
            .payments
            .get(token.as_str())
            .map(|a| a.status == PaymentStatus::Completed)
            .unwrap_or(false);
        if !completed {
            return Ok(CancelOutcome::NoEffect);
        }

        let position = state
            .subscriptions
            .iter()
            .position(|s| s.payment_token == *token);
        let position = match position {
            Some(position) => position,
            None => return Ok(CancelOutcome::NoEffect),
        };

        let now = Timestamp::now();
        if let Some(attempt) = state.payments.get_mut(token.as_str()) {
            attempt.transition_to(PaymentStatus::Refunded, now);
        }
        let subscription = &mut state.subscriptions[position];
        subscription.cancel();
        Ok(CancelOutcome::Canceled(subscription.clone()))
    }
}

/// In-memory append-only audit log.
///
/// Appends cannot fail here; the port contract still applies to other
/// implementations, which log their own failures instead of
/// propagating.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditLog {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries, oldest first.
    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }

    /// Entries with the given action tag.
    pub async fn entries_with_action(
        &self,
        action: crate::ports::AuditAction,
    ) -> Vec<AuditEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.action == action)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn append(&self, entry: AuditEntry) {
        tracing::info!(
            action = %entry.action,
            user_id = entry.user_id.as_ref().map(|u| u.as_str()).unwrap_or("-"),
            "audit"
        );
        self.entries.write().await.push(entry);
    }
}
