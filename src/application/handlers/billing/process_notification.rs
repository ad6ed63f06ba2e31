//! ProcessNotificationHandler - Command handler for inbound payment
//! processor notifications.
//!
//! The single entry point of the payment confirmation state machine.
//! Only an authentication failure propagates to the caller (the
//! processor must retry those as invalid); every other outcome is
//! absorbed, audited where security-relevant, and acknowledged so the
//! processor's retry behavior is never driven by business results.

use std::sync::Arc;

use serde_json::json;

use crate::domain::billing::{
    FraudGuard, FraudVerdict, NotificationError, NotificationFields, NotificationKind,
    NotificationVerifier, PaymentStatus,
};
use crate::domain::foundation::{SubscriptionId, Timestamp, UserId};
use crate::ports::{
    AuditAction, AuditEntry, AuditLog, CancelOutcome, GrantOutcome, PaymentStore, PlanCatalog,
    StatusUpdate, SubscriptionLedger,
};

/// Command to process one delivered notification.
#[derive(Debug, Clone)]
pub struct ProcessNotificationCommand {
    /// Exact raw payload bytes as received; never re-serialized before
    /// signature verification.
    pub payload: Vec<u8>,
    /// Value of the signature header, if present.
    pub signature: Option<String>,
    /// Source address for audit entries.
    pub source_ip: Option<String>,
}

/// Outcome of notification processing.
///
/// Everything except the `Err` side of the handler maps to HTTP 200.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessNotificationResult {
    /// Verified payment produced a new subscription.
    SubscriptionGranted {
        subscription_id: SubscriptionId,
        user_id: UserId,
    },
    /// Duplicate delivery; the existing subscription stands, nothing
    /// was written.
    AlreadyGranted { subscription_id: SubscriptionId },
    /// Verified failure notification closed the attempt.
    PaymentMarkedFailed,
    /// Verified refund deactivated the subscription.
    SubscriptionCanceled { subscription_id: SubscriptionId },
    /// Refund for a token that never granted access; recorded no-op.
    RefundIgnored,
    /// Claimed amount contradicted the catalog; no grant, audited.
    FraudRejected,
    /// Status update contradicted the payment state machine; audited.
    AnomalyRecorded,
    /// Payload fields failed validation; absorbed.
    Invalid,
    /// Unrecognized notification kind; acknowledged untouched.
    Ignored,
    /// Internal failure absorbed; the processor may redeliver later and
    /// the idempotent grant will reconcile.
    Acknowledged,
}

/// Handler for processing payment processor notifications.
pub struct ProcessNotificationHandler {
    verifier: NotificationVerifier,
    catalog: Arc<dyn PlanCatalog>,
    fraud_guard: FraudGuard,
    payments: Arc<dyn PaymentStore>,
    ledger: Arc<dyn SubscriptionLedger>,
    audit: Arc<dyn AuditLog>,
}

impl ProcessNotificationHandler {
    pub fn new(
        verifier: NotificationVerifier,
        catalog: Arc<dyn PlanCatalog>,
        payments: Arc<dyn PaymentStore>,
        ledger: Arc<dyn SubscriptionLedger>,
        audit: Arc<dyn AuditLog>,
    ) -> Self {
        let fraud_guard = FraudGuard::new(catalog.clone());
        Self {
            verifier,
            catalog,
            fraud_guard,
            payments,
            ledger,
            audit,
        }
    }

    /// Processes one notification delivery.
    ///
    /// # Errors
    ///
    /// `NotificationError` only - signature/timestamp/payload
    /// authentication failures, before any state is read or written.
    pub async fn handle(
        &self,
        cmd: ProcessNotificationCommand,
    ) -> Result<ProcessNotificationResult, NotificationError> {
        // 1. Authenticate. Nothing below runs without a valid signature.
        let signature = cmd
            .signature
            .as_deref()
            .ok_or(NotificationError::MissingSignature)?;
        let notification = self.verifier.verify_and_parse(&cmd.payload, signature)?;

        // 2. Everything past this point is absorbed and acknowledged.
        let fields = match notification.fields() {
            Ok(fields) => fields,
            Err(e) => {
                tracing::warn!(error = %e, "notification failed field validation");
                return Ok(ProcessNotificationResult::Invalid);
            }
        };

        let source_ip = cmd.source_ip.as_deref();
        match notification.kind() {
            NotificationKind::Completed => self.handle_completed(fields, source_ip).await,
            NotificationKind::Failed => self.handle_failed(fields, source_ip).await,
            NotificationKind::Refunded => self.handle_refunded(fields, source_ip).await,
            NotificationKind::Unknown(status) => {
                tracing::debug!(status = %status, "unrecognized notification status acknowledged");
                Ok(ProcessNotificationResult::Ignored)
            }
        }
    }

    async fn handle_completed(
        &self,
        fields: NotificationFields,
        source_ip: Option<&str>,
    ) -> Result<ProcessNotificationResult, NotificationError> {
        // Fraud guard: fail closed before anything is granted.
        let verdict = match self.fraud_guard.validate(&fields.plan_id, fields.amount).await {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::error!(error = %e, token = %fields.token, "fraud validation failed");
                return Ok(ProcessNotificationResult::Acknowledged);
            }
        };

        if let Some(details) = fraud_details(&verdict, &fields) {
            let mut entry = AuditEntry::new(AuditAction::FraudDetected, details)
                .with_user(fields.user_id.clone());
            if let Some(ip) = source_ip {
                entry = entry.with_source_ip(ip);
            }
            self.audit.append(entry).await;
            tracing::warn!(token = %fields.token, plan_id = %fields.plan_id, "fraudulent amount rejected");
            return Ok(ProcessNotificationResult::FraudRejected);
        }

        // A success notification for a terminally failed or refunded
        // token is a contradictory transition, not a grant.
        match self.payments.find_by_token(&fields.token).await {
            Ok(Some(attempt)) if attempt.status.is_terminal() => {
                self.record_anomaly(
                    &fields,
                    PaymentStatus::Completed,
                    Some(attempt.status),
                    source_ip,
                )
                .await;
                return Ok(ProcessNotificationResult::AnomalyRecorded);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, token = %fields.token, "attempt lookup failed");
                return Ok(ProcessNotificationResult::Acknowledged);
            }
        }

        // The accepted verdict proved the plan exists; read it for the
        // access duration.
        let plan = match self.catalog.get_plan(&fields.plan_id).await {
            Ok(Some(plan)) => plan,
            Ok(None) | Err(_) => {
                tracing::error!(plan_id = %fields.plan_id, "plan vanished between validation and grant");
                return Ok(ProcessNotificationResult::Acknowledged);
            }
        };

        let now = Timestamp::now();
        let expires_at = now.add_days(plan.duration_days);

        match self
            .ledger
            .grant(
                &fields.user_id,
                &fields.plan_id,
                &fields.token,
                fields.amount,
                expires_at,
            )
            .await
        {
            Ok(GrantOutcome::Granted(subscription)) => {
                let mut entry = AuditEntry::new(
                    AuditAction::SubscriptionGranted,
                    json!({
                        "subscription_id": subscription.id,
                        "plan_id": fields.plan_id,
                        "token": fields.token,
                        "amount": fields.amount,
                        "expires_at": subscription.expires_at,
                    }),
                )
                .with_user(fields.user_id.clone());
                if let Some(ip) = source_ip {
                    entry = entry.with_source_ip(ip);
                }
                self.audit.append(entry).await;

                tracing::info!(
                    user_id = %fields.user_id,
                    subscription_id = %subscription.id,
                    "subscription granted"
                );
                Ok(ProcessNotificationResult::SubscriptionGranted {
                    subscription_id: subscription.id,
                    user_id: fields.user_id,
                })
            }
            Ok(GrantOutcome::AlreadyGranted(subscription)) => {
                // Duplicate delivery: no audit entry, no writes of any
                // kind beyond returning the existing state.
                tracing::debug!(token = %fields.token, "duplicate completion notification");
                Ok(ProcessNotificationResult::AlreadyGranted {
                    subscription_id: subscription.id,
                })
            }
            Err(e) => {
                tracing::error!(error = %e, token = %fields.token, "grant failed");
                Ok(ProcessNotificationResult::Acknowledged)
            }
        }
    }

    async fn handle_failed(
        &self,
        fields: NotificationFields,
        source_ip: Option<&str>,
    ) -> Result<ProcessNotificationResult, NotificationError> {
        match self
            .payments
            .update_status(&fields.token, PaymentStatus::Failed)
            .await
        {
            Ok(StatusUpdate::Applied(_)) => {
                let mut entry = AuditEntry::new(
                    AuditAction::PaymentFailed,
                    json!({ "token": fields.token, "plan_id": fields.plan_id }),
                )
                .with_user(fields.user_id.clone());
                if let Some(ip) = source_ip {
                    entry = entry.with_source_ip(ip);
                }
                self.audit.append(entry).await;
                Ok(ProcessNotificationResult::PaymentMarkedFailed)
            }
            Ok(StatusUpdate::NoOp) => Ok(ProcessNotificationResult::Acknowledged),
            Ok(StatusUpdate::NotFound) => {
                self.record_anomaly(&fields, PaymentStatus::Failed, None, source_ip)
                    .await;
                Ok(ProcessNotificationResult::AnomalyRecorded)
            }
            Ok(StatusUpdate::Anomalous { current }) => {
                self.record_anomaly(&fields, PaymentStatus::Failed, Some(current), source_ip)
                    .await;
                Ok(ProcessNotificationResult::AnomalyRecorded)
            }
            Err(e) => {
                tracing::error!(error = %e, token = %fields.token, "failure update failed");
                Ok(ProcessNotificationResult::Acknowledged)
            }
        }
    }

    async fn handle_refunded(
        &self,
        fields: NotificationFields,
        source_ip: Option<&str>,
    ) -> Result<ProcessNotificationResult, NotificationError> {
        match self.ledger.cancel(&fields.token).await {
            Ok(CancelOutcome::Canceled(subscription)) => {
                let mut entry = AuditEntry::new(
                    AuditAction::SubscriptionCanceled,
                    json!({
                        "subscription_id": subscription.id,
                        "token": fields.token,
                    }),
                )
                .with_user(subscription.user_id.clone());
                if let Some(ip) = source_ip {
                    entry = entry.with_source_ip(ip);
                }
                self.audit.append(entry).await;

                tracing::info!(
                    subscription_id = %subscription.id,
                    "subscription canceled after refund"
                );
                Ok(ProcessNotificationResult::SubscriptionCanceled {
                    subscription_id: subscription.id,
                })
            }
            Ok(CancelOutcome::NoEffect) => {
                // Benign race or anomaly worth recording, not an error
                // the processor should see.
                let mut entry = AuditEntry::new(
                    AuditAction::RefundWithoutGrant,
                    json!({ "token": fields.token, "plan_id": fields.plan_id }),
                )
                .with_user(fields.user_id.clone());
                if let Some(ip) = source_ip {
                    entry = entry.with_source_ip(ip);
                }
                self.audit.append(entry).await;

                tracing::warn!(token = %fields.token, "refund for token that granted nothing");
                Ok(ProcessNotificationResult::RefundIgnored)
            }
            Err(e) => {
                tracing::error!(error = %e, token = %fields.token, "cancel failed");
                Ok(ProcessNotificationResult::Acknowledged)
            }
        }
    }

    async fn record_anomaly(
        &self,
        fields: &NotificationFields,
        attempted: PaymentStatus,
        current: Option<PaymentStatus>,
        source_ip: Option<&str>,
    ) {
        let current_tag = current.map(|s| s.as_str()).unwrap_or("unknown");
        let mut entry = AuditEntry::new(
            AuditAction::AnomalousTransition,
            json!({
                "token": fields.token,
                "current": current_tag,
                "attempted": attempted.as_str(),
            }),
        )
        .with_user(fields.user_id.clone());
        if let Some(ip) = source_ip {
            entry = entry.with_source_ip(ip);
        }
        self.audit.append(entry).await;

        tracing::warn!(
            token = %fields.token,
            current = current_tag,
            attempted = %attempted,
            "anomalous payment status transition rejected"
        );
    }
}

/// Audit payload for a rejected verdict; `None` when accepted.
fn fraud_details(
    verdict: &FraudVerdict,
    fields: &NotificationFields,
) -> Option<serde_json::Value> {
    match verdict {
        FraudVerdict::Accepted => None,
        FraudVerdict::UnknownPlan => Some(json!({
            "reason": "unknown_plan",
            "plan_id": fields.plan_id,
            "token": fields.token,
            "claimed": fields.amount,
        })),
        FraudVerdict::AmountMismatch { expected, claimed } => Some(json!({
            "reason": "amount_mismatch",
            "plan_id": fields.plan_id,
            "token": fields.token,
            "expected": expected,
            "claimed": claimed,
        })),
    }
}
