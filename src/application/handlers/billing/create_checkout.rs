//! CreateCheckoutHandler - Command handler for checkout initiation.
//!
//! The caller supplies a plan id and nothing else; the amount always
//! comes from the catalog. Vendor-specific checkout-session calls are
//! external glue; this handler records the pending attempt and builds
//! the redirect target from configuration.

use std::sync::Arc;

use serde_json::json;

use crate::domain::billing::BillingError;
use crate::domain::catalog::PlanPublic;
use crate::domain::foundation::{PaymentToken, PlanId, UserId};
use crate::ports::{AuditAction, AuditEntry, AuditLog, PaymentStore, PlanCatalog};

/// Command to start a checkout.
#[derive(Debug, Clone)]
pub struct CreateCheckoutCommand {
    pub user_id: UserId,
    /// Plan id as supplied by the caller; validated here.
    pub plan_id: String,
    pub source_ip: Option<String>,
}

/// Result of checkout initiation.
#[derive(Debug, Clone)]
pub struct CreateCheckoutResult {
    pub checkout_token: PaymentToken,
    pub checkout_url: String,
    pub plan: PlanPublic,
}

/// Handler for creating checkouts.
pub struct CreateCheckoutHandler {
    catalog: Arc<dyn PlanCatalog>,
    payments: Arc<dyn PaymentStore>,
    audit: Arc<dyn AuditLog>,
    checkout_base_url: String,
}

impl CreateCheckoutHandler {
    pub fn new(
        catalog: Arc<dyn PlanCatalog>,
        payments: Arc<dyn PaymentStore>,
        audit: Arc<dyn AuditLog>,
        checkout_base_url: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            payments,
            audit,
            checkout_base_url: checkout_base_url.into(),
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateCheckoutCommand,
    ) -> Result<CreateCheckoutResult, BillingError> {
        let plan_id = PlanId::new(&cmd.plan_id)
            .map_err(|e| BillingError::validation("plan_id", e.to_string()))?;

        let plan = self
            .catalog
            .get_plan(&plan_id)
            .await
            .map_err(|e| BillingError::infrastructure(e.to_string()))?
            .ok_or_else(|| BillingError::unknown_plan(plan_id.clone()))?;

        let token = PaymentToken::generate();
        self.payments
            .create(&cmd.user_id, &plan_id, &token, plan.price)
            .await
            .map_err(|e| BillingError::infrastructure(e.to_string()))?;

        let checkout_url = format!(
            "{}/{}",
            self.checkout_base_url.trim_end_matches('/'),
            token
        );

        let mut entry = AuditEntry::new(
            AuditAction::CheckoutInitiated,
            json!({
                "plan_id": plan_id,
                "token": token,
                "amount": plan.price,
            }),
        )
        .with_user(cmd.user_id.clone());
        if let Some(ip) = cmd.source_ip.as_deref() {
            entry = entry.with_source_ip(ip);
        }
        self.audit.append(entry).await;

        tracing::info!(user_id = %cmd.user_id, plan_id = %plan_id, token = %token, "checkout initiated");

        Ok(CreateCheckoutResult {
            checkout_token: token,
            checkout_url,
            plan: plan.to_public(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::{InMemoryAuditLog, InMemoryLedger};
    use crate::domain::billing::PaymentStatus;
    use crate::domain::catalog::Plan;
    use crate::domain::foundation::DomainError;
    use async_trait::async_trait;

    struct FixedCatalog {
        plans: Vec<Plan>,
    }

    #[async_trait]
    impl PlanCatalog for FixedCatalog {
        async fn get_plan(&self, id: &PlanId) -> Result<Option<Plan>, DomainError> {
            Ok(self.plans.iter().find(|p| &p.id == id).cloned())
        }

        async fn list_public(&self) -> Result<Vec<PlanPublic>, DomainError> {
            Ok(self.plans.iter().map(Plan::to_public).collect())
        }
    }

    fn starter() -> Plan {
        Plan {
            id: PlanId::new("starter").unwrap(),
            name: "Starter".to_string(),
            price: 9800,
            currency: "USD".to_string(),
            duration_days: 30,
            article_limit: 50,
            features: vec![],
        }
    }

    fn handler(ledger: &InMemoryLedger, audit: &InMemoryAuditLog) -> CreateCheckoutHandler {
        CreateCheckoutHandler::new(
            Arc::new(FixedCatalog {
                plans: vec![starter()],
            }),
            Arc::new(ledger.clone()),
            Arc::new(audit.clone()),
            "https://pay.example.com/checkout/",
        )
    }

    fn command(plan_id: &str) -> CreateCheckoutCommand {
        CreateCheckoutCommand {
            user_id: UserId::new("u1").unwrap(),
            plan_id: plan_id.to_string(),
            source_ip: Some("203.0.113.9".to_string()),
        }
    }

    #[tokio::test]
    async fn checkout_creates_pending_attempt_with_catalog_price() {
        let ledger = InMemoryLedger::new();
        let audit = InMemoryAuditLog::new();

        let result = handler(&ledger, &audit).handle(command("starter")).await.unwrap();

        assert_eq!(result.plan.price, 9800);
        assert!(result
            .checkout_url
            .starts_with("https://pay.example.com/checkout/tok_"));

        let attempt = crate::ports::PaymentStore::find_by_token(&ledger, &result.checkout_token)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(attempt.status, PaymentStatus::Pending);
        assert_eq!(attempt.amount, 9800);
    }

    #[tokio::test]
    async fn checkout_audits_initiation() {
        let ledger = InMemoryLedger::new();
        let audit = InMemoryAuditLog::new();

        handler(&ledger, &audit).handle(command("starter")).await.unwrap();

        let entries = audit.entries_with_action(AuditAction::CheckoutInitiated).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].details["amount"], 9800);
        assert_eq!(entries[0].source_ip.as_deref(), Some("203.0.113.9"));
    }

    #[tokio::test]
    async fn unknown_plan_is_rejected() {
        let ledger = InMemoryLedger::new();
        let audit = InMemoryAuditLog::new();

        let result = handler(&ledger, &audit).handle(command("ghost")).await;

        assert!(matches!(result, Err(BillingError::UnknownPlan(_))));
        assert!(audit.entries().await.is_empty());
    }

    #[tokio::test]
    async fn empty_plan_id_is_a_validation_failure() {
        let ledger = InMemoryLedger::new();
        let audit = InMemoryAuditLog::new();

        let result = handler(&ledger, &audit).handle(command("")).await;

        assert!(matches!(result, Err(BillingError::ValidationFailed { .. })));
    }
}
