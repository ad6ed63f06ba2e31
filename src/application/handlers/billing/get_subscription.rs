//! GetSubscriptionHandler - Query handler for the caller's subscription.

use std::sync::Arc;

use crate::domain::billing::BillingError;
use crate::domain::foundation::{PlanId, SubscriptionId, Timestamp, UserId};
use crate::ports::SubscriptionLedger;

/// Query for the caller's current subscription.
#[derive(Debug, Clone)]
pub struct GetSubscriptionQuery {
    pub user_id: UserId,
}

/// Caller-facing view of an active subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionView {
    pub id: SubscriptionId,
    pub plan_id: PlanId,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
}

/// Handler for subscription lookups.
pub struct GetSubscriptionHandler {
    ledger: Arc<dyn SubscriptionLedger>,
}

impl GetSubscriptionHandler {
    pub fn new(ledger: Arc<dyn SubscriptionLedger>) -> Self {
        Self { ledger }
    }

    /// Returns `None` when the caller has no active, unexpired
    /// subscription; the view never exposes payment tokens.
    pub async fn handle(
        &self,
        query: GetSubscriptionQuery,
    ) -> Result<Option<SubscriptionView>, BillingError> {
        let subscription = self
            .ledger
            .find_active(&query.user_id)
            .await
            .map_err(|e| BillingError::infrastructure(e.to_string()))?;

        Ok(subscription.map(|s| SubscriptionView {
            id: s.id,
            plan_id: s.plan_id,
            expires_at: s.expires_at,
            created_at: s.created_at,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryLedger;
    use crate::domain::foundation::PaymentToken;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[tokio::test]
    async fn active_subscription_is_returned_as_view() {
        let ledger = InMemoryLedger::new();
        ledger
            .grant(
                &user("u1"),
                &PlanId::new("starter").unwrap(),
                &PaymentToken::new("tok_1").unwrap(),
                9800,
                Timestamp::now().add_days(30),
            )
            .await
            .unwrap();
        let handler = GetSubscriptionHandler::new(Arc::new(ledger));

        let view = handler
            .handle(GetSubscriptionQuery { user_id: user("u1") })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(view.plan_id.as_str(), "starter");
    }

    #[tokio::test]
    async fn no_subscription_yields_none() {
        let handler = GetSubscriptionHandler::new(Arc::new(InMemoryLedger::new()));

        let view = handler
            .handle(GetSubscriptionQuery { user_id: user("u1") })
            .await
            .unwrap();

        assert!(view.is_none());
    }
}
