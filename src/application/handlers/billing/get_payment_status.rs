//! GetPaymentStatusHandler - Query handler for a caller's own payment.
//!
//! The token must belong to the caller. Unknown tokens and tokens owned
//! by someone else both answer with the same authorization failure so
//! the endpoint cannot be used to probe token existence.

use std::sync::Arc;

use crate::domain::billing::{BillingError, PaymentStatus};
use crate::domain::foundation::{PaymentToken, PlanId, UserId};
use crate::ports::PaymentStore;

/// Query for the status of one payment attempt.
#[derive(Debug, Clone)]
pub struct GetPaymentStatusQuery {
    pub user_id: UserId,
    /// Token as supplied by the caller.
    pub token: String,
}

/// Caller-facing view of a payment attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentStatusView {
    pub status: PaymentStatus,
    pub amount: i64,
    pub plan_id: PlanId,
}

/// Handler for payment status queries.
pub struct GetPaymentStatusHandler {
    payments: Arc<dyn PaymentStore>,
}

impl GetPaymentStatusHandler {
    pub fn new(payments: Arc<dyn PaymentStore>) -> Self {
        Self { payments }
    }

    pub async fn handle(
        &self,
        query: GetPaymentStatusQuery,
    ) -> Result<PaymentStatusView, BillingError> {
        let token = PaymentToken::new(&query.token)
            .map_err(|e| BillingError::validation("token", e.to_string()))?;

        let attempt = self
            .payments
            .find_by_token(&token)
            .await
            .map_err(|e| BillingError::infrastructure(e.to_string()))?
            .ok_or_else(BillingError::not_owner)?;

        if attempt.user_id != query.user_id {
            return Err(BillingError::not_owner());
        }

        Ok(PaymentStatusView {
            status: attempt.status,
            amount: attempt.amount,
            plan_id: attempt.plan_id,
        })
    }
}
