//! Fraud guard - Claimed-amount validation against the plan catalog.
//!
//! A notification's claimed amount must match the authoritative plan
//! price before any access is granted. The guard fails closed: an
//! unknown plan is a rejection, never a pass-through.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, PlanId};
use crate::ports::PlanCatalog;

/// Tolerance for processor rounding, in minor currency units.
///
/// The processor reports decimal amounts; converting them back to
/// integer cents can be off by at most one unit.
pub const AMOUNT_TOLERANCE_MINOR_UNITS: i64 = 1;

/// Outcome of an amount validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FraudVerdict {
    /// Claimed amount matches the plan price within tolerance.
    Accepted,
    /// The plan does not exist in the catalog (fail closed).
    UnknownPlan,
    /// Claimed amount contradicts the plan price.
    AmountMismatch {
        /// Authoritative price from the catalog.
        expected: i64,
        /// Amount the notification claimed.
        claimed: i64,
    },
}

impl FraudVerdict {
    /// Whether the payment may proceed to a grant.
    pub fn is_accepted(&self) -> bool {
        matches!(self, FraudVerdict::Accepted)
    }
}

/// Validates claimed amounts against the plan catalog.
pub struct FraudGuard {
    catalog: Arc<dyn PlanCatalog>,
}

impl FraudGuard {
    /// Creates a guard backed by the given catalog.
    pub fn new(catalog: Arc<dyn PlanCatalog>) -> Self {
        Self { catalog }
    }

    /// Validates a claimed amount for a plan.
    ///
    /// A non-Accepted verdict must never result in a grant, and the
    /// caller records it as a `fraud_detected` audit event carrying
    /// both amounts.
    ///
    /// # Errors
    ///
    /// Propagates catalog infrastructure failures; callers must treat
    /// those as a refusal to grant, not as acceptance.
    pub async fn validate(
        &self,
        plan_id: &PlanId,
        claimed_amount: i64,
    ) -> Result<FraudVerdict, DomainError> {
        let plan = match self.catalog.get_plan(plan_id).await? {
            Some(plan) => plan,
            None => return Ok(FraudVerdict::UnknownPlan),
        };

        if (claimed_amount - plan.price).abs() <= AMOUNT_TOLERANCE_MINOR_UNITS {
            Ok(FraudVerdict::Accepted)
        } else {
            Ok(FraudVerdict::AmountMismatch {
                expected: plan.price,
                claimed: claimed_amount,
            })
        }
    }
}
