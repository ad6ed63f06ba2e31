//! Subscription plan definitions.
//!
//! Plans are immutable once loaded. Prices are integer minor currency
//! units (cents); the fraud tolerance in billing assumes this.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::PlanId;

/// An immutable subscription plan from the external catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Catalog identifier (e.g. "starter").
    pub id: PlanId,

    /// Display name.
    pub name: String,

    /// Price in minor currency units.
    pub price: i64,

    /// ISO 4217 currency code.
    pub currency: String,

    /// Length of the access period granted by one payment.
    pub duration_days: i64,

    /// Maximum articles accessible during the period.
    pub article_limit: u32,

    /// Marketing feature bullets.
    #[serde(default)]
    pub features: Vec<String>,
}

impl Plan {
    /// Public projection exposed by the plan listing endpoint.
    ///
    /// Internal fields (article_limit and anything used by fraud
    /// validation thresholds) are never included.
    pub fn to_public(&self) -> PlanPublic {
        PlanPublic {
            id: self.id.clone(),
            name: self.name.clone(),
            price: self.price,
            currency: self.currency.clone(),
            features: self.features.clone(),
            duration_days: self.duration_days,
        }
    }
}

/// Caller-visible view of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanPublic {
    pub id: PlanId,
    pub name: String,
    pub price: i64,
    pub currency: String,
    pub features: Vec<String>,
    pub duration_days: i64,
}
