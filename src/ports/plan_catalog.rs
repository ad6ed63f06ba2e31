//! PlanCatalog port - Immutable plan lookup.
//!
//! The catalog's content is external configuration; this port only
//! specifies how the rest of the system reads it. The fraud guard and
//! checkout flow both resolve plans exclusively through here.

use async_trait::async_trait;

use crate::domain::catalog::{Plan, PlanPublic};
use crate::domain::foundation::{DomainError, PlanId};

/// Port for reading the plan catalog.
#[async_trait]
pub trait PlanCatalog: Send + Sync {
    /// Find a plan by id. Returns `None` for unknown plans; callers on
    /// trust-sensitive paths must fail closed on `None`.
    async fn get_plan(&self, id: &PlanId) -> Result<Option<Plan>, DomainError>;

    /// List all plans in their public projection (no internal fields).
    async fn list_public(&self) -> Result<Vec<PlanPublic>, DomainError>;
}
