//! ListPlansHandler - Query handler for the public plan catalog.

use std::sync::Arc;

use crate::domain::billing::BillingError;
use crate::domain::catalog::PlanPublic;
use crate::ports::PlanCatalog;

/// Query for the public plan listing.
#[derive(Debug, Clone, Default)]
pub struct ListPlansQuery {}

/// Handler for listing plans.
pub struct ListPlansHandler {
    catalog: Arc<dyn PlanCatalog>,
}

impl ListPlansHandler {
    pub fn new(catalog: Arc<dyn PlanCatalog>) -> Self {
        Self { catalog }
    }

    pub async fn handle(&self, _query: ListPlansQuery) -> Result<Vec<PlanPublic>, BillingError> {
        self.catalog
            .list_public()
            .await
            .map_err(|e| BillingError::infrastructure(e.to_string()))
    }
}
