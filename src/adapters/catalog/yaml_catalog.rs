//! YAML-file-backed plan catalog.
//!
//! The catalog is external configuration: a YAML file loaded once at
//! startup and immutable afterwards. Prices live here and nowhere else;
//! the fraud guard treats this as the single source of truth.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;

use crate::domain::catalog::{Plan, PlanPublic};
use crate::domain::foundation::{DomainError, ErrorCode, PlanId};
use crate::ports::PlanCatalog;

/// Immutable in-memory catalog parsed from a YAML file.
#[derive(Debug, Clone)]
pub struct YamlPlanCatalog {
    plans: HashMap<String, Plan>,
    /// Listing order as it appears in the file.
    order: Vec<String>,
}

impl YamlPlanCatalog {
    /// Parses a catalog from YAML text.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` for unparseable YAML, duplicate plan
    /// ids, or non-positive prices/durations.
    pub fn from_yaml(yaml: &str) -> Result<Self, DomainError> {
        let plans: Vec<Plan> = serde_yaml::from_str(yaml).map_err(|e| {
            DomainError::new(
                ErrorCode::ValidationFailed,
                format!("Invalid plan catalog: {}", e),
            )
        })?;

        let mut by_id = HashMap::with_capacity(plans.len());
        let mut order = Vec::with_capacity(plans.len());
        for plan in plans {
            if plan.price <= 0 {
                return Err(DomainError::validation(
                    "price",
                    format!("plan '{}' has a non-positive price", plan.id),
                ));
            }
            if plan.duration_days <= 0 {
                return Err(DomainError::validation(
                    "duration_days",
                    format!("plan '{}' has a non-positive duration", plan.id),
                ));
            }
            let id = plan.id.as_str().to_string();
            if by_id.insert(id.clone(), plan).is_some() {
                return Err(DomainError::validation(
                    "id",
                    format!("duplicate plan id '{}'", id),
                ));
            }
            order.push(id);
        }

        Ok(Self { plans: by_id, order })
    }

    /// Loads a catalog from a file path.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            DomainError::new(
                ErrorCode::ValidationFailed,
                format!("Cannot read plan catalog {}: {}", path.display(), e),
            )
        })?;
        Self::from_yaml(&yaml)
    }

    /// Number of plans.
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

#[async_trait]
impl PlanCatalog for YamlPlanCatalog {
    async fn get_plan(&self, id: &PlanId) -> Result<Option<Plan>, DomainError> {
        Ok(self.plans.get(id.as_str()).cloned())
    }

    async fn list_public(&self) -> Result<Vec<PlanPublic>, DomainError> {
        Ok(self
            .order
            .iter()
            .filter_map(|id| self.plans.get(id))
            .map(Plan::to_public)
            .collect())
    }
}
