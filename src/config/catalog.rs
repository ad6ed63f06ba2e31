//! Plan catalog configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Location of the plan catalog file
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Path to the YAML plan catalog
    #[serde(default = "default_catalog_path")]
    pub path: PathBuf,
}

impl CatalogConfig {
    /// Validate catalog configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.path.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("CATALOG__PATH"));
        }
        Ok(())
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("config/plans.yaml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path() {
        let config = CatalogConfig::default();
        assert_eq!(config.path, PathBuf::from("config/plans.yaml"));
        assert!(config.validate().is_ok());
    }
}
