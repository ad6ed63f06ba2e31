//! Protected content configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Location of protected resources and their registry
#[derive(Debug, Clone, Deserialize)]
pub struct ContentConfig {
    /// Base directory resource locators resolve under
    #[serde(default = "default_resource_dir")]
    pub resource_dir: PathBuf,

    /// Path to the YAML resource registry
    #[serde(default = "default_registry_path")]
    pub registry_path: PathBuf,
}

impl ContentConfig {
    /// Validate content configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.resource_dir.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("CONTENT__RESOURCE_DIR"));
        }
        if self.registry_path.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("CONTENT__REGISTRY_PATH"));
        }
        Ok(())
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            resource_dir: default_resource_dir(),
            registry_path: default_registry_path(),
        }
    }
}

fn default_resource_dir() -> PathBuf {
    PathBuf::from("content")
}

fn default_registry_path() -> PathBuf {
    PathBuf::from("config/resources.yaml")
}
