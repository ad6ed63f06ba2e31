//! Local filesystem resource store.
//!
//! Reads protected resources from a base directory. Locators arrive
//! from the registry (deployment configuration), never from request
//! data, so the paths joined here are operator-controlled.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use crate::domain::access::ResourceLocator;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::ResourceStore;

/// Filesystem-backed resource store.
#[derive(Debug, Clone)]
pub struct LocalResourceStore {
    /// Base directory all locators are relative to.
    base_path: PathBuf,
}

impl LocalResourceStore {
    /// Creates a store rooted at the given directory.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

#[async_trait]
impl ResourceStore for LocalResourceStore {
    async fn read(&self, locator: &ResourceLocator) -> Result<Vec<u8>, DomainError> {
        let path = self.base_path.join(locator.as_str());
        fs::read(&path).await.map_err(|e| {
            DomainError::new(
                ErrorCode::StorageError,
                format!("Cannot read resource {}: {}", path.display(), e),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::access::ResourceRegistry;

    #[tokio::test]
    async fn reads_registered_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("guides")).unwrap();
        std::fs::write(dir.path().join("guides/intro.md"), b"# Intro").unwrap();

        let registry = ResourceRegistry::from_entries(vec![(
            "intro".to_string(),
            "guides/intro.md".to_string(),
            "text/markdown".to_string(),
        )]);
        let store = LocalResourceStore::new(dir.path());

        let locator = registry.lookup("intro").unwrap().locator.clone();
        let bytes = store.read(&locator).await.unwrap();

        assert_eq!(bytes, b"# Intro");
    }

    #[tokio::test]
    async fn missing_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ResourceRegistry::from_entries(vec![(
            "gone".to_string(),
            "missing.md".to_string(),
            "text/markdown".to_string(),
        )]);
        let store = LocalResourceStore::new(dir.path());

        let locator = registry.lookup("gone").unwrap().locator.clone();
        let result = store.read(&locator).await;

        assert!(result.is_err());
        assert_eq!(result.unwrap_err().code, ErrorCode::StorageError);
    }
}
