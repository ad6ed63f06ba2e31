//! ResourceStore port - Locator-addressed resource bytes.
//!
//! The store answers only to `ResourceLocator` values, which are minted
//! exclusively by the resource registry. No caller-controlled string
//! reaches this port.

use async_trait::async_trait;

use crate::domain::access::ResourceLocator;
use crate::domain::foundation::DomainError;

/// Port for reading protected resource content.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Read the full content behind a registry-issued locator.
    ///
    /// # Errors
    ///
    /// - `StorageError` when the underlying storage fails or the
    ///   locator points at nothing (a registry/deployment mismatch,
    ///   not a caller error)
    async fn read(&self, locator: &ResourceLocator) -> Result<Vec<u8>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn ResourceStore) {}
    }
}
