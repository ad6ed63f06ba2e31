//! Resource registry - Fixed mapping of public identifiers to locators.
//!
//! The registry is the only code permitted to turn a resource
//! identifier into a storage locator. Caller-supplied strings are used
//! solely as lookup keys, so a locator can never be assembled from
//! request data and path traversal is not a representable state.

use std::collections::HashMap;

use serde::Deserialize;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Opaque storage locator minted by the registry.
///
/// Only the registry constructs these; everything downstream treats
/// them as sealed values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceLocator(String);

impl ResourceLocator {
    pub(crate) fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    /// Returns the inner locator string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One registered resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    pub locator: ResourceLocator,
    /// MIME type sent when the resource is delivered.
    pub content_type: String,
}

/// Row shape of the registry YAML file.
#[derive(Debug, Deserialize)]
struct ResourceRow {
    id: String,
    file: String,
    #[serde(default = "default_content_type")]
    content_type: String,
}

fn default_content_type() -> String {
    "application/octet-stream".to_string()
}

/// Fixed public-id → locator registry, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    entries: HashMap<String, ResourceEntry>,
}

impl ResourceRegistry {
    /// Builds a registry from YAML rows.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` for unparseable YAML, duplicate ids,
    /// or rows with empty fields.
    pub fn from_yaml(yaml: &str) -> Result<Self, DomainError> {
        let rows: Vec<ResourceRow> = serde_yaml::from_str(yaml).map_err(|e| {
            DomainError::new(
                ErrorCode::ValidationFailed,
                format!("Invalid resource registry: {}", e),
            )
        })?;

        let mut entries = HashMap::with_capacity(rows.len());
        for row in rows {
            if row.id.is_empty() || row.file.is_empty() {
                return Err(DomainError::validation(
                    "resources",
                    "registry rows require non-empty id and file",
                ));
            }
            let previous = entries.insert(
                row.id.clone(),
                ResourceEntry {
                    locator: ResourceLocator::new(row.file),
                    content_type: row.content_type,
                },
            );
            if previous.is_some() {
                return Err(DomainError::validation(
                    "resources",
                    format!("duplicate resource id '{}'", row.id),
                ));
            }
        }

        Ok(Self { entries })
    }

    /// Builds a registry directly from entries (tests, fixtures).
    pub fn from_entries(
        entries: impl IntoIterator<Item = (String, String, String)>,
    ) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(id, file, content_type)| {
                    (
                        id,
                        ResourceEntry {
                            locator: ResourceLocator::new(file),
                            content_type,
                        },
                    )
                })
                .collect(),
        }
    }

    /// Looks up a public identifier.
    ///
    /// `None` means the identifier is not whitelisted; no locator
    /// resolution of any kind happens for it.
    pub fn lookup(&self, public_id: &str) -> Option<&ResourceEntry> {
        self.entries.get(public_id)
    }

    /// Number of registered resources.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
