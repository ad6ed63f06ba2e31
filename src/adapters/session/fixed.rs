//! Fixed session resolver for tests and local development.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};
use crate::ports::SessionResolver;

/// Resolver with a fixed credential → user mapping.
///
/// Anything outside the mapping resolves to `None`.
#[derive(Debug, Clone, Default)]
pub struct FixedSessionResolver {
    sessions: HashMap<String, UserId>,
}

impl FixedSessionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an accepted credential.
    pub fn allowing(mut self, credential: impl Into<String>, user_id: UserId) -> Self {
        self.sessions.insert(credential.into(), user_id);
        self
    }
}

#[async_trait]
impl SessionResolver for FixedSessionResolver {
    async fn resolve(&self, credential: &str) -> Result<Option<UserId>, DomainError> {
        Ok(self.sessions.get(credential).cloned())
    }
}
