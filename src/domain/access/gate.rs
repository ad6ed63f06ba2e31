//! Access gate - Ordered authorization pipeline for protected resources.
//!
//! Every stage short-circuits with its own failure kind, and the order
//! is a hard invariant: subscription state is never consulted for an
//! unauthenticated caller, and resource existence is never evaluated
//! for a caller without an active subscription. An earlier failure must
//! not leak what a later stage would have revealed.

use std::sync::Arc;

use serde_json::json;

use super::errors::AccessError;
use super::registry::ResourceRegistry;
use crate::domain::foundation::UserId;
use crate::ports::{AuditAction, AuditEntry, AuditLog, ResourceStore, SessionResolver, SubscriptionLedger};

/// A resource cleared for delivery.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Public identifier the caller requested.
    pub resource_id: String,
    /// MIME type from the registry entry.
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// The ordered authorization pipeline.
pub struct AccessGate {
    sessions: Arc<dyn SessionResolver>,
    ledger: Arc<dyn SubscriptionLedger>,
    registry: Arc<ResourceRegistry>,
    resources: Arc<dyn ResourceStore>,
    audit: Arc<dyn AuditLog>,
}

impl AccessGate {
    pub fn new(
        sessions: Arc<dyn SessionResolver>,
        ledger: Arc<dyn SubscriptionLedger>,
        registry: Arc<ResourceRegistry>,
        resources: Arc<dyn ResourceStore>,
        audit: Arc<dyn AuditLog>,
    ) -> Self {
        Self {
            sessions,
            ledger,
            registry,
            resources,
            audit,
        }
    }

    /// Runs the full pipeline for one resource request.
    ///
    /// # Stages
    ///
    /// 1. require_session - resolve the credential to a user
    /// 2. require_active_subscription - lazy-expiry ledger read
    /// 3. require_whitelisted_resource - registry lookup only
    /// 4. deliver - read bytes, record a `resource_accessed` audit entry
    pub async fn authorize(
        &self,
        credential: Option<&str>,
        resource_id: &str,
        source_ip: Option<&str>,
    ) -> Result<Delivery, AccessError> {
        let user_id = self.require_session(credential).await?;
        self.require_active_subscription(&user_id).await?;
        let (locator, content_type) = self.require_whitelisted_resource(resource_id)?;

        let bytes = self
            .resources
            .read(&locator)
            .await
            .map_err(|e| AccessError::Infrastructure(e.to_string()))?;

        let mut entry = AuditEntry::new(
            AuditAction::ResourceAccessed,
            json!({
                "resource_id": resource_id,
                "size_bytes": bytes.len(),
            }),
        )
        .with_user(user_id.clone());
        if let Some(ip) = source_ip {
            entry = entry.with_source_ip(ip);
        }
        self.audit.append(entry).await;

        tracing::debug!(user_id = %user_id, resource_id, size = bytes.len(), "resource delivered");

        Ok(Delivery {
            resource_id: resource_id.to_string(),
            content_type,
            bytes,
        })
    }

    /// Stage 1: resolve the session credential.
    async fn require_session(&self, credential: Option<&str>) -> Result<UserId, AccessError> {
        let credential = match credential {
            Some(c) => c,
            None => {
                tracing::debug!("access refused: no session credential");
                return Err(AccessError::AuthenticationRequired);
            }
        };

        match self.sessions.resolve(credential).await {
            Ok(Some(user_id)) => Ok(user_id),
            Ok(None) => {
                tracing::debug!("access refused: unresolvable session credential");
                Err(AccessError::AuthenticationRequired)
            }
            Err(e) => {
                tracing::error!(error = %e, "session resolver failure");
                Err(AccessError::Infrastructure(e.to_string()))
            }
        }
    }

    /// Stage 2: require an active, unexpired subscription.
    async fn require_active_subscription(&self, user_id: &UserId) -> Result<(), AccessError> {
        match self.ledger.find_active(user_id).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => {
                tracing::debug!(user_id = %user_id, "access refused: no active subscription");
                Err(AccessError::SubscriptionRequired)
            }
            Err(e) => {
                tracing::error!(error = %e, "subscription lookup failure");
                Err(AccessError::Infrastructure(e.to_string()))
            }
        }
    }

    /// Stage 3: registry lookup; the only locator resolution there is.
    fn require_whitelisted_resource(
        &self,
        resource_id: &str,
    ) -> Result<(super::registry::ResourceLocator, String), AccessError> {
        match self.registry.lookup(resource_id) {
            Some(entry) => Ok((entry.locator.clone(), entry.content_type.clone())),
            None => {
                tracing::debug!(resource_id, "access refused: resource not registered");
                Err(AccessError::UnknownResource)
            }
        }
    }
}
