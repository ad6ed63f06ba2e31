//! SessionResolver port - Maps an inbound credential to a user.
//!
//! Session issuance (login) is an external concern; readvault only
//! validates the credential it is handed. A `None` resolution means the
//! request is unauthenticated, which every protected endpoint treats as
//! AuthenticationFailure.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};

/// Port for resolving an authenticated user from a bearer credential.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// Resolve the credential to a user id.
    ///
    /// Returns `Ok(None)` for absent, malformed, expired, or otherwise
    /// unacceptable credentials; `Err` is reserved for infrastructure
    /// failures of the resolver itself.
    async fn resolve(&self, credential: &str) -> Result<Option<UserId>, DomainError>;
}
