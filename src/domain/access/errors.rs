//! Access pipeline error types.
//!
//! Each gate stage fails with its own kind so failures log distinctly,
//! while caller-facing messages stay generic: a response must never
//! reveal information a later stage would have protected.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | AuthenticationRequired | 401 |
//! | SubscriptionRequired | 403 |
//! | UnknownResource | 404 |
//! | Infrastructure | 500 |

use crate::domain::foundation::ErrorCode;

/// Failure of one stage of the access gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// No resolvable session credential (stage 1).
    AuthenticationRequired,

    /// Authenticated but no active subscription (stage 2).
    SubscriptionRequired,

    /// Resource identifier absent from the registry (stage 3).
    UnknownResource,

    /// A collaborator failed; access denied, not granted.
    Infrastructure(String),
}

impl AccessError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            AccessError::AuthenticationRequired => ErrorCode::Unauthorized,
            AccessError::SubscriptionRequired => ErrorCode::Forbidden,
            AccessError::UnknownResource => ErrorCode::ResourceNotFound,
            AccessError::Infrastructure(_) => ErrorCode::InternalError,
        }
    }

    /// Caller-facing message. Authorization refusals never explain why.
    pub fn message(&self) -> &'static str {
        match self {
            AccessError::AuthenticationRequired => "Authentication is required",
            AccessError::SubscriptionRequired => "Access denied",
            AccessError::UnknownResource => "Not found",
            AccessError::Infrastructure(_) => "Internal error",
        }
    }
}

impl std::fmt::Display for AccessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message())
    }
}

impl std::error::Error for AccessError {}

impl From<crate::domain::foundation::DomainError> for AccessError {
    fn from(err: crate::domain::foundation::DomainError) -> Self {
        AccessError::Infrastructure(err.to_string())
    }
}
