//! Billing-specific error types.
//!
//! `NotificationError` covers the authentication path of inbound
//! processor notifications; every variant maps to HTTP 401 because a
//! notification that fails here must not be retried as valid.
//!
//! `BillingError` covers caller-facing billing operations.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | NotificationError (any) | 401 |
//! | UnknownPlan | 400 |
//! | NotOwner | 403 |
//! | ValidationFailed | 400 |
//! | Infrastructure | 500 |

use thiserror::Error;

use crate::domain::foundation::{ErrorCode, PlanId};

/// Errors raised while authenticating an inbound notification.
///
/// None of these variants carry or cause state changes; verification is
/// pure and runs before anything else touches the payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    /// The signature header was absent from the request.
    #[error("Missing signature header")]
    MissingSignature,

    /// Header or payload could not be parsed.
    #[error("Notification parse error: {0}")]
    ParseError(String),

    /// Signed timestamp is older than the replay window allows.
    #[error("Notification timestamp outside the allowed window")]
    TimestampOutOfRange,

    /// Signed timestamp is too far in the future.
    #[error("Notification timestamp is in the future")]
    InvalidTimestamp,

    /// Computed signature did not match the supplied one.
    #[error("Invalid notification signature")]
    InvalidSignature,
}

/// Errors raised by caller-facing billing operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingError {
    /// The requested plan does not exist in the catalog.
    UnknownPlan(PlanId),

    /// The payment token is unknown or belongs to a different user.
    /// One variant for both cases so responses cannot be used as a
    /// token-existence oracle.
    NotOwner,

    /// Request field validation failed.
    ValidationFailed { field: String, message: String },

    /// Infrastructure error.
    Infrastructure(String),
}

impl BillingError {
    pub fn unknown_plan(plan_id: PlanId) -> Self {
        BillingError::UnknownPlan(plan_id)
    }

    pub fn not_owner() -> Self {
        BillingError::NotOwner
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        BillingError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        BillingError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            BillingError::UnknownPlan(_) => ErrorCode::PlanNotFound,
            BillingError::NotOwner => ErrorCode::Forbidden,
            BillingError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            BillingError::Infrastructure(_) => ErrorCode::InternalError,
        }
    }

    /// Caller-facing message. Deliberately generic for authorization
    /// failures so the response never explains what was missing.
    pub fn message(&self) -> String {
        match self {
            BillingError::UnknownPlan(id) => format!("Unknown plan: {}", id),
            BillingError::NotOwner => "Access denied".to_string(),
            BillingError::ValidationFailed { field, message } => {
                format!("Invalid {}: {}", field, message)
            }
            BillingError::Infrastructure(_) => "Internal error".to_string(),
        }
    }
}

impl std::fmt::Display for BillingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message())
    }
}

impl std::error::Error for BillingError {}

impl From<crate::domain::foundation::DomainError> for BillingError {
    fn from(err: crate::domain::foundation::DomainError) -> Self {
        BillingError::Infrastructure(err.to_string())
    }
}
