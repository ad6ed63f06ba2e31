//! Billing domain module.
//!
//! The payment confirmation state machine: notification verification,
//! amount validation, and the payment/subscription lifecycles.
//!
//! # Module Structure
//!
//! - `verifier` - Signature verification of processor notifications
//! - `notification` - Verified notification payload model
//! - `fraud` - Claimed-amount validation against the plan catalog
//! - `payment_attempt` - PaymentAttempt entity and its status machine
//! - `subscription` - Subscription entity with lazy expiry

mod errors;
mod fraud;
mod notification;
mod payment_attempt;
mod subscription;
mod verifier;

pub use errors::{BillingError, NotificationError};
pub use fraud::{FraudGuard, FraudVerdict, AMOUNT_TOLERANCE_MINOR_UNITS};
pub use notification::{
    parse_amount_minor, NotificationFields, NotificationKind, PaymentNotification,
};
pub use payment_attempt::{PaymentAttempt, PaymentStatus};
pub use subscription::{Subscription, SubscriptionStatus};
pub use verifier::{NotificationVerifier, SignatureHeader};

#[cfg(test)]
pub use verifier::compute_test_signature;
