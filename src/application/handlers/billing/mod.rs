//! Billing use cases.

mod create_checkout;
mod get_payment_status;
mod get_subscription;
mod list_plans;
mod process_notification;

pub use create_checkout::{CreateCheckoutCommand, CreateCheckoutHandler, CreateCheckoutResult};
pub use get_payment_status::{
    GetPaymentStatusHandler, GetPaymentStatusQuery, PaymentStatusView,
};
pub use get_subscription::{GetSubscriptionHandler, GetSubscriptionQuery, SubscriptionView};
pub use list_plans::{ListPlansHandler, ListPlansQuery};
pub use process_notification::{
    ProcessNotificationCommand, ProcessNotificationHandler, ProcessNotificationResult,
};
