//! Axum router configuration.
//!
//! # Routes
//!
//! ## Public
//! - `GET /health` - Liveness probe
//! - `GET /api/plans` - Plan catalog (public fields only)
//!
//! ## Authenticated (bearer credential)
//! - `POST /api/billing/checkout` - Start a checkout
//! - `GET /api/billing/payments/{token}` - Own payment status
//! - `GET /api/billing/subscription` - Own subscription
//!
//! ## Gated (full access pipeline)
//! - `GET /api/content/{resource_id}` - Protected resource delivery
//!
//! ## Webhook (no session; signature verified)
//! - `POST /api/webhooks/payment` - Processor notifications

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    create_checkout, fetch_resource, get_payment_status, get_subscription,
    handle_payment_notification, health, list_plans, AppState,
};

/// Billing endpoints for authenticated callers.
pub fn billing_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(create_checkout))
        .route("/payments/:token", get(get_payment_status))
        .route("/subscription", get(get_subscription))
}

/// Webhook endpoints; no session auth, verified by signature.
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/payment", post(handle_payment_notification))
}

/// Gated content endpoints.
pub fn content_routes() -> Router<AppState> {
    Router::new().route("/:resource_id", get(fetch_resource))
}

/// The complete API router, ready for `with_state(AppState)`.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/plans", get(list_plans))
        .nest("/api/billing", billing_routes())
        .nest("/api/webhooks", webhook_routes())
        .nest("/api/content", content_routes())
}
