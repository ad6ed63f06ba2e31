//! HTTP handlers for the readvault API.
//!
//! Handlers connect axum routes to application layer command/query
//! handlers. The webhook endpoint answers 200 for every outcome except
//! signature failure; caller-facing endpoints map the error taxonomy
//! with deliberately generic messages.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{Json, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::application::handlers::access::{FetchResourceCommand, FetchResourceHandler};
use crate::application::handlers::billing::{
    CreateCheckoutCommand, CreateCheckoutHandler, GetPaymentStatusHandler,
    GetPaymentStatusQuery, GetSubscriptionHandler, GetSubscriptionQuery, ListPlansHandler,
    ListPlansQuery, ProcessNotificationCommand, ProcessNotificationHandler,
};
use crate::domain::access::{AccessError, AccessGate, ResourceRegistry};
use crate::domain::billing::{BillingError, NotificationError, NotificationVerifier};
use crate::domain::foundation::UserId;
use crate::ports::{
    AuditLog, PaymentStore, PlanCatalog, ResourceStore, SessionResolver, SubscriptionLedger,
};

use super::dto::{
    CheckoutResponse, CreateCheckoutRequest, ErrorResponse, HealthResponse, PaymentStatusResponse,
    PlanDto, PlanListResponse, SubscriptionDto, SubscriptionResponse,
};

/// Header carrying the notification signature.
pub const SIGNATURE_HEADER: &str = "Payment-Signature";

// ════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned per request; every dependency is Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn PlanCatalog>,
    pub payments: Arc<dyn PaymentStore>,
    pub ledger: Arc<dyn SubscriptionLedger>,
    pub audit: Arc<dyn AuditLog>,
    pub sessions: Arc<dyn SessionResolver>,
    pub gate: Arc<AccessGate>,
    pub verifier: NotificationVerifier,
    pub checkout_base_url: String,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalog: Arc<dyn PlanCatalog>,
        payments: Arc<dyn PaymentStore>,
        ledger: Arc<dyn SubscriptionLedger>,
        audit: Arc<dyn AuditLog>,
        sessions: Arc<dyn SessionResolver>,
        registry: Arc<ResourceRegistry>,
        resources: Arc<dyn ResourceStore>,
        verifier: NotificationVerifier,
        checkout_base_url: impl Into<String>,
    ) -> Self {
        let gate = Arc::new(AccessGate::new(
            sessions.clone(),
            ledger.clone(),
            registry,
            resources,
            audit.clone(),
        ));
        Self {
            catalog,
            payments,
            ledger,
            audit,
            sessions,
            gate,
            verifier,
            checkout_base_url: checkout_base_url.into(),
        }
    }

    /// Create handlers on demand from the shared state.
    pub fn notification_handler(&self) -> ProcessNotificationHandler {
        ProcessNotificationHandler::new(
            self.verifier.clone(),
            self.catalog.clone(),
            self.payments.clone(),
            self.ledger.clone(),
            self.audit.clone(),
        )
    }

    pub fn checkout_handler(&self) -> CreateCheckoutHandler {
        CreateCheckoutHandler::new(
            self.catalog.clone(),
            self.payments.clone(),
            self.audit.clone(),
            self.checkout_base_url.clone(),
        )
    }

    pub fn payment_status_handler(&self) -> GetPaymentStatusHandler {
        GetPaymentStatusHandler::new(self.payments.clone())
    }

    pub fn subscription_handler(&self) -> GetSubscriptionHandler {
        GetSubscriptionHandler::new(self.ledger.clone())
    }

    pub fn plans_handler(&self) -> ListPlansHandler {
        ListPlansHandler::new(self.catalog.clone())
    }

    pub fn fetch_resource_handler(&self) -> FetchResourceHandler {
        FetchResourceHandler::new(self.gate.clone())
    }
}

// ════════════════════════════════════════════════════════════════════
// Authenticated User Extraction
// ════════════════════════════════════════════════════════════════════

/// Authenticated user context extracted from the bearer credential.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

#[async_trait]
impl axum::extract::FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let credential =
            bearer_token(&parts.headers).ok_or(ApiError::AuthenticationRequired)?;

        match state.sessions.resolve(credential).await {
            Ok(Some(user_id)) => Ok(AuthenticatedUser { user_id }),
            Ok(None) => Err(ApiError::AuthenticationRequired),
            Err(e) => {
                tracing::error!(error = %e, "session resolver failure");
                Err(ApiError::Internal)
            }
        }
    }
}

/// Extracts the token from an `Authorization: Bearer ...` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Best-effort client address for audit entries.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// ════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════

/// GET /health - Liveness probe
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// GET /api/plans - Public plan listing
pub async fn list_plans(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let plans = state.plans_handler().handle(ListPlansQuery {}).await?;
    let response = PlanListResponse {
        plans: plans.into_iter().map(PlanDto::from).collect(),
    };
    Ok(Json(response))
}

/// GET /api/billing/payments/{token} - Caller's own payment status
pub async fn get_payment_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .payment_status_handler()
        .handle(GetPaymentStatusQuery {
            user_id: user.user_id,
            token,
        })
        .await?;

    Ok(Json(PaymentStatusResponse::from(view)))
}

/// GET /api/billing/subscription - Caller's current subscription
pub async fn get_subscription(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .subscription_handler()
        .handle(GetSubscriptionQuery {
            user_id: user.user_id,
        })
        .await?;

    Ok(Json(SubscriptionResponse {
        subscription: view.map(SubscriptionDto::from),
    }))
}

// ════════════════════════════════════════════════════════════════════
// Command Handlers (POST endpoints)
// ════════════════════════════════════════════════════════════════════

/// POST /api/billing/checkout - Start a checkout for a plan
pub async fn create_checkout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Json(request): Json<CreateCheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .checkout_handler()
        .handle(CreateCheckoutCommand {
            user_id: user.user_id,
            plan_id: request.plan_id,
            source_ip: client_ip(&headers),
        })
        .await?;

    let response = CheckoutResponse {
        checkout_token: result.checkout_token.as_str().to_string(),
        checkout_url: result.checkout_url,
        plan: PlanDto::from(result.plan),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/webhooks/payment - Payment processor notifications
///
/// The raw body bytes are passed through untouched; signature
/// verification happens over exactly what was received. 401 only for
/// authentication failures; every other outcome acknowledges with 200
/// so the processor's retries are never driven by business results.
pub async fn handle_payment_notification(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    state
        .notification_handler()
        .handle(ProcessNotificationCommand {
            payload: body.to_vec(),
            signature,
            source_ip: client_ip(&headers),
        })
        .await?;

    Ok(StatusCode::OK)
}

/// GET /api/content/{resource_id} - Gated resource delivery
///
/// Session resolution happens inside the access gate (stage 1), not in
/// an extractor, so the pipeline ordering is owned by one place.
pub async fn fetch_resource(
    State(state): State<AppState>,
    Path(resource_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let delivery = state
        .fetch_resource_handler()
        .handle(FetchResourceCommand {
            credential: bearer_token(&headers).map(str::to_string),
            resource_id,
            source_ip: client_ip(&headers),
        })
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, delivery.content_type),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        delivery.bytes,
    )
        .into_response())
}

// ════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════

/// API error mapping the domain taxonomy onto HTTP statuses.
#[derive(Debug)]
pub enum ApiError {
    Billing(BillingError),
    Access(AccessError),
    Notification(NotificationError),
    AuthenticationRequired,
    Internal,
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        ApiError::Billing(err)
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        ApiError::Access(err)
    }
}

impl From<NotificationError> for ApiError {
    fn from(err: NotificationError) -> Self {
        ApiError::Notification(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ApiError::Billing(err) => {
                let status = match err {
                    BillingError::UnknownPlan(_) | BillingError::ValidationFailed { .. } => {
                        StatusCode::BAD_REQUEST
                    }
                    BillingError::NotOwner => StatusCode::FORBIDDEN,
                    BillingError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.code().to_string(), err.message())
            }
            ApiError::Access(err) => {
                let status = match err {
                    AccessError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
                    AccessError::SubscriptionRequired => StatusCode::FORBIDDEN,
                    AccessError::UnknownResource => StatusCode::NOT_FOUND,
                    AccessError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.code().to_string(), err.message().to_string())
            }
            // All notification failures are authentication failures:
            // the processor must not retry them as valid.
            ApiError::Notification(_) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_SIGNATURE".to_string(),
                "Invalid notification signature".to_string(),
            ),
            ApiError::AuthenticationRequired => (
                StatusCode::UNAUTHORIZED,
                "AUTHENTICATION_REQUIRED".to_string(),
                "Authentication is required".to_string(),
            ),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR".to_string(),
                "Internal error".to_string(),
            ),
        };

        let body = ErrorResponse::new(error_code, message);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(name: &str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
            value.parse().unwrap(),
        );
        headers
    }

    // ══════════════════════════════════════════════════════════════
    // Header Parsing Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn bearer_token_extracts_credential() {
        let headers = headers_with("authorization", "Bearer abc.def.ghi");
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn bearer_token_rejects_other_schemes() {
        let headers = headers_with("authorization", "Basic dXNlcjpwYXNz");
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn bearer_token_rejects_empty_value() {
        let headers = headers_with("authorization", "Bearer ");
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn bearer_token_none_without_header() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn client_ip_takes_first_forwarded_entry() {
        let headers = headers_with("x-forwarded-for", "203.0.113.9, 10.0.0.1");
        assert_eq!(client_ip(&headers), Some("203.0.113.9".to_string()));
    }

    #[test]
    fn client_ip_none_without_header() {
        assert_eq!(client_ip(&HeaderMap::new()), None);
    }

    // ══════════════════════════════════════════════════════════════
    // Error Mapping Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn notification_errors_map_to_401() {
        let response =
            ApiError::Notification(NotificationError::InvalidSignature).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn subscription_refusal_maps_to_403() {
        let response = ApiError::Access(AccessError::SubscriptionRequired).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn unknown_resource_maps_to_404() {
        let response = ApiError::Access(AccessError::UnknownResource).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn unknown_plan_maps_to_400() {
        let err = BillingError::unknown_plan(
            crate::domain::foundation::PlanId::new("ghost").unwrap(),
        );
        let response = ApiError::Billing(err).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn foreign_token_maps_to_403() {
        let response = ApiError::Billing(BillingError::not_owner()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
