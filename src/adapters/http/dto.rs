//! Request and response DTOs for the HTTP API.
//!
//! Wire shapes are kept separate from domain types so the API contract
//! can evolve independently of internal representations.

use serde::{Deserialize, Serialize};

use crate::application::handlers::billing::{PaymentStatusView, SubscriptionView};
use crate::domain::catalog::PlanPublic;

// ════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════

/// POST /api/billing/checkout request body.
///
/// Deliberately carries only the plan id; amounts always come from the
/// catalog.
#[derive(Debug, Deserialize)]
pub struct CreateCheckoutRequest {
    pub plan_id: String,
}

// ════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════

/// Public plan representation.
#[derive(Debug, Serialize)]
pub struct PlanDto {
    pub id: String,
    pub name: String,
    pub price: i64,
    pub currency: String,
    pub features: Vec<String>,
    pub duration_days: i64,
}

impl From<PlanPublic> for PlanDto {
    fn from(plan: PlanPublic) -> Self {
        Self {
            id: plan.id.as_str().to_string(),
            name: plan.name,
            price: plan.price,
            currency: plan.currency,
            features: plan.features,
            duration_days: plan.duration_days,
        }
    }
}

/// GET /api/plans response.
#[derive(Debug, Serialize)]
pub struct PlanListResponse {
    pub plans: Vec<PlanDto>,
}

/// POST /api/billing/checkout response.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub checkout_token: String,
    pub checkout_url: String,
    pub plan: PlanDto,
}

/// GET /api/billing/payments/{token} response.
#[derive(Debug, Serialize)]
pub struct PaymentStatusResponse {
    pub status: String,
    pub amount: i64,
    pub plan_id: String,
}

impl From<PaymentStatusView> for PaymentStatusResponse {
    fn from(view: PaymentStatusView) -> Self {
        Self {
            status: view.status.as_str().to_string(),
            amount: view.amount,
            plan_id: view.plan_id.as_str().to_string(),
        }
    }
}

/// Subscription details inside `SubscriptionResponse`.
#[derive(Debug, Serialize)]
pub struct SubscriptionDto {
    pub id: String,
    pub plan_id: String,
    pub expires_at: String,
    pub created_at: String,
}

impl From<SubscriptionView> for SubscriptionDto {
    fn from(view: SubscriptionView) -> Self {
        Self {
            id: view.id.to_string(),
            plan_id: view.plan_id.as_str().to_string(),
            expires_at: view.expires_at.to_string(),
            created_at: view.created_at.to_string(),
        }
    }
}

/// GET /api/billing/subscription response.
#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub subscription: Option<SubscriptionDto>,
}

/// GET /health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Error response body for all failure statuses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::PlanId;

    #[test]
    fn plan_dto_flattens_public_view() {
        let dto = PlanDto::from(PlanPublic {
            id: PlanId::new("starter").unwrap(),
            name: "Starter".to_string(),
            price: 9800,
            currency: "USD".to_string(),
            features: vec!["x".to_string()],
            duration_days: 30,
        });

        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["id"], "starter");
        assert_eq!(json["price"], 9800);
        assert!(json.get("article_limit").is_none());
    }

    #[test]
    fn checkout_request_deserializes() {
        let req: CreateCheckoutRequest =
            serde_json::from_str(r#"{"plan_id": "starter"}"#).unwrap();
        assert_eq!(req.plan_id, "starter");
    }

    #[test]
    fn error_response_shape() {
        let err = ErrorResponse::new("FORBIDDEN", "Access denied");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["error"], "FORBIDDEN");
        assert_eq!(json["message"], "Access denied");
    }
}
