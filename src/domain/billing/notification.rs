//! Payment processor notification payloads.
//!
//! Defines the abstract notification contract: any processor event must
//! carry a status, a correlation token, the paying user, the plan, and
//! the claimed amount. Vendor-specific extras are ignored.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PaymentToken, PlanId, UserId, ValidationError};

/// A payment notification as delivered by the external processor.
///
/// Deserialized only after the raw payload's signature has been
/// verified. Fields stay as wire strings here; [`PaymentNotification::fields`]
/// converts them into domain values.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentNotification {
    /// Event status/action reported by the processor.
    pub status: String,

    /// Payment/transaction identifier correlating with a checkout.
    pub token: String,

    /// The paying user.
    #[serde(rename = "userId")]
    pub user_id: String,

    /// The plan the user paid for.
    #[serde(rename = "planId")]
    pub plan_id: String,

    /// Claimed amount as a decimal string (e.g. "98.00").
    pub amount: String,
}

/// Typed, validated view of a notification's correlation fields.
#[derive(Debug, Clone)]
pub struct NotificationFields {
    pub token: PaymentToken,
    pub user_id: UserId,
    pub plan_id: PlanId,
    /// Claimed amount in minor currency units.
    pub amount: i64,
}

impl PaymentNotification {
    /// Parses the status string into an exhaustive event kind.
    pub fn kind(&self) -> NotificationKind {
        NotificationKind::from_status(&self.status)
    }

    /// Validates and converts the wire fields into domain values.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for empty identifiers or an amount that
    /// is not a non-negative decimal number.
    pub fn fields(&self) -> Result<NotificationFields, ValidationError> {
        Ok(NotificationFields {
            token: PaymentToken::new(&self.token)?,
            user_id: UserId::new(&self.user_id)?,
            plan_id: PlanId::new(&self.plan_id)?,
            amount: parse_amount_minor(&self.amount)?,
        })
    }
}

/// Known notification kinds, dispatched exhaustively.
///
/// An unrecognized status is carried in `Unknown` and acknowledged
/// without processing; it is never a silent default case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationKind {
    /// Payment completed; triggers the grant path.
    Completed,
    /// Payment failed at the processor.
    Failed,
    /// Previously completed payment was refunded.
    Refunded,
    /// Status not in the contract; acknowledged and ignored.
    Unknown(String),
}

impl NotificationKind {
    /// Parses the processor's status string.
    pub fn from_status(s: &str) -> Self {
        match s {
            "success" | "completed" => Self::Completed,
            "failed" | "failure" => Self::Failed,
            "refunded" | "refund" => Self::Refunded,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Canonical status string for logging.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
            Self::Unknown(s) => s.as_str(),
        }
    }
}

/// Converts a decimal amount string to integer minor currency units.
///
/// The processor reports amounts as decimals ("98.00"); plans store
/// integer cents. Fractions beyond two digits are rounded half-up; the
/// Fraud Guard's one-unit tolerance absorbs the residue. Negative or
/// non-numeric input is rejected.
pub fn parse_amount_minor(s: &str) -> Result<i64, ValidationError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ValidationError::empty_field("amount"));
    }

    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(ValidationError::invalid_format("amount", "no digits"));
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(ValidationError::invalid_format(
            "amount",
            "expected a non-negative decimal number",
        ));
    }

    let whole: i64 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().map_err(|_| {
            ValidationError::invalid_format("amount", "integer part out of range")
        })?
    };

    let digit = |i: usize| -> i64 {
        frac_part
            .as_bytes()
            .get(i)
            .map(|b| (b - b'0') as i64)
            .unwrap_or(0)
    };
    let cents = digit(0) * 10 + digit(1) + if digit(2) >= 5 { 1 } else { 0 };

    whole
        .checked_mul(100)
        .and_then(|w| w.checked_add(cents))
        .ok_or_else(|| ValidationError::invalid_format("amount", "amount out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn notification(status: &str) -> PaymentNotification {
        PaymentNotification {
            status: status.to_string(),
            token: "tok_1".to_string(),
            user_id: "u1".to_string(),
            plan_id: "starter".to_string(),
            amount: "98.00".to_string(),
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Deserialization Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn deserialize_wire_payload() {
        let json = r#"{
            "status": "success",
            "token": "tok_1",
            "userId": "u1",
            "planId": "starter",
            "amount": "98.00"
        }"#;

        let n: PaymentNotification = serde_json::from_str(json).unwrap();

        assert_eq!(n.status, "success");
        assert_eq!(n.token, "tok_1");
        assert_eq!(n.user_id, "u1");
        assert_eq!(n.plan_id, "starter");
        assert_eq!(n.amount, "98.00");
    }

    #[test]
    fn deserialize_rejects_missing_token() {
        let json = r#"{"status": "success", "userId": "u1", "planId": "starter", "amount": "1.00"}"#;
        let result: Result<PaymentNotification, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    // ══════════════════════════════════════════════════════════════
    // Kind Dispatch Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn success_and_completed_map_to_completed() {
        assert_eq!(
            NotificationKind::from_status("success"),
            NotificationKind::Completed
        );
        assert_eq!(
            NotificationKind::from_status("completed"),
            NotificationKind::Completed
        );
    }

    #[test]
    fn failure_statuses_map_to_failed() {
        assert_eq!(
            NotificationKind::from_status("failed"),
            NotificationKind::Failed
        );
        assert_eq!(
            NotificationKind::from_status("failure"),
            NotificationKind::Failed
        );
    }

    #[test]
    fn refund_statuses_map_to_refunded() {
        assert_eq!(
            NotificationKind::from_status("refunded"),
            NotificationKind::Refunded
        );
        assert_eq!(
            NotificationKind::from_status("refund"),
            NotificationKind::Refunded
        );
    }

    #[test]
    fn unrecognized_status_is_carried_not_dropped() {
        let kind = NotificationKind::from_status("chargeback.opened");
        assert_eq!(kind, NotificationKind::Unknown("chargeback.opened".to_string()));
        assert_eq!(kind.as_str(), "chargeback.opened");
    }

    // ══════════════════════════════════════════════════════════════
    // Field Validation Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn fields_convert_to_domain_values() {
        let fields = notification("success").fields().unwrap();
        assert_eq!(fields.token.as_str(), "tok_1");
        assert_eq!(fields.user_id.as_str(), "u1");
        assert_eq!(fields.plan_id.as_str(), "starter");
        assert_eq!(fields.amount, 9800);
    }

    #[test]
    fn fields_reject_empty_token() {
        let mut n = notification("success");
        n.token = String::new();
        assert!(n.fields().is_err());
    }

    #[test]
    fn fields_reject_garbage_amount() {
        let mut n = notification("success");
        n.amount = "ninety-eight".to_string();
        assert!(n.fields().is_err());
    }

    // ══════════════════════════════════════════════════════════════
    // Amount Parsing Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn parses_whole_amounts() {
        assert_eq!(parse_amount_minor("98").unwrap(), 9800);
        assert_eq!(parse_amount_minor("0").unwrap(), 0);
    }

    #[test]
    fn parses_one_and_two_decimal_places() {
        assert_eq!(parse_amount_minor("98.0").unwrap(), 9800);
        assert_eq!(parse_amount_minor("98.00").unwrap(), 9800);
        assert_eq!(parse_amount_minor("98.5").unwrap(), 9850);
        assert_eq!(parse_amount_minor("1.00").unwrap(), 100);
    }

    #[test]
    fn rounds_third_decimal_half_up() {
        assert_eq!(parse_amount_minor("98.004").unwrap(), 9800);
        assert_eq!(parse_amount_minor("98.005").unwrap(), 9801);
        assert_eq!(parse_amount_minor("0.995").unwrap(), 100);
    }

    #[test]
    fn allows_bare_fraction() {
        assert_eq!(parse_amount_minor(".50").unwrap(), 50);
    }

    #[test]
    fn rejects_negative_and_malformed() {
        assert!(parse_amount_minor("-1.00").is_err());
        assert!(parse_amount_minor("").is_err());
        assert!(parse_amount_minor(".").is_err());
        assert!(parse_amount_minor("1.0.0").is_err());
        assert!(parse_amount_minor("1,00").is_err());
    }

    #[test]
    fn rejects_overflowing_amounts() {
        assert!(parse_amount_minor("99999999999999999999").is_err());
    }

    proptest! {
        #[test]
        fn formatted_cents_roundtrip(dollars in 0i64..10_000_000, cents in 0i64..100) {
            let formatted = format!("{}.{:02}", dollars, cents);
            prop_assert_eq!(parse_amount_minor(&formatted).unwrap(), dollars * 100 + cents);
        }
    }
}
