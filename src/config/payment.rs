//! Payment configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Payment processor configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Shared secret for notification signature verification
    pub webhook_secret: SecretString,

    /// Base URL the checkout token is appended to when redirecting the
    /// user to the processor's payment page
    pub checkout_base_url: String,
}

impl PaymentConfig {
    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.webhook_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired(
                "PAYMENT__WEBHOOK_SECRET",
            ));
        }
        if !self.checkout_base_url.starts_with("http://")
            && !self.checkout_base_url.starts_with("https://")
        {
            return Err(ValidationError::InvalidCheckoutUrl);
        }
        Ok(())
    }
}
