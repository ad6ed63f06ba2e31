//! Session validation configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Session resolver configuration (HS256 bearer tokens)
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Secret the identity provider signs session tokens with
    pub jwt_secret: SecretString,
}

impl SessionConfig {
    /// Validate session configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.jwt_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("SESSION__JWT_SECRET"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_requires_secret() {
        let config = SessionConfig {
            jwt_secret: SecretString::new(String::new()),
        };
        assert!(config.validate().is_err());

        let config = SessionConfig {
            jwt_secret: SecretString::new("session_secret".to_string()),
        };
        assert!(config.validate().is_ok());
    }
}
