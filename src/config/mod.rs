//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Configuration is loaded with the
//! `READVAULT` prefix and nested values use double underscores as
//! separators.
//!
//! # Example
//!
//! ```no_run
//! use readvault::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr());
//! ```

mod catalog;
mod content;
mod database;
mod error;
mod payment;
mod server;
mod session;

pub use catalog::CatalogConfig;
pub use content::ContentConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use server::{Environment, ServerConfig};
pub use session::SessionConfig;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration; absent selects the in-memory ledger
    pub database: Option<DatabaseConfig>,

    /// Payment processor configuration
    pub payment: PaymentConfig,

    /// Session validation configuration
    pub session: SessionConfig,

    /// Plan catalog file location
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Protected content locations
    #[serde(default)]
    pub content: ContentConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with the `READVAULT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `READVAULT__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `READVAULT__PAYMENT__WEBHOOK_SECRET=...` -> `payment.webhook_secret`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or
    /// values cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("READVAULT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }
        self.payment.validate()?;
        self.session.validate()?;
        self.catalog.validate()?;
        self.content.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn valid_config() -> AppConfig {
        AppConfig {
            server: ServerConfig::default(),
            database: None,
            payment: PaymentConfig {
                webhook_secret: SecretString::new("nsec_test".to_string()),
                checkout_base_url: "https://pay.example.com/checkout".to_string(),
            },
            session: SessionConfig {
                jwt_secret: SecretString::new("session_secret".to_string()),
            },
            catalog: CatalogConfig::default(),
            content: ContentConfig::default(),
        }
    }

    #[test]
    fn test_valid_config_passes_validation() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_database_is_optional() {
        let config = valid_config();
        assert!(config.database.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_database_fails_validation() {
        let mut config = valid_config();
        config.database = Some(DatabaseConfig {
            url: "mysql://nope".to_string(),
            max_connections: 5,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_webhook_secret_fails_validation() {
        let mut config = valid_config();
        config.payment.webhook_secret = SecretString::new(String::new());
        assert!(config.validate().is_err());
    }
}
