//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Configuration is loaded with the
//! `LOYALTY` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use loyalty_ledger::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod loyalty;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ConfigValidationError};
pub use loyalty::LoyaltyConfig;

use serde::Deserialize;

/// Root application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration (PostgreSQL connection).
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Loyalty policy knobs (coupon validity, retry bounds, paging caps).
    #[serde(default)]
    pub loyalty: LoyaltyConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Loads a `.env` file if present, then reads environment variables with
    /// the `LOYALTY` prefix, using `__` to separate nested values:
    ///
    /// - `LOYALTY__DATABASE__URL=postgres://...` -> `database.url`
    /// - `LOYALTY__LOYALTY__COUPON_VALIDITY_DAYS=14` ->
    ///   `loyalty.coupon_validity_days`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("LOYALTY")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Validate all configuration sections.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.database.validate()?;
        self.loyalty.validate()?;
        Ok(())
    }
}
