//! Billing configuration

use serde::Deserialize;

use super::error::{ConfigError, ValidationError};

/// Billing configuration
///
/// Defaults match the store integration's established behavior: the
/// `premium` subscription product, three extra attempts after a retryable
/// failure, one second between attempts.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Store product id of the subscription product
    #[serde(default = "default_product_id")]
    pub product_id: String,

    /// Extra attempts after a retryable failure
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Fixed delay between attempts, in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_product_id() -> String {
    "premium".to_string()
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            product_id: default_product_id(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl BillingConfig {
    /// Load configuration from environment variables
    ///
    /// Loads a `.env` file if present, then reads `BILLING__*` variables,
    /// e.g. `BILLING__PRODUCT_ID=premium`, `BILLING__RETRY_ATTEMPTS=3`.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("BILLING")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.product_id.trim().is_empty() {
            return Err(ValidationError::MissingRequired("BILLING__PRODUCT_ID"));
        }
        if self.retry_delay_ms == 0 {
            return Err(ValidationError::InvalidRetryDelay);
        }
        if self.retry_attempts > 10 {
            return Err(ValidationError::RetryAttemptsTooLarge);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_store_integration() {
        let config = BillingConfig::default();
        assert_eq!(config.product_id, "premium");
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.retry_delay_ms, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validation_rejects_empty_product_id() {
        let config = BillingConfig {
            product_id: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_rejects_zero_retry_delay() {
        let config = BillingConfig {
            retry_delay_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_rejects_excessive_retry_attempts() {
        let config = BillingConfig {
            retry_attempts: 11,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
