//! Billing configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Values are read with the `BILLING` prefix
//! and `__` as the separator, e.g. `BILLING__PRODUCT_ID=premium`.

mod billing;
mod error;

pub use billing::BillingConfig;
pub use error::{ConfigError, ValidationError};
