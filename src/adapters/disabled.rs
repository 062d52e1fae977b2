//! Inert billing facade for builds without billing.

use async_trait::async_trait;

use crate::ports::BillingRepository;

/// `BillingRepository` implementation for distribution channels where
/// billing is disabled. Every operation returns an empty string.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledBillingRepository;

#[async_trait]
impl BillingRepository for DisabledBillingRepository {
    async fn get_country_code(&self) -> String {
        String::new()
    }

    async fn get_subscription_plans(&self) -> String {
        String::new()
    }

    async fn purchase_subscription(&self, _offer_token: &str) -> String {
        String::new()
    }

    async fn upgrade_subscription(&self, _offer_token: &str, _old_purchase_token: &str) -> String {
        String::new()
    }

    async fn acknowledge(&self, _purchase_token: &str) -> String {
        String::new()
    }

    async fn query_purchases(&self) -> String {
        String::new()
    }
}
