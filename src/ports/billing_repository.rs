//! BillingRepository port - the facade consumed by application code.
//!
//! Every operation resolves to a JSON response envelope serialized as a
//! string; failures are reported through the envelope's `responseCode`,
//! never as an error. A distribution channel without billing wires the
//! inert implementation that returns empty strings.

use async_trait::async_trait;

/// Facade over subscription billing.
#[async_trait]
pub trait BillingRepository: Send + Sync {
    /// Billing country of the customer's store account.
    async fn get_country_code(&self) -> String;

    /// Offers and pricing phases of the subscription product.
    async fn get_subscription_plans(&self) -> String;

    /// Purchase the subscription product with the given offer token.
    async fn purchase_subscription(&self, offer_token: &str) -> String;

    /// Replace an existing subscription purchase with a new offer.
    async fn upgrade_subscription(&self, offer_token: &str, old_purchase_token: &str) -> String;

    /// Acknowledge a completed purchase by token.
    async fn acknowledge(&self, purchase_token: &str) -> String;

    /// All current subscription purchases.
    async fn query_purchases(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time check that the facade stays object-safe
    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn BillingRepository) {}
}
