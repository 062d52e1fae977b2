//! Billing operations against the store billing client.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::billing::{
    AckEnvelope, CountryCodeEnvelope, PlansEnvelope, ProductOffer, Purchase, PurchasesEnvelope,
};
use crate::ports::{
    BillingError, ProductDetails, PurchaseFlowParams, ReplacementMode, StoreBillingClient,
    StoreStatus, SubscriptionUpdateParams,
};

use super::pending::PendingResult;

/// Executes the individual billing operations of one call scope.
///
/// Every operation is an async unit consumed by the call orchestrator: it
/// issues one or more vendor calls, translates the results into a response
/// envelope, and raises a classified [`BillingError`] on failure.
pub struct StoreBillingProvider {
    client: Arc<dyn StoreBillingClient>,
    product_id: String,
}

impl StoreBillingProvider {
    pub fn new(client: Arc<dyn StoreBillingClient>, product_id: impl Into<String>) -> Self {
        Self {
            client,
            product_id: product_id.into(),
        }
    }

    /// List the subscription product's offers and pricing phases.
    ///
    /// Succeeds with an empty product list when the catalog has nothing for
    /// the configured product id.
    pub async fn subscription_plans(&self) -> Result<Value, BillingError> {
        debug!("listing subscription plans");

        let products = self.product_details().await?;
        let offers: Vec<ProductOffer> = products.into_iter().map(ProductOffer::from).collect();
        envelope(PlansEnvelope::ok(offers))
    }

    /// Billing country of the customer's store account.
    pub async fn country_code(&self) -> Result<Value, BillingError> {
        debug!("querying billing country code");

        let (resolver, pending) = PendingResult::channel();
        self.client
            .query_billing_config(Box::new(move |response, billing_config| {
                if response.is_ok() {
                    let country_code = billing_config
                        .map(|config| config.country_code)
                        .unwrap_or_default();
                    resolver.resolve(Ok(country_code));
                } else {
                    resolver.resolve(Err(BillingError::store(response)));
                }
            }));
        let country_code = pending.wait().await?;

        envelope(CountryCodeEnvelope::ok(country_code))
    }

    /// Purchase the subscription product, or replace an existing purchase
    /// when an old purchase token is supplied.
    pub async fn purchase(
        &self,
        offer_token: &str,
        old_purchase_token: Option<&str>,
    ) -> Result<Value, BillingError> {
        debug!(upgrade = old_purchase_token.is_some(), "purchasing subscription");

        if offer_token.trim().is_empty() {
            return Err(BillingError::rejected("offer token can not be empty"));
        }

        let product = self
            .product_details()
            .await?
            .into_iter()
            .find(|details| details.product_id == self.product_id)
            .ok_or_else(|| BillingError::rejected("product details not found"))?;

        let subscription_update = old_purchase_token.map(|token| SubscriptionUpdateParams {
            old_purchase_token: token.to_string(),
            replacement_mode: ReplacementMode::WithoutProration,
        });

        // Subscribe before launching so a synchronously delivered outcome
        // is observed through the slot's replay.
        let mut updates = self.client.purchase_updates();
        let launch = self.client.launch_purchase_flow(PurchaseFlowParams {
            product,
            offer_token: offer_token.to_string(),
            subscription_update,
        });
        debug!(status = ?launch.status, "purchase flow launch finished");

        match launch.status {
            StoreStatus::ItemAlreadyOwned => {
                warn!("attempting to purchase an already owned product");
                let purchases = self.current_purchases().await?;
                if purchases.iter().any(|p| p.covers(&self.product_id)) {
                    return Err(BillingError::store(launch));
                }
                // The store's cache disagrees with the ledger; retry once
                // the state has settled.
                return Err(BillingError::store_retryable(launch));
            }
            StoreStatus::ItemNotOwned => {
                warn!("attempting to replace a product that is not owned");
                let purchases = self.current_purchases().await?;
                if purchases.iter().all(|p| !p.covers(&self.product_id)) {
                    return Err(BillingError::store(launch));
                }
                return Err(BillingError::store_retryable(launch));
            }
            StoreStatus::Ok => {}
            _ => return Err(BillingError::store(launch)),
        }

        let update = match updates.wait_for(|update| update.is_some()).await {
            Ok(value) => value.as_ref().cloned(),
            Err(_) => None,
        };
        let update = update.ok_or_else(|| BillingError::rejected("purchase failed"))?;
        debug!(status = ?update.response.status, "purchase update received");

        if !update.response.is_ok() {
            return Err(BillingError::store(update.response));
        }
        envelope(PurchasesEnvelope::ok(update.purchases.unwrap_or_default()))
    }

    /// Acknowledge a purchase by token.
    pub async fn acknowledge(&self, purchase_token: &str) -> Result<Value, BillingError> {
        debug!("acknowledging purchase");

        if purchase_token.trim().is_empty() {
            return Err(BillingError::rejected("purchase token can not be empty"));
        }

        let response = self.client.acknowledge_purchase(purchase_token).await;
        debug!(status = ?response.status, "acknowledge finished");

        match response.status {
            StoreStatus::ItemNotOwned => {
                warn!("attempting to acknowledge a product that is not owned");
                let purchases = self.current_purchases().await?;
                if purchases.iter().all(|p| !p.covers(&self.product_id)) {
                    Err(BillingError::store(response))
                } else {
                    Err(BillingError::store_retryable(response))
                }
            }
            // Acknowledging an already acknowledged purchase is a success.
            StoreStatus::Ok | StoreStatus::ItemAlreadyOwned => envelope(AckEnvelope::ok()),
            _ => Err(BillingError::store(response)),
        }
    }

    /// All current subscription purchases.
    pub async fn purchases(&self) -> Result<Value, BillingError> {
        debug!("listing current purchases");

        let purchases = self.current_purchases().await?;
        envelope(PurchasesEnvelope::ok(purchases))
    }

    async fn product_details(&self) -> Result<Vec<ProductDetails>, BillingError> {
        let (response, details) = self.client.query_product_details(&self.product_id).await;
        debug!(status = ?response.status, products = details.len(), "product details query finished");

        if !response.is_ok() {
            return Err(BillingError::store(response));
        }
        Ok(details)
    }

    async fn current_purchases(&self) -> Result<Vec<Purchase>, BillingError> {
        let (response, purchases) = self.client.query_purchases().await;
        debug!(status = ?response.status, purchases = purchases.len(), "purchase query finished");

        if !response.is_ok() {
            return Err(BillingError::store(response));
        }
        Ok(purchases)
    }
}

fn envelope<T: Serialize>(payload: T) -> Result<Value, BillingError> {
    serde_json::to_value(payload)
        .map_err(|err| BillingError::rejected(format!("failed to encode billing response: {err}")))
}

#[cfg(test)]
mod tests {
    use super::super::mock_store_client::MockStoreClient;
    use super::*;
    use crate::domain::billing::ErrorCode;
    use crate::ports::{PurchaseUpdate, StoreResponse};

    fn provider(client: &Arc<MockStoreClient>) -> StoreBillingProvider {
        StoreBillingProvider::new(client.clone(), "premium")
    }

    #[tokio::test]
    async fn blank_offer_token_is_rejected_before_any_vendor_call() {
        let client = Arc::new(MockStoreClient::new());
        let err = provider(&client).purchase("  ", None).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::BillingError);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_product_details_is_fatal() {
        let client = Arc::new(MockStoreClient::new());
        let err = provider(&client).purchase("offer", None).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::BillingError);
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn purchase_translates_the_update_into_an_envelope() {
        let client = Arc::new(MockStoreClient::new());
        client.set_products(vec![MockStoreClient::subscription_product("premium")]);
        client.complete_purchase_on_launch(PurchaseUpdate {
            response: StoreResponse::ok(),
            purchases: Some(vec![MockStoreClient::subscription_purchase("premium", "tok-1")]),
        });

        let value = provider(&client).purchase("offer", None).await.unwrap();
        assert_eq!(value["responseCode"], 0);
        assert_eq!(value["purchases"][0]["purchaseToken"], "tok-1");
    }

    #[tokio::test]
    async fn canceled_purchase_dialog_surfaces_as_user_cancel() {
        let client = Arc::new(MockStoreClient::new());
        client.set_products(vec![MockStoreClient::subscription_product("premium")]);
        client.complete_purchase_on_launch(PurchaseUpdate {
            response: StoreStatus::UserCanceled.into(),
            purchases: None,
        });

        let err = provider(&client).purchase("offer", None).await.unwrap_err();
        assert!(err.is_canceled());
    }

    #[tokio::test]
    async fn vendor_that_never_reports_an_outcome_is_a_purchase_failure() {
        let client = Arc::new(MockStoreClient::new());
        client.set_products(vec![MockStoreClient::subscription_product("premium")]);
        client.drop_purchase_updates();

        let err = provider(&client).purchase("offer", None).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::BillingError);
        assert_eq!(err.to_string(), "purchase failed");
    }

    #[tokio::test]
    async fn acknowledge_of_already_acknowledged_purchase_succeeds() {
        let client = Arc::new(MockStoreClient::new());
        client.script_acknowledge(&[StoreStatus::ItemAlreadyOwned]);

        let value = provider(&client).acknowledge("tok-1").await.unwrap();
        assert_eq!(value["responseCode"], 0);
        assert!(value.get("purchases").is_none());
    }

    #[tokio::test]
    async fn blank_acknowledge_token_is_rejected_locally() {
        let client = Arc::new(MockStoreClient::new());
        let err = provider(&client).acknowledge("").await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::BillingError);
        assert!(client.calls().is_empty());
    }
}
