//! Mock store billing client for testing.
//!
//! Provides a scriptable implementation of `StoreBillingClient` for unit
//! and integration tests. Supports:
//! - Pre-configured catalog, purchases and billing configuration
//! - Per-method status scripts (consumed front to back, `Ok` afterwards)
//! - Connection hang and disconnect simulation
//! - Purchase-update injection into the latest-value slot
//! - Call tracking

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::billing::{PricingPhase, Purchase};
use crate::ports::{
    BillingConfigCallback, ConnectionListener, ProductDetails, PurchaseFlowParams, PurchaseUpdate,
    StoreBillingClient, StoreBillingConfig, StoreResponse, StoreStatus, SubscriptionOfferDetails,
};

/// Scriptable store billing client.
///
/// # Example
///
/// ```ignore
/// let mock = MockStoreClient::new();
/// mock.set_products(vec![MockStoreClient::subscription_product("premium")]);
/// mock.script_launch(&[StoreStatus::ItemAlreadyOwned]);
///
/// let provider = StoreBillingProvider::new(mock.clone(), "premium");
/// let err = provider.purchase("offer", None).await.unwrap_err();
/// ```
pub struct MockStoreClient {
    inner: Arc<Mutex<MockState>>,
    update_rx: watch::Receiver<Option<PurchaseUpdate>>,
}

struct MockState {
    ready: bool,
    hang_connection: bool,
    connection_attempts: u32,
    end_connection_calls: u32,
    connection_script: VecDeque<StoreStatus>,
    product_details_script: VecDeque<StoreStatus>,
    billing_config_script: VecDeque<StoreStatus>,
    launch_script: VecDeque<StoreStatus>,
    acknowledge_script: VecDeque<StoreStatus>,
    query_purchases_script: VecDeque<StoreStatus>,
    products: Vec<ProductDetails>,
    country_code: String,
    purchases: Vec<Purchase>,
    complete_on_launch: Option<PurchaseUpdate>,
    listeners: Vec<Box<dyn ConnectionListener>>,
    calls: Vec<&'static str>,
    update_tx: Option<watch::Sender<Option<PurchaseUpdate>>>,
}

impl MockStoreClient {
    pub fn new() -> Self {
        let (update_tx, update_rx) = watch::channel(None);
        Self {
            inner: Arc::new(Mutex::new(MockState {
                ready: false,
                hang_connection: false,
                connection_attempts: 0,
                end_connection_calls: 0,
                connection_script: VecDeque::new(),
                product_details_script: VecDeque::new(),
                billing_config_script: VecDeque::new(),
                launch_script: VecDeque::new(),
                acknowledge_script: VecDeque::new(),
                query_purchases_script: VecDeque::new(),
                products: Vec::new(),
                country_code: String::new(),
                purchases: Vec::new(),
                complete_on_launch: None,
                listeners: Vec::new(),
                calls: Vec::new(),
                update_tx: Some(update_tx),
            })),
            update_rx,
        }
    }

    /// A subscription product with one monthly offer, for test fixtures.
    pub fn subscription_product(product_id: &str) -> ProductDetails {
        ProductDetails {
            product_id: product_id.to_string(),
            name: format!("{product_id} subscription"),
            subscription_offers: vec![SubscriptionOfferDetails {
                base_plan_id: "monthly".to_string(),
                offer_id: None,
                offer_token: "offer-token".to_string(),
                pricing_phases: vec![PricingPhase {
                    billing_cycle_count: 0,
                    billing_period: "P1M".to_string(),
                    formatted_price: "$4.99".to_string(),
                    recurrence_mode: 1,
                }],
            }],
        }
    }

    /// An acknowledged auto-renewing purchase, for test fixtures.
    pub fn subscription_purchase(product_id: &str, purchase_token: &str) -> Purchase {
        Purchase {
            purchase_token: purchase_token.to_string(),
            purchase_time: 1_700_000_000_000,
            purchase_state: 1,
            is_acknowledged: true,
            is_auto_renewing: true,
            order_id: Some(format!("order-{purchase_token}")),
            products: vec![product_id.to_string()],
        }
    }

    // Configuration

    pub fn set_products(&self, products: Vec<ProductDetails>) {
        self.inner.lock().unwrap().products = products;
    }

    pub fn set_country_code(&self, country_code: &str) {
        self.inner.lock().unwrap().country_code = country_code.to_string();
    }

    pub fn set_purchases(&self, purchases: Vec<Purchase>) {
        self.inner.lock().unwrap().purchases = purchases;
    }

    /// Queue connection setup outcomes; `Ok` once the script is exhausted.
    pub fn script_connection(&self, statuses: &[StoreStatus]) {
        self.inner
            .lock()
            .unwrap()
            .connection_script
            .extend(statuses.iter().copied());
    }

    pub fn script_product_details(&self, statuses: &[StoreStatus]) {
        self.inner
            .lock()
            .unwrap()
            .product_details_script
            .extend(statuses.iter().copied());
    }

    pub fn script_billing_config(&self, statuses: &[StoreStatus]) {
        self.inner
            .lock()
            .unwrap()
            .billing_config_script
            .extend(statuses.iter().copied());
    }

    pub fn script_launch(&self, statuses: &[StoreStatus]) {
        self.inner
            .lock()
            .unwrap()
            .launch_script
            .extend(statuses.iter().copied());
    }

    pub fn script_acknowledge(&self, statuses: &[StoreStatus]) {
        self.inner
            .lock()
            .unwrap()
            .acknowledge_script
            .extend(statuses.iter().copied());
    }

    pub fn script_query_purchases(&self, statuses: &[StoreStatus]) {
        self.inner
            .lock()
            .unwrap()
            .query_purchases_script
            .extend(statuses.iter().copied());
    }

    /// Park connection setup forever; the listener never fires.
    pub fn hang_connection(&self) {
        self.inner.lock().unwrap().hang_connection = true;
    }

    /// Deliver this update into the slot whenever a launch succeeds.
    pub fn complete_purchase_on_launch(&self, update: PurchaseUpdate) {
        self.inner.lock().unwrap().complete_on_launch = Some(update);
    }

    /// Push an update into the latest-value slot.
    pub fn emit_purchase_update(&self, update: PurchaseUpdate) {
        let state = self.inner.lock().unwrap();
        if let Some(tx) = &state.update_tx {
            let _ = tx.send(Some(update));
        }
    }

    /// Drop the vendor side of the update slot: no outcome will ever arrive.
    pub fn drop_purchase_updates(&self) {
        self.inner.lock().unwrap().update_tx = None;
    }

    /// Fire `on_disconnected` on every registered listener and drop
    /// readiness, as the vendor does when the service connection is lost.
    pub fn notify_disconnected(&self) {
        let mut state = self.inner.lock().unwrap();
        state.ready = false;
        let listeners = std::mem::take(&mut state.listeners);
        drop(state);
        for listener in &listeners {
            listener.on_disconnected();
        }
        self.inner.lock().unwrap().listeners = listeners;
    }

    // Assertions

    pub fn connection_attempts(&self) -> u32 {
        self.inner.lock().unwrap().connection_attempts
    }

    pub fn end_connection_calls(&self) -> u32 {
        self.inner.lock().unwrap().end_connection_calls
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|name| **name == method)
            .count()
    }
}

impl Default for MockStoreClient {
    fn default() -> Self {
        Self::new()
    }
}

fn next_status(script: &mut VecDeque<StoreStatus>) -> StoreStatus {
    script.pop_front().unwrap_or(StoreStatus::Ok)
}

#[async_trait]
impl StoreBillingClient for MockStoreClient {
    fn is_ready(&self) -> bool {
        self.inner.lock().unwrap().ready
    }

    fn start_connection(&self, listener: Box<dyn ConnectionListener>) {
        let mut state = self.inner.lock().unwrap();
        state.calls.push("start_connection");
        state.connection_attempts += 1;

        if state.hang_connection {
            state.listeners.push(listener);
            return;
        }

        let status = next_status(&mut state.connection_script);
        if status == StoreStatus::Ok {
            state.ready = true;
        }
        drop(state);

        listener.on_setup_finished(status.into());
        self.inner.lock().unwrap().listeners.push(listener);
    }

    fn end_connection(&self) {
        let mut state = self.inner.lock().unwrap();
        state.calls.push("end_connection");
        state.end_connection_calls += 1;
        state.ready = false;
    }

    async fn query_product_details(
        &self,
        _product_id: &str,
    ) -> (StoreResponse, Vec<ProductDetails>) {
        let mut state = self.inner.lock().unwrap();
        state.calls.push("query_product_details");

        let status = next_status(&mut state.product_details_script);
        if status == StoreStatus::Ok {
            (StoreResponse::ok(), state.products.clone())
        } else {
            (status.into(), Vec::new())
        }
    }

    fn query_billing_config(&self, on_result: BillingConfigCallback) {
        let mut state = self.inner.lock().unwrap();
        state.calls.push("query_billing_config");

        let status = next_status(&mut state.billing_config_script);
        let config = (status == StoreStatus::Ok).then(|| StoreBillingConfig {
            country_code: state.country_code.clone(),
        });
        drop(state);

        on_result(status.into(), config);
    }

    fn launch_purchase_flow(&self, _params: PurchaseFlowParams) -> StoreResponse {
        let mut state = self.inner.lock().unwrap();
        state.calls.push("launch_purchase_flow");

        let status = next_status(&mut state.launch_script);
        if status == StoreStatus::Ok {
            if let (Some(update), Some(tx)) = (state.complete_on_launch.clone(), &state.update_tx)
            {
                let _ = tx.send(Some(update));
            }
        }
        status.into()
    }

    async fn acknowledge_purchase(&self, _purchase_token: &str) -> StoreResponse {
        let mut state = self.inner.lock().unwrap();
        state.calls.push("acknowledge_purchase");

        next_status(&mut state.acknowledge_script).into()
    }

    async fn query_purchases(&self) -> (StoreResponse, Vec<Purchase>) {
        let mut state = self.inner.lock().unwrap();
        state.calls.push("query_purchases");

        let status = next_status(&mut state.query_purchases_script);
        if status == StoreStatus::Ok {
            (StoreResponse::ok(), state.purchases.clone())
        } else {
            (status.into(), Vec::new())
        }
    }

    fn purchase_updates(&self) -> watch::Receiver<Option<PurchaseUpdate>> {
        self.update_rx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripts_are_consumed_front_to_back() {
        let mock = MockStoreClient::new();
        mock.script_acknowledge(&[StoreStatus::NetworkError, StoreStatus::Ok]);

        let first = mock.acknowledge_purchase("tok").await;
        let second = mock.acknowledge_purchase("tok").await;
        let third = mock.acknowledge_purchase("tok").await;

        assert_eq!(first.status, StoreStatus::NetworkError);
        assert_eq!(second.status, StoreStatus::Ok);
        assert_eq!(third.status, StoreStatus::Ok);
        assert_eq!(mock.call_count("acknowledge_purchase"), 3);
    }

    #[tokio::test]
    async fn update_slot_replays_to_late_observers() {
        let mock = MockStoreClient::new();
        mock.emit_purchase_update(PurchaseUpdate {
            response: StoreResponse::ok(),
            purchases: None,
        });

        let mut rx = mock.purchase_updates();
        let seen = rx.wait_for(|update| update.is_some()).await.unwrap();
        assert!(seen.as_ref().unwrap().response.is_ok());
    }
}
