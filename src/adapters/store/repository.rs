//! Store-backed billing facade.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::config::BillingConfig;
use crate::domain::billing::{error_envelope, ErrorCode};
use crate::ports::{BillingError, BillingRepository, StoreClientFactory};

use super::connection::BillingSession;
use super::orchestrator::{orchestrate, RetryPolicy};
use super::provider::StoreBillingProvider;

/// `BillingRepository` implementation over the store billing service.
///
/// Each facade call creates its own vendor client and session through the
/// factory, runs the operation under the call orchestrator, closes the
/// session, and serializes the resulting envelope. Independent calls never
/// share a session.
pub struct StoreBillingRepository {
    factory: Arc<dyn StoreClientFactory>,
    config: BillingConfig,
    cancel: CancellationToken,
}

impl StoreBillingRepository {
    pub fn new(factory: Arc<dyn StoreClientFactory>, config: BillingConfig) -> Self {
        Self {
            factory,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Attach the calling flow's cancellation token.
    ///
    /// A triggered token resolves every in-flight operation to the
    /// canceled envelope, the same as a dismissed billing dialog.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    async fn with_provider<F>(&self, op: F) -> String
    where
        F: Fn(Arc<StoreBillingProvider>) -> BoxFuture<'static, Result<Value, BillingError>>,
    {
        let client = self.factory.create();
        let session = BillingSession::new(Arc::clone(&client));
        let provider = Arc::new(StoreBillingProvider::new(
            client,
            self.config.product_id.clone(),
        ));
        let policy = RetryPolicy {
            attempts: self.config.retry_attempts,
            delay: Duration::from_millis(self.config.retry_delay_ms),
        };

        let envelope = orchestrate(&session, &self.cancel, &policy, || {
            op(Arc::clone(&provider))
        })
        .await;
        session.close();

        envelope.to_string()
    }
}

/// Reject a blank required token before a vendor session is created.
fn require_token(token: &str) -> Result<(), String> {
    if token.trim().is_empty() {
        Err(error_envelope(ErrorCode::BillingError).to_string())
    } else {
        Ok(())
    }
}

#[async_trait]
impl BillingRepository for StoreBillingRepository {
    async fn get_country_code(&self) -> String {
        self.with_provider(|bp| async move { bp.country_code().await }.boxed())
            .await
    }

    async fn get_subscription_plans(&self) -> String {
        self.with_provider(|bp| async move { bp.subscription_plans().await }.boxed())
            .await
    }

    async fn purchase_subscription(&self, offer_token: &str) -> String {
        if let Err(envelope) = require_token(offer_token) {
            return envelope;
        }
        let offer_token = offer_token.to_string();
        self.with_provider(move |bp| {
            let offer_token = offer_token.clone();
            async move { bp.purchase(&offer_token, None).await }.boxed()
        })
        .await
    }

    async fn upgrade_subscription(&self, offer_token: &str, old_purchase_token: &str) -> String {
        if let Err(envelope) = require_token(offer_token) {
            return envelope;
        }
        let offer_token = offer_token.to_string();
        let old_purchase_token = old_purchase_token.to_string();
        self.with_provider(move |bp| {
            let offer_token = offer_token.clone();
            let old_purchase_token = old_purchase_token.clone();
            async move { bp.purchase(&offer_token, Some(&old_purchase_token)).await }.boxed()
        })
        .await
    }

    async fn acknowledge(&self, purchase_token: &str) -> String {
        if let Err(envelope) = require_token(purchase_token) {
            return envelope;
        }
        let purchase_token = purchase_token.to_string();
        self.with_provider(move |bp| {
            let purchase_token = purchase_token.clone();
            async move { bp.acknowledge(&purchase_token).await }.boxed()
        })
        .await
    }

    async fn query_purchases(&self) -> String {
        self.with_provider(|bp| async move { bp.purchases().await }.boxed())
            .await
    }
}
