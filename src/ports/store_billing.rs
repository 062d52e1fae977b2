//! StoreBillingClient port - capability interface over the vendor billing
//! service.
//!
//! The vendor SDK exposes a mixed surface: connection setup and billing
//! configuration are callback-based, catalog and ledger queries are async,
//! and the purchase flow is launched synchronously with its outcome
//! delivered out of band through a purchase-update listener. The port keeps
//! that shape so the adapter owns all of the bridging into sequential flow.
//!
//! The port also defines the vendor status taxonomy and `BillingError`,
//! which classifies every failure as canceled, retryable or fatal and maps
//! it onto the stable [`ErrorCode`] space.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

use crate::domain::billing::{ErrorCode, PricingPhase, ProductOffer, Purchase, SubscriptionOffer};

/// Status codes of the store billing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreStatus {
    /// Call succeeded.
    Ok,
    /// User dismissed the billing dialog.
    UserCanceled,
    /// Connection to the billing service was lost.
    ServiceDisconnected,
    /// Billing service is temporarily unavailable.
    ServiceUnavailable,
    /// Billing is not available on this device or account.
    BillingUnavailable,
    /// The requested product is not available for purchase.
    ItemUnavailable,
    /// Malformed request or misconfigured integration.
    DeveloperError,
    /// Unclassified vendor-side failure.
    Error,
    /// The product is already owned.
    ItemAlreadyOwned,
    /// The product to replace is not owned.
    ItemNotOwned,
    /// Transient network failure.
    NetworkError,
    /// The requested feature is not supported by the installed store.
    FeatureNotSupported,
}

/// A vendor status paired with its debug message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreResponse {
    pub status: StoreStatus,
    pub message: String,
}

impl StoreResponse {
    pub fn new(status: StoreStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn ok() -> Self {
        Self::new(StoreStatus::Ok, "")
    }

    pub fn is_ok(&self) -> bool {
        self.status == StoreStatus::Ok
    }
}

impl From<StoreStatus> for StoreResponse {
    fn from(status: StoreStatus) -> Self {
        Self::new(status, "")
    }
}

/// Failure raised by a billing operation before envelope conversion.
///
/// Classification drives the call orchestrator: canceled failures short-
/// circuit to the canceled envelope, retryable ones are re-attempted under
/// the retry policy, everything else surfaces its code immediately.
#[derive(Debug, Clone, Error)]
pub enum BillingError {
    /// Non-success response from the store billing service. The
    /// `retryable` flag is forced by purchase reconciliation when a
    /// conflicting vendor response turned out to reflect stale state.
    #[error("store billing service responded {:?}: {}", .response.status, .response.message)]
    Store {
        response: StoreResponse,
        retryable: bool,
    },

    /// Request rejected locally: validation failure, missing product
    /// details, or a purchase flow that never produced a result.
    #[error("{0}")]
    Rejected(String),
}

impl BillingError {
    /// Vendor failure with the status-derived disposition.
    pub fn store(response: StoreResponse) -> Self {
        Self::Store {
            response,
            retryable: false,
        }
    }

    /// Vendor failure forced retryable by reconciliation.
    pub fn store_retryable(response: StoreResponse) -> Self {
        Self::Store {
            response,
            retryable: true,
        }
    }

    /// Local rejection; always fatal.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    /// Whether the user dismissed the billing dialog.
    pub fn is_canceled(&self) -> bool {
        matches!(
            self,
            Self::Store { response, .. } if response.status == StoreStatus::UserCanceled
        )
    }

    /// Whether the orchestrator may retry this failure.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store {
                response,
                retryable,
            } => {
                *retryable
                    || matches!(
                        response.status,
                        StoreStatus::ServiceDisconnected
                            | StoreStatus::ServiceUnavailable
                            | StoreStatus::NetworkError
                    )
            }
            Self::Rejected(_) => false,
        }
    }

    /// Stable code reported in the response envelope.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Rejected(_) => ErrorCode::BillingError,
            Self::Store { response, .. } => match response.status {
                StoreStatus::Ok => ErrorCode::NoError,
                StoreStatus::UserCanceled => ErrorCode::BillingCanceled,
                StoreStatus::NetworkError => ErrorCode::BillingNetworkError,
                StoreStatus::ServiceDisconnected
                | StoreStatus::ServiceUnavailable
                | StoreStatus::BillingUnavailable => ErrorCode::BillingUnavailable,
                StoreStatus::ItemAlreadyOwned => ErrorCode::SubscriptionAlreadyOwned,
                StoreStatus::ItemNotOwned | StoreStatus::ItemUnavailable => {
                    ErrorCode::SubscriptionUnavailable
                }
                StoreStatus::DeveloperError
                | StoreStatus::Error
                | StoreStatus::FeatureNotSupported => ErrorCode::BillingGooglePlayError,
            },
        }
    }
}

/// Catalog entry for a subscription product as reported by the vendor.
#[derive(Debug, Clone)]
pub struct ProductDetails {
    pub product_id: String,
    pub name: String,
    pub subscription_offers: Vec<SubscriptionOfferDetails>,
}

/// One subscription offer inside a vendor catalog entry.
#[derive(Debug, Clone)]
pub struct SubscriptionOfferDetails {
    pub base_plan_id: String,
    pub offer_id: Option<String>,
    pub offer_token: String,
    pub pricing_phases: Vec<PricingPhase>,
}

impl From<SubscriptionOfferDetails> for SubscriptionOffer {
    fn from(details: SubscriptionOfferDetails) -> Self {
        Self {
            base_plan_id: details.base_plan_id,
            offer_id: details.offer_id,
            offer_token: details.offer_token,
            pricing_phases: details.pricing_phases,
        }
    }
}

impl From<ProductDetails> for ProductOffer {
    fn from(details: ProductDetails) -> Self {
        Self {
            product_id: details.product_id,
            name: details.name,
            offers: details
                .subscription_offers
                .into_iter()
                .map(SubscriptionOffer::from)
                .collect(),
        }
    }
}

/// How an existing purchase is replaced when upgrading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementMode {
    /// The new plan takes effect immediately; the remaining balance is
    /// credited against the new plan's billing cycle.
    WithoutProration,
    /// The new plan takes effect immediately and is charged in full.
    ChargeFullPrice,
    /// The new plan takes effect when the current cycle expires.
    Deferred,
}

/// Replacement directive attached to an upgrade purchase.
#[derive(Debug, Clone)]
pub struct SubscriptionUpdateParams {
    pub old_purchase_token: String,
    pub replacement_mode: ReplacementMode,
}

/// Parameters for launching the vendor purchase flow.
#[derive(Debug, Clone)]
pub struct PurchaseFlowParams {
    pub product: ProductDetails,
    pub offer_token: String,
    pub subscription_update: Option<SubscriptionUpdateParams>,
}

/// Billing configuration of the customer's store account.
#[derive(Debug, Clone)]
pub struct StoreBillingConfig {
    pub country_code: String,
}

/// Out-of-band result of a purchase flow, pushed by the vendor listener.
///
/// Delivered through a latest-value slot: observers that subscribe after
/// emission still observe the update.
#[derive(Debug, Clone)]
pub struct PurchaseUpdate {
    pub response: StoreResponse,
    pub purchases: Option<Vec<Purchase>>,
}

/// Listener for connection lifecycle callbacks.
///
/// `on_setup_finished` fires exactly once per `start_connection` call;
/// `on_disconnected` may fire any time afterwards.
pub trait ConnectionListener: Send + Sync {
    fn on_setup_finished(&self, response: StoreResponse);
    fn on_disconnected(&self);
}

/// Callback receiving the billing configuration lookup result.
pub type BillingConfigCallback =
    Box<dyn FnOnce(StoreResponse, Option<StoreBillingConfig>) + Send>;

/// Capability interface over the vendor billing service.
#[async_trait]
pub trait StoreBillingClient: Send + Sync {
    /// Whether a usable connection is established.
    fn is_ready(&self) -> bool;

    /// Begin asynchronous connection setup.
    fn start_connection(&self, listener: Box<dyn ConnectionListener>);

    /// Tear the connection down. Safe to call when never connected.
    fn end_connection(&self);

    /// Query catalog details for a subscription product.
    async fn query_product_details(
        &self,
        product_id: &str,
    ) -> (StoreResponse, Vec<ProductDetails>);

    /// Look up the store account's billing configuration.
    fn query_billing_config(&self, on_result: BillingConfigCallback);

    /// Launch the vendor purchase UI flow. The launch response only covers
    /// flow startup; the purchase outcome arrives via `purchase_updates`.
    fn launch_purchase_flow(&self, params: PurchaseFlowParams) -> StoreResponse;

    /// Acknowledge a purchase by token.
    async fn acknowledge_purchase(&self, purchase_token: &str) -> StoreResponse;

    /// Query all current subscription purchases.
    async fn query_purchases(&self) -> (StoreResponse, Vec<Purchase>);

    /// Subscribe to the out-of-band purchase-update slot.
    fn purchase_updates(&self) -> watch::Receiver<Option<PurchaseUpdate>>;
}

/// Creates one vendor client per orchestrated call scope.
pub trait StoreClientFactory: Send + Sync {
    fn create(&self) -> Arc<dyn StoreBillingClient>;
}

impl<F> StoreClientFactory for F
where
    F: Fn() -> Arc<dyn StoreBillingClient> + Send + Sync,
{
    fn create(&self) -> Arc<dyn StoreBillingClient> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time check that the port stays object-safe
    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn StoreBillingClient) {}

    #[test]
    fn user_cancel_is_canceled_and_nothing_else_is() {
        assert!(BillingError::store(StoreStatus::UserCanceled.into()).is_canceled());
        assert!(!BillingError::store(StoreStatus::NetworkError.into()).is_canceled());
        assert!(!BillingError::rejected("bad token").is_canceled());
    }

    #[test]
    fn transient_statuses_are_retryable() {
        for status in [
            StoreStatus::ServiceDisconnected,
            StoreStatus::ServiceUnavailable,
            StoreStatus::NetworkError,
        ] {
            assert!(BillingError::store(status.into()).is_retryable(), "{status:?}");
        }
    }

    #[test]
    fn conflict_statuses_are_fatal_unless_reconciliation_forces_retry() {
        let owned = BillingError::store(StoreStatus::ItemAlreadyOwned.into());
        assert!(!owned.is_retryable());

        let stale = BillingError::store_retryable(StoreStatus::ItemAlreadyOwned.into());
        assert!(stale.is_retryable());
        assert_eq!(stale.code(), ErrorCode::SubscriptionAlreadyOwned);
    }

    #[test]
    fn rejections_are_fatal_billing_errors() {
        let err = BillingError::rejected("offer token can not be empty");
        assert!(!err.is_retryable());
        assert_eq!(err.code(), ErrorCode::BillingError);
    }

    #[test]
    fn status_to_code_mapping_is_stable() {
        let cases = [
            (StoreStatus::UserCanceled, ErrorCode::BillingCanceled),
            (StoreStatus::NetworkError, ErrorCode::BillingNetworkError),
            (StoreStatus::ServiceDisconnected, ErrorCode::BillingUnavailable),
            (StoreStatus::ServiceUnavailable, ErrorCode::BillingUnavailable),
            (StoreStatus::BillingUnavailable, ErrorCode::BillingUnavailable),
            (StoreStatus::ItemAlreadyOwned, ErrorCode::SubscriptionAlreadyOwned),
            (StoreStatus::ItemNotOwned, ErrorCode::SubscriptionUnavailable),
            (StoreStatus::ItemUnavailable, ErrorCode::SubscriptionUnavailable),
            (StoreStatus::DeveloperError, ErrorCode::BillingGooglePlayError),
            (StoreStatus::Error, ErrorCode::BillingGooglePlayError),
            (StoreStatus::FeatureNotSupported, ErrorCode::BillingGooglePlayError),
        ];
        for (status, code) in cases {
            assert_eq!(BillingError::store(status.into()).code(), code, "{status:?}");
        }
    }

    #[test]
    fn product_details_flatten_into_the_wire_shape() {
        let details = ProductDetails {
            product_id: "premium".to_string(),
            name: "Premium".to_string(),
            subscription_offers: vec![SubscriptionOfferDetails {
                base_plan_id: "monthly".to_string(),
                offer_id: Some("intro".to_string()),
                offer_token: "tok".to_string(),
                pricing_phases: vec![],
            }],
        };

        let offer = ProductOffer::from(details);
        assert_eq!(offer.product_id, "premium");
        assert_eq!(offer.offers.len(), 1);
        assert_eq!(offer.offers[0].offer_id.as_deref(), Some("intro"));
    }
}
