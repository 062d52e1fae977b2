//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between the
//! billing domain and the outside world. Adapters implement these ports.
//!
//! - `BillingRepository` - facade consumed by application code
//! - `StoreBillingClient` - capability interface over the vendor billing
//!   service, together with its status taxonomy and `BillingError`

mod billing_repository;
mod store_billing;

pub use billing_repository::BillingRepository;
pub use store_billing::{
    BillingConfigCallback, BillingError, ConnectionListener, ProductDetails, PurchaseFlowParams,
    PurchaseUpdate, ReplacementMode, StoreBillingClient, StoreBillingConfig, StoreClientFactory,
    StoreResponse, StoreStatus, SubscriptionOfferDetails, SubscriptionUpdateParams,
};
