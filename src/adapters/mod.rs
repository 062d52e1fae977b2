//! Adapters - Implementations of port interfaces.
//!
//! - `store` - the real billing facade over the vendor store billing
//!   service (connection, retry orchestration, operations, mock client)
//! - `disabled` - the inert facade for builds without billing

pub mod disabled;
#[cfg(feature = "store-billing")]
pub mod store;

pub use disabled::DisabledBillingRepository;
#[cfg(feature = "store-billing")]
pub use store::{
    BillingSession, MockStoreClient, PendingResult, Resolver, RetryPolicy, StoreBillingProvider,
    StoreBillingRepository,
};
