//! Store billing adapter.
//!
//! Implements the `BillingRepository` facade over a `StoreBillingClient`:
//! each facade call creates its own scoped vendor session, runs the
//! operation under the call orchestrator (idempotent connect, classified
//! bounded retry, cooperative cancellation) and resolves to a JSON envelope
//! string. The vendor's callback surface is bridged into sequential flow
//! with `PendingResult`; the out-of-band purchase outcome arrives through a
//! latest-value watch slot.

mod connection;
mod mock_store_client;
mod orchestrator;
mod pending;
mod provider;
mod repository;

pub use connection::BillingSession;
pub use mock_store_client::MockStoreClient;
pub use orchestrator::{orchestrate, RetryPolicy};
pub use pending::{PendingResult, Resolver};
pub use provider::StoreBillingProvider;
pub use repository::StoreBillingRepository;
