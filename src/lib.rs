//! Billing Bridge - Subscription billing client binding
//!
//! Wraps an external store billing service behind a small repository facade:
//! purchase and upgrade of a subscription product, purchase acknowledgement,
//! entitlement queries, catalog listing and billing-country lookup. The
//! orchestration core establishes the vendor connection lazily, retries
//! transient failures with a bounded fixed-delay policy, and converts every
//! outcome into a JSON response envelope - callers never see a raised error.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
