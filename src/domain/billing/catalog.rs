//! Subscription catalog wire types.
//!
//! The store catalog is flattened into products, subscription offers and
//! pricing phases before being handed to application code.

use serde::{Deserialize, Serialize};

/// A subscription product with its purchasable offers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductOffer {
    /// Store product id.
    pub product_id: String,

    /// Display name.
    pub name: String,

    /// Purchasable offers for this product.
    pub offers: Vec<SubscriptionOffer>,
}

/// One purchasable offer of a subscription product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionOffer {
    /// Base plan this offer belongs to.
    pub base_plan_id: String,

    /// Offer id within the base plan. Absent for the base plan itself.
    pub offer_id: Option<String>,

    /// Opaque token selecting this offer when launching a purchase.
    pub offer_token: String,

    /// Pricing phases in the order they apply.
    pub pricing_phases: Vec<PricingPhase>,
}

/// A single pricing phase of a subscription offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingPhase {
    /// Number of billing cycles this phase lasts; 0 for infinite recurrence.
    pub billing_cycle_count: i32,

    /// ISO 8601 billing period, e.g. `P1M`.
    pub billing_period: String,

    /// Price formatted for display. The wire key spelling is established
    /// in the host application and must be kept as is.
    #[serde(rename = "formatedPrice")]
    pub formatted_price: String,

    /// Vendor recurrence mode.
    pub recurrence_mode: i32,
}
