//! Purchase records.

use serde::{Deserialize, Serialize};

/// A subscription purchase as reported by the store billing service.
///
/// Serializes to the wire shape consumed by the host application. The
/// associated product ids are used for reconciliation against conflicting
/// vendor responses and are deliberately kept off the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    /// Opaque token identifying this purchase in the store ledger.
    pub purchase_token: String,

    /// Purchase time in epoch milliseconds.
    pub purchase_time: i64,

    /// Vendor purchase state (unspecified / purchased / pending).
    pub purchase_state: i32,

    /// Whether the purchase has been acknowledged.
    pub is_acknowledged: bool,

    /// Whether the subscription auto-renews.
    pub is_auto_renewing: bool,

    /// Store order id. Absent for pending purchases.
    pub order_id: Option<String>,

    /// Product ids covered by this purchase. Not serialized.
    #[serde(skip)]
    pub products: Vec<String>,
}

impl Purchase {
    /// Whether this purchase covers the given product id.
    pub fn covers(&self, product_id: &str) -> bool {
        self.products.iter().any(|p| p == product_id)
    }
}
