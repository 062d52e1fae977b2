//! Response envelopes.
//!
//! Every billing operation resolves to a JSON object carrying an integer
//! `responseCode`; `0` means success and the operation-specific payload
//! fields are present. Failures carry only the code.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{ErrorCode, ProductOffer, Purchase};

/// Envelope for the subscription plans listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlansEnvelope {
    pub response_code: i32,
    pub products: Vec<ProductOffer>,
}

impl PlansEnvelope {
    pub fn ok(products: Vec<ProductOffer>) -> Self {
        Self {
            response_code: ErrorCode::NoError.value(),
            products,
        }
    }
}

/// Envelope for the billing-country lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryCodeEnvelope {
    pub response_code: i32,
    pub country_code: String,
}

impl CountryCodeEnvelope {
    pub fn ok(country_code: String) -> Self {
        Self {
            response_code: ErrorCode::NoError.value(),
            country_code,
        }
    }
}

/// Envelope for operations that report purchases.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchasesEnvelope {
    pub response_code: i32,
    pub purchases: Vec<Purchase>,
}

impl PurchasesEnvelope {
    pub fn ok(purchases: Vec<Purchase>) -> Self {
        Self {
            response_code: ErrorCode::NoError.value(),
            purchases,
        }
    }
}

/// Envelope for purchase acknowledgement, which carries no payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AckEnvelope {
    pub response_code: i32,
}

impl AckEnvelope {
    pub fn ok() -> Self {
        Self {
            response_code: ErrorCode::NoError.value(),
        }
    }
}

/// Bare error envelope for a failed operation.
pub fn error_envelope(code: ErrorCode) -> Value {
    json!({ "responseCode": code.value() })
}
