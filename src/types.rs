use serde::{Deserialize, Serialize};

/// Response body of the product search endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub searched_products: SearchedProducts,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchedProducts {
    #[serde(default)]
    pub product_details: Vec<ProductDetail>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    #[serde(default)]
    pub display_name: String,
    /// The vendor spells this key `productSKU`, not camelCase.
    #[serde(default, rename = "productSKU")]
    pub product_sku: String,
}

/// Response body of the inventory-status endpoint.
///
/// The vendor encodes booleans inconsistently: `success` is a real JSON
/// bool, but the per-entry `is_active` flag is the *string* `"true"`.
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, rename = "listMap")]
    pub list_map: Vec<InventoryEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InventoryEntry {
    #[serde(default)]
    pub is_active: String,
    #[serde(default)]
    pub product_url: String,
}

/// Outcome of one SKU resolution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkuResolution {
    Resolved(String),
    /// Well-formed response, but no product matched the tracked name.
    NotFound,
    /// Request failed (timeout, network, bad JSON).
    Failed,
}

/// Outcome of one locale's inventory probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocaleOutcome {
    Hit { product_url: String },
    Miss,
    /// 503 or timeout — retry immediately, no backoff.
    Transient,
}

/// Aggregate outcome of one polling round, drives the next delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    Found,
    Transient,
    NotFound,
}

/// One storefront to probe: inventory URL plus notification template,
/// rebuilt from the current SKU every round.
#[derive(Debug, Clone)]
pub struct LocaleTarget {
    pub locale: String,
    pub url: String,
    pub message: String,
}

/// Detection event emitted as a JSON line on stdout.
#[derive(Debug, Clone, Serialize)]
pub struct WatchEvent {
    pub timestamp: String,
    pub trigger: WatchTrigger,
    pub sku: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchTrigger {
    Available,
    SkuChanged,
}
