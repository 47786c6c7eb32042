//! Product nodes from the paged products query.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storepulse_core::parse_amount;

use super::connection::Connection;

/// A product as returned by `listProducts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductNode {
    /// Global ID (e.g., `gid://shopify/Product/123`).
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    pub created_at: DateTime<Utc>,
    /// First variant only (`variants(first: 1)`).
    #[serde(default)]
    pub variants: Connection<VariantNode>,
}

/// Variant fields needed to price a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantNode {
    #[serde(default)]
    pub price: Option<String>,
}

impl ProductNode {
    /// Price of the first variant, zero when there is none.
    #[must_use]
    pub fn first_variant_price(&self) -> Decimal {
        parse_amount(self.variants.first_node().and_then(|v| v.price.as_deref()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_first_variant_price() {
        let node: ProductNode = serde_json::from_value(serde_json::json!({
            "id": "gid://shopify/Product/1",
            "title": "Red Snowboard",
            "handle": "red-snowboard",
            "vendor": "Pulse",
            "productType": "Snowboard",
            "createdAt": "2024-03-01T12:00:00Z",
            "variants": { "edges": [{ "node": { "price": "100.00" } }] }
        }))
        .unwrap();
        assert_eq!(node.first_variant_price(), Decimal::new(10000, 2));
    }

    #[test]
    fn test_price_defaults_to_zero_without_variants() {
        let node: ProductNode = serde_json::from_value(serde_json::json!({
            "id": "gid://shopify/Product/2",
            "createdAt": "2024-03-01T12:00:00Z"
        }))
        .unwrap();
        assert_eq!(node.first_variant_price(), Decimal::ZERO);
        assert!(node.title.is_empty());
    }
}
