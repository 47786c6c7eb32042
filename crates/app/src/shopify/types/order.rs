//! Order nodes from the paged orders query.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storepulse_core::parse_amount;

/// An order as returned by `listOrders`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderNode {
    /// Global ID (e.g., `gid://shopify/Order/123`).
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub total_price_set: Option<MoneyBag>,
    #[serde(default)]
    pub customer: Option<OrderCustomer>,
}

/// Amounts in shop and presentment currencies; only the shop amount is read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyBag {
    pub shop_money: MoneyV2,
}

/// A decimal amount string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoneyV2 {
    #[serde(default)]
    pub amount: Option<String>,
}

/// The customer embedded in an order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCustomer {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl OrderNode {
    /// Shop-currency total, zero when missing or malformed.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        parse_amount(
            self.total_price_set
                .as_ref()
                .and_then(|bag| bag.shop_money.amount.as_deref()),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_parses_shop_money() {
        let node: OrderNode = serde_json::from_value(serde_json::json!({
            "id": "gid://shopify/Order/1",
            "createdAt": "2024-01-01T08:30:00Z",
            "totalPriceSet": { "shopMoney": { "amount": "42.50" } },
            "customer": { "id": "gid://shopify/Customer/9", "displayName": "Ada", "email": "ada@example.com" }
        }))
        .unwrap();
        assert_eq!(node.amount(), Decimal::new(4250, 2));
        assert_eq!(node.customer.unwrap().display_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_amount_missing_is_zero() {
        let node: OrderNode = serde_json::from_value(serde_json::json!({
            "id": "gid://shopify/Order/2",
            "createdAt": "2024-01-01T08:30:00Z",
            "customer": null
        }))
        .unwrap();
        assert_eq!(node.amount(), Decimal::ZERO);
        assert!(node.customer.is_none());
    }
}
