//! Webhook payloads (REST-style JSON, snake_case).
//!
//! Shopify payloads vary between topics and API versions, so every field is
//! optional and ids/amounts accept either strings or numbers.

use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize a JSON string or number into `Option<String>`.
///
/// `null`, booleans, arrays and objects read as `None`.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Deserialize an integer that may arrive as a string, defaulting to 0.
fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

/// A line item shared by carts, checkouts and draft orders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItemPayload {
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient_i64")]
    pub quantity: i64,
    #[serde(deserialize_with = "string_or_number")]
    pub price: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub product_id: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub variant_id: Option<String>,
    pub variant_title: Option<String>,
    pub applied_discount: Option<AppliedDiscountPayload>,
}

/// Discount applied to a draft order line item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppliedDiscountPayload {
    #[serde(deserialize_with = "string_or_number")]
    pub value: Option<String>,
}

/// Customer embedded in order, checkout and draft order payloads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookCustomerPayload {
    #[serde(deserialize_with = "string_or_number")]
    pub id: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// `carts/create` and `carts/update`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CartPayload {
    #[serde(deserialize_with = "string_or_number")]
    pub id: Option<String>,
    pub token: Option<String>,
    pub email: Option<String>,
    pub currency: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub total_price: Option<String>,
    pub updated_at: Option<String>,
    pub line_items: Vec<LineItemPayload>,
}

/// `checkouts/create`, `checkouts/update` and `checkouts/delete`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutPayload {
    #[serde(deserialize_with = "string_or_number")]
    pub id: Option<String>,
    pub token: Option<String>,
    pub email: Option<String>,
    pub currency: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub total_price: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub completed_at: Option<String>,
    pub abandoned_checkout_url: Option<String>,
    pub gateway: Option<String>,
    pub shipping_address: Option<serde_json::Value>,
    pub billing_address: Option<serde_json::Value>,
    pub payment_gateway_names: Option<serde_json::Value>,
    pub discount_codes: Option<serde_json::Value>,
    pub customer: Option<WebhookCustomerPayload>,
    pub line_items: Vec<LineItemPayload>,
}

/// `customers/create`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerPayload {
    #[serde(deserialize_with = "string_or_number")]
    pub id: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: Option<String>,
}

/// `orders/create` and `orders/updated`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderPayload {
    #[serde(deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub total_price: Option<String>,
    pub created_at: Option<String>,
    pub customer: Option<WebhookCustomerPayload>,
}

/// `products/update`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductPayload {
    #[serde(deserialize_with = "string_or_number")]
    pub id: Option<String>,
    pub title: Option<String>,
    pub handle: Option<String>,
    pub vendor: Option<String>,
    pub product_type: Option<String>,
    pub created_at: Option<String>,
    pub variants: Vec<ProductVariantPayload>,
}

/// Variant fields read from `products/update`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductVariantPayload {
    #[serde(deserialize_with = "string_or_number")]
    pub price: Option<String>,
    #[serde(deserialize_with = "lenient_i64")]
    pub inventory_quantity: i64,
}

/// `draft_orders/create`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftOrderPayload {
    #[serde(deserialize_with = "string_or_number")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub currency: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub total_price: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub subtotal_price: Option<String>,
    pub created_at: Option<String>,
    pub invoice_url: Option<String>,
    pub status: Option<String>,
    pub customer: Option<WebhookCustomerPayload>,
    pub line_items: Vec<LineItemPayload>,
}
