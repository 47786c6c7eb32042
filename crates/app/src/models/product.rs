//! Product model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storepulse_core::{ExternalId, ProductId, TenantId};

/// A product, priced from its first variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub tenant_id: TenantId,
    pub external_id: ExternalId,
    pub title: String,
    pub handle: String,
    pub vendor: Option<String>,
    pub product_type: Option<String>,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    pub inventory: i32,
    pub created_at: DateTime<Utc>,
}

/// Create-or-update input keyed by `(tenant, external_id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductUpsert {
    pub external_id: ExternalId,
    pub title: String,
    pub handle: String,
    pub vendor: Option<String>,
    pub product_type: Option<String>,
    pub price: Decimal,
    /// Only webhooks know inventory. `None` keeps the stored value on update
    /// and writes 0 on insert.
    pub inventory: Option<i32>,
    /// `None` keeps the stored value on update and uses now on insert.
    pub created_at: Option<DateTime<Utc>>,
}
