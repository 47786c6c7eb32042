//! Order model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storepulse_core::{CustomerId, ExternalId, OrderId, TenantId};

/// An order, optionally linked to a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub tenant_id: TenantId,
    pub external_id: ExternalId,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub customer_id: Option<CustomerId>,
}

/// What an order upsert does to the customer reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerLink {
    /// Keep the stored link (null on insert).
    Unchanged,
    /// Overwrite the link, possibly clearing it.
    Set(Option<CustomerId>),
}

/// Create-or-update input keyed by `(tenant, external_id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderUpsert {
    pub external_id: ExternalId,
    pub total_price: Decimal,
    /// `None` keeps the stored value on update and uses now on insert.
    pub created_at: Option<DateTime<Utc>>,
    pub customer: CustomerLink,
}
