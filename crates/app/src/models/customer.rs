//! Customer model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storepulse_core::{CustomerId, ExternalId, TenantId};

/// A customer of a tenant's shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub tenant_id: TenantId,
    pub external_id: ExternalId,
    /// Empty when Shopify has no email for the customer.
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Create-or-update input keyed by `(tenant, external_id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerUpsert {
    pub external_id: ExternalId,
    pub email: String,
    pub name: Option<String>,
    /// `None` keeps the stored value on update and uses now on insert.
    pub created_at: Option<DateTime<Utc>>,
}
