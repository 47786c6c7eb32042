//! Tenant (one Shopify shop).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storepulse_core::{TenantContext, TenantId};

/// A registered shop. Created on first sight of its domain, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    /// Shop domain, unique across tenants.
    pub shop: String,
    /// Display name; defaults to the shop domain.
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Tenant {
    #[must_use]
    pub fn context(&self) -> TenantContext {
        TenantContext::new(self.id, self.shop.clone())
    }
}
