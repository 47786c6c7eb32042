//! Tenant context threaded through every store operation.

use serde::{Deserialize, Serialize};

use super::id::TenantId;

/// A registered shop, resolved once per request.
///
/// Obtained from the store's get-or-register operation and passed by
/// reference to every scoped read and write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    /// Local tenant id.
    pub tenant_id: TenantId,
    /// Shop domain (e.g., `demo.myshopify.com`).
    pub shop: String,
}

impl TenantContext {
    /// Create a tenant context.
    #[must_use]
    pub fn new(tenant_id: TenantId, shop: impl Into<String>) -> Self {
        Self {
            tenant_id,
            shop: shop.into(),
        }
    }
}
