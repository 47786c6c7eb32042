//! Customer nodes from the paged customers query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A customer as returned by `listCustomers`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerNode {
    /// Global ID (e.g., `gid://shopify/Customer/123`).
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}
