//! Resumable ingestion cursors.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storepulse_core::TenantId;

/// Connection an ingestion run walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncResource {
    Products,
    Customers,
    Orders,
}

impl SyncResource {
    /// Ingestion order used by a full sync.
    pub const ALL: [Self; 3] = [Self::Products, Self::Customers, Self::Orders];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Customers => "customers",
            Self::Orders => "orders",
        }
    }
}

impl fmt::Display for SyncResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized resource name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sync resource: {0}")]
pub struct UnknownSyncResource(pub String);

impl FromStr for SyncResource {
    type Err = UnknownSyncResource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownSyncResource(s.to_string()))
    }
}

/// Last committed page cursor of an unfinished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCursor {
    pub tenant_id: TenantId,
    pub resource: SyncResource,
    pub cursor: String,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_names_round_trip() {
        for resource in SyncResource::ALL {
            assert_eq!(resource.as_str().parse::<SyncResource>().unwrap(), resource);
        }
        assert!("variants".parse::<SyncResource>().is_err());
    }
}
