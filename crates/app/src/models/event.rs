//! Append-only webhook events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storepulse_core::{CustomerId, EventId, EventType, ExternalId, TenantId};

/// A stored event. Never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub tenant_id: TenantId,
    pub event_type: EventType,
    pub external_id: Option<ExternalId>,
    pub customer_email: Option<String>,
    /// Topic-specific payload, stored as-is.
    pub data: serde_json::Value,
    pub customer_id: Option<CustomerId>,
    pub created_at: DateTime<Utc>,
}

/// Input for [`Store::insert_event`](crate::db::Store::insert_event).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub event_type: EventType,
    pub external_id: Option<ExternalId>,
    pub customer_email: Option<String>,
    pub data: serde_json::Value,
    pub customer_id: Option<CustomerId>,
}
