//! Webhook event types.

use serde::{Deserialize, Serialize};

/// Kind of an append-only webhook event.
///
/// Stored as its `snake_case` name in the `events.event_type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    CartUpdated,
    CartAbandoned,
    CheckoutStarted,
    CheckoutAbandoned,
    CheckoutCompleted,
    CheckoutUpdated,
    DraftOrderCreated,
}

impl EventType {
    /// All event types, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::CartUpdated,
        Self::CartAbandoned,
        Self::CheckoutStarted,
        Self::CheckoutAbandoned,
        Self::CheckoutCompleted,
        Self::CheckoutUpdated,
        Self::DraftOrderCreated,
    ];

    /// Returns the stored name of this event type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CartUpdated => "cart_updated",
            Self::CartAbandoned => "cart_abandoned",
            Self::CheckoutStarted => "checkout_started",
            Self::CheckoutAbandoned => "checkout_abandoned",
            Self::CheckoutCompleted => "checkout_completed",
            Self::CheckoutUpdated => "checkout_updated",
            Self::DraftOrderCreated => "draft_order_created",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown event type name.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid event type: {0}")]
pub struct UnknownEventType(pub String);

impl std::str::FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownEventType(s.to_string()))
    }
}
