//! Business logic services.
//!
//! # Services
//!
//! - `ingest` - Paginated Shopify → store ingestion with resumable cursors
//! - `metrics` - Revenue, daily series and top customers for a date window
//! - `events` - Webhook payloads → append-only events
//! - `records` - Webhook payloads → customer, order and product upserts

pub mod events;
pub mod ingest;
pub mod metrics;
pub mod records;

pub use events::EventDraft;
pub use ingest::{IngestError, IngestSummary, Ingestor};
pub use metrics::{DateRange, MetricsAggregator, MetricsSummary, RangeError};
