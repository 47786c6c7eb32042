//! Domain models persisted by the [`Store`](crate::db::Store).
//!
//! Each entity carries its tenant id; inputs for writes are the `*Upsert`
//! and [`NewEvent`] types.

pub mod customer;
pub mod event;
pub mod order;
pub mod product;
pub mod sync_cursor;
pub mod tenant;

pub use customer::{Customer, CustomerUpsert};
pub use event::{Event, NewEvent};
pub use order::{CustomerLink, Order, OrderUpsert};
pub use product::{Product, ProductUpsert};
pub use sync_cursor::{SyncCursor, SyncResource, UnknownSyncResource};
pub use tenant::Tenant;
