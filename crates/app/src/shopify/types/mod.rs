//! Domain types for Shopify Admin API responses and webhook payloads.
//!
//! GraphQL node types mirror the fields requested by the queries in
//! `admin::queries`; webhook payloads are parsed leniently so a missing field
//! falls back to its default instead of rejecting the delivery.

pub mod connection;
pub mod customer;
pub mod order;
pub mod product;
pub mod webhook;

pub use connection::{Connection, Edge, PageInfo};
pub use customer::CustomerNode;
pub use order::{MoneyBag, MoneyV2, OrderCustomer, OrderNode};
pub use product::{ProductNode, VariantNode};
pub use webhook::*;
