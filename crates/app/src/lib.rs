//! StorePulse app library.
//!
//! Syncs a Shopify store's products, customers and orders into a
//! tenant-scoped store, records storefront behaviour from webhooks, and
//! serves dashboard metrics. Exposed as a library so the CLI and the
//! integration tests drive the same code as the server.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;
