//! Persistence for tenants, synced records, events and sync cursors.
//!
//! # Tables
//!
//! - `tenants` - One row per shop domain
//! - `customers`, `products`, `orders` - Unique per `(tenant_id, external_id)`
//! - `events` - Append-only webhook events (JSONB payload)
//! - `sync_cursors` - Last committed page of an unfinished ingestion run
//!
//! # Backends
//!
//! [`PgStore`] is the production store. [`MemoryStore`] keeps everything in
//! process for tests and `APP_STORE=memory` local runs.
//!
//! # Migrations
//!
//! Migrations live in `crates/app/migrations/` and run via:
//! ```bash
//! cargo run -p storepulse-cli -- migrate
//! ```

mod memory;
mod postgres;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use storepulse_core::{Email, ExternalId, TenantContext};
use thiserror::Error;

use crate::config::StoreBackend;
use crate::models::{
    Customer, CustomerUpsert, Event, NewEvent, Order, OrderUpsert, Product, ProductUpsert,
    SyncCursor, SyncResource,
};

pub use memory::{MemoryStore, StoreSnapshot};
pub use postgres::{MIGRATOR, PgStore};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., missing referenced row).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Tenant-scoped persistence used by ingestion and webhooks.
///
/// Upserts are keyed by `(tenant, external_id)`: writing the same external id
/// again updates mutable fields and keeps the local id and relationships.
#[async_trait]
pub trait Store: Send + Sync {
    /// Get the tenant for `shop`, registering it on first sight.
    async fn register_tenant(&self, shop: &str) -> Result<TenantContext, RepositoryError>;

    async fn upsert_customer(
        &self,
        tenant: &TenantContext,
        input: &CustomerUpsert,
    ) -> Result<Customer, RepositoryError>;

    async fn find_customer_by_external_id(
        &self,
        tenant: &TenantContext,
        external_id: &ExternalId,
    ) -> Result<Option<Customer>, RepositoryError>;

    /// First customer of the tenant with exactly this email.
    async fn find_customer_by_email(
        &self,
        tenant: &TenantContext,
        email: &Email,
    ) -> Result<Option<Customer>, RepositoryError>;

    async fn upsert_product(
        &self,
        tenant: &TenantContext,
        input: &ProductUpsert,
    ) -> Result<Product, RepositoryError>;

    async fn upsert_order(
        &self,
        tenant: &TenantContext,
        input: &OrderUpsert,
    ) -> Result<Order, RepositoryError>;

    async fn insert_event(
        &self,
        tenant: &TenantContext,
        event: &NewEvent,
    ) -> Result<Event, RepositoryError>;

    async fn load_sync_cursor(
        &self,
        tenant: &TenantContext,
        resource: SyncResource,
    ) -> Result<Option<SyncCursor>, RepositoryError>;

    async fn save_sync_cursor(
        &self,
        tenant: &TenantContext,
        resource: SyncResource,
        cursor: &str,
    ) -> Result<(), RepositoryError>;

    async fn clear_sync_cursor(
        &self,
        tenant: &TenantContext,
        resource: SyncResource,
    ) -> Result<(), RepositoryError>;

    /// Check the backend is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Open the configured store backend.
///
/// Migrations are not run here; see [`MIGRATOR`].
///
/// # Errors
///
/// Returns `sqlx::Error` if the Postgres pool cannot connect.
pub async fn open_store(backend: &StoreBackend) -> Result<Arc<dyn Store>, sqlx::Error> {
    match backend {
        StoreBackend::Postgres { database_url } => {
            let pool = create_pool(database_url).await?;
            tracing::info!("Database pool created");
            Ok(Arc::new(PgStore::new(pool)))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
