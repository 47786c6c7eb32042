//! Ingestion and counting against the configured Shopify store.
//!
//! # Usage
//!
//! ```bash
//! pulse-cli ingest orders
//! pulse-cli ingest all
//! pulse-cli count products
//! ```
//!
//! Uses the same environment as the app server (`SHOPIFY_STORE`,
//! `SHOPIFY_ADMIN_ACCESS_TOKEN`, `APP_STORE`, `APP_DATABASE_URL`, `SYNC_*`).

use storepulse_app::config::AppConfig;
use storepulse_app::db;
use storepulse_app::models::SyncResource;
use storepulse_app::services::{IngestSummary, Ingestor};
use storepulse_app::shopify::{
    AdminClient, CustomersQuery, NoFilter, OrderFilter, OrdersQuery, Paginator, ProductsQuery,
};

use super::CommandError;

/// Ingest one resource, or all of them when `resource` is `None`.
///
/// # Errors
///
/// Returns an error if configuration, the store, or Shopify fails. A
/// failed run leaves its cursor so the next run resumes.
pub async fn ingest(resource: Option<SyncResource>) -> Result<IngestSummary, CommandError> {
    let config = AppConfig::from_env()?;
    let store = db::open_store(&config.store).await?;
    let client = AdminClient::new(&config.shopify);
    let tenant = store.register_tenant(client.store()).await?;
    let ingestor = Ingestor::new(store, Paginator::new(&client, &config.sync));

    let summary = match resource {
        Some(resource) => {
            let count = ingestor.ingest(&tenant, resource).await?;
            let mut summary = IngestSummary::default();
            summary.record(resource, count);
            summary
        }
        None => ingestor.ingest_all(&tenant).await?,
    };

    tracing::info!(
        shop = %tenant.shop,
        summary = %serde_json::to_string(&summary).unwrap_or_default(),
        "Ingestion complete"
    );
    Ok(summary)
}

/// Count a resource's records in Shopify without storing them.
///
/// # Errors
///
/// Returns an error if configuration or any page fetch fails.
pub async fn count(resource: SyncResource) -> Result<usize, CommandError> {
    let config = AppConfig::from_env()?;
    let client = AdminClient::new(&config.shopify);
    let paginator = Paginator::new(&client, &config.sync);

    let total = match resource {
        SyncResource::Products => paginator.count_all::<ProductsQuery>(NoFilter {}).await?,
        SyncResource::Customers => paginator.count_all::<CustomersQuery>(NoFilter {}).await?,
        SyncResource::Orders => {
            paginator
                .count_all::<OrdersQuery>(OrderFilter::default())
                .await?
        }
    };

    tracing::info!(shop = %client.store(), resource = %resource, total, "Count complete");
    Ok(total)
}
