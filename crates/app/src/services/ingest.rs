//! Shopify → store ingestion.
//!
//! Pages are persisted one at a time. After each page that has a successor,
//! its end cursor is saved so an interrupted run resumes where it stopped;
//! a run that reaches the end clears the cursor. A saved cursor that Shopify
//! no longer accepts is dropped and the run starts over. Upserts are
//! idempotent, so re-running over already ingested pages converges on the
//! same state.

use std::pin::pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use serde::Serialize;
use storepulse_core::{ExternalId, TenantContext};
use thiserror::Error;
use tracing::instrument;

use crate::db::{RepositoryError, Store};
use crate::models::{CustomerLink, CustomerUpsert, OrderUpsert, ProductUpsert, SyncResource};
use crate::shopify::{
    AdminShopifyError, ConnectionQuery, CustomerNode, CustomersQuery, DEFAULT_COLLECT_LIMIT,
    NoFilter, OrderFilter, OrderNode, OrdersQuery, Paginator, ProductNode, ProductsQuery,
};

/// Errors that abort an ingestion run.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Fetching a page failed after retries.
    #[error(transparent)]
    Shopify(#[from] AdminShopifyError),

    /// Persisting a record or cursor failed.
    #[error(transparent)]
    Store(#[from] RepositoryError),
}

/// Upserted record counts per resource.
///
/// Only resources that were ingested are present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orders: Option<usize>,
}

impl IngestSummary {
    /// Record the count for one resource.
    pub const fn record(&mut self, resource: SyncResource, count: usize) {
        match resource {
            SyncResource::Products => self.products = Some(count),
            SyncResource::Customers => self.customers = Some(count),
            SyncResource::Orders => self.orders = Some(count),
        }
    }
}

/// Maps a product node to its upsert input.
///
/// Inventory is left untouched: the Admin query does not read it.
#[must_use]
pub fn product_upsert(node: &ProductNode) -> ProductUpsert {
    ProductUpsert {
        external_id: ExternalId::from_gid(&node.id),
        title: node.title.clone(),
        handle: node.handle.clone(),
        vendor: node.vendor.clone(),
        product_type: node.product_type.clone(),
        price: node.first_variant_price(),
        inventory: None,
        created_at: Some(node.created_at),
    }
}

#[must_use]
pub fn customer_upsert(node: &CustomerNode) -> CustomerUpsert {
    CustomerUpsert {
        external_id: ExternalId::from_gid(&node.id),
        email: node.email.clone().unwrap_or_default(),
        name: node.display_name.clone(),
        created_at: Some(node.created_at),
    }
}

/// A query whose nodes can be persisted.
#[async_trait]
trait Ingest: ConnectionQuery {
    const RESOURCE: SyncResource;

    async fn persist(
        store: &dyn Store,
        tenant: &TenantContext,
        node: Self::Node,
    ) -> Result<(), RepositoryError>;
}

#[async_trait]
impl Ingest for ProductsQuery {
    const RESOURCE: SyncResource = SyncResource::Products;

    async fn persist(
        store: &dyn Store,
        tenant: &TenantContext,
        node: ProductNode,
    ) -> Result<(), RepositoryError> {
        store.upsert_product(tenant, &product_upsert(&node)).await?;
        Ok(())
    }
}

#[async_trait]
impl Ingest for CustomersQuery {
    const RESOURCE: SyncResource = SyncResource::Customers;

    async fn persist(
        store: &dyn Store,
        tenant: &TenantContext,
        node: CustomerNode,
    ) -> Result<(), RepositoryError> {
        store.upsert_customer(tenant, &customer_upsert(&node)).await?;
        Ok(())
    }
}

#[async_trait]
impl Ingest for OrdersQuery {
    const RESOURCE: SyncResource = SyncResource::Orders;

    async fn persist(
        store: &dyn Store,
        tenant: &TenantContext,
        node: OrderNode,
    ) -> Result<(), RepositoryError> {
        let customer_id = match node.customer.as_ref() {
            Some(customer) => match customer.id.as_deref().filter(|id| !id.is_empty()) {
                Some(gid) => {
                    // createdAt is not part of the embedded customer
                    let input = CustomerUpsert {
                        external_id: ExternalId::from_gid(gid),
                        email: customer.email.clone().unwrap_or_default(),
                        name: customer.display_name.clone(),
                        created_at: None,
                    };
                    Some(store.upsert_customer(tenant, &input).await?.id)
                }
                None => None,
            },
            None => None,
        };

        let input = OrderUpsert {
            external_id: ExternalId::from_gid(&node.id),
            total_price: node.amount(),
            created_at: Some(node.created_at),
            customer: CustomerLink::Set(customer_id),
        };
        store.upsert_order(tenant, &input).await?;
        Ok(())
    }
}

/// Pulls products, customers and orders from Shopify into the [`Store`].
#[derive(Clone)]
pub struct Ingestor {
    store: Arc<dyn Store>,
    paginator: Paginator,
    limit: usize,
}

impl Ingestor {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, paginator: Paginator) -> Self {
        Self {
            store,
            paginator,
            limit: DEFAULT_COLLECT_LIMIT,
        }
    }

    /// Cap on records ingested per resource and run.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Ingest products. Returns the number of upserted products.
    ///
    /// # Errors
    ///
    /// Returns an error if a page fetch or a write fails; already committed
    /// pages stay written and the run resumes after them next time.
    pub async fn ingest_products(&self, tenant: &TenantContext) -> Result<usize, IngestError> {
        self.run::<ProductsQuery>(tenant, NoFilter {}).await
    }

    /// Ingest customers. Returns the number of upserted customers.
    ///
    /// # Errors
    ///
    /// See [`Self::ingest_products`].
    pub async fn ingest_customers(&self, tenant: &TenantContext) -> Result<usize, IngestError> {
        self.run::<CustomersQuery>(tenant, NoFilter {}).await
    }

    /// Ingest orders and the customers they reference. Returns the number of
    /// upserted orders.
    ///
    /// # Errors
    ///
    /// See [`Self::ingest_products`].
    pub async fn ingest_orders(&self, tenant: &TenantContext) -> Result<usize, IngestError> {
        self.run::<OrdersQuery>(tenant, OrderFilter::default()).await
    }

    /// Ingest one resource.
    ///
    /// # Errors
    ///
    /// See [`Self::ingest_products`].
    pub async fn ingest(
        &self,
        tenant: &TenantContext,
        resource: SyncResource,
    ) -> Result<usize, IngestError> {
        match resource {
            SyncResource::Products => self.ingest_products(tenant).await,
            SyncResource::Customers => self.ingest_customers(tenant).await,
            SyncResource::Orders => self.ingest_orders(tenant).await,
        }
    }

    /// Ingest products, then customers, then orders.
    ///
    /// # Errors
    ///
    /// Stops at the first failing resource; later ones are not attempted.
    pub async fn ingest_all(&self, tenant: &TenantContext) -> Result<IngestSummary, IngestError> {
        let mut summary = IngestSummary::default();
        for resource in SyncResource::ALL {
            let count = self.ingest(tenant, resource).await?;
            summary.record(resource, count);
        }
        Ok(summary)
    }

    #[instrument(skip(self, tenant, filter), fields(shop = %tenant.shop, resource = %Q::RESOURCE))]
    async fn run<Q: Ingest>(
        &self,
        tenant: &TenantContext,
        filter: Q::Filter,
    ) -> Result<usize, IngestError> {
        let resource = Q::RESOURCE;
        let resume = self
            .store
            .load_sync_cursor(tenant, resource)
            .await?
            .map(|saved| saved.cursor);
        let resumed = resume.is_some();
        if let Some(cursor) = resume.as_deref() {
            tracing::info!(cursor, "Resuming ingestion after saved cursor");
        }

        let mut pages_done = 0;
        let first_attempt = self
            .ingest_pages::<Q>(tenant, filter.clone(), resume, &mut pages_done)
            .await;
        let count = match first_attempt {
            // Shopify rejects an expired or foreign cursor with a GraphQL error
            Err(IngestError::Shopify(err @ AdminShopifyError::GraphQL(_)))
                if resumed && pages_done == 0 =>
            {
                tracing::warn!(error = %err, "Saved cursor rejected, restarting from the first page");
                self.store.clear_sync_cursor(tenant, resource).await?;
                self.ingest_pages::<Q>(tenant, filter, None, &mut pages_done)
                    .await?
            }
            result => result?,
        };

        self.store.clear_sync_cursor(tenant, resource).await?;
        tracing::info!(count, "Ingestion complete");
        Ok(count)
    }

    /// Persist every page after `after`, counting committed pages in
    /// `pages_done`.
    async fn ingest_pages<Q: Ingest>(
        &self,
        tenant: &TenantContext,
        filter: Q::Filter,
        after: Option<String>,
        pages_done: &mut usize,
    ) -> Result<usize, IngestError> {
        let resource = Q::RESOURCE;
        let mut pages = pin!(self.paginator.pages::<Q>(filter, after, Some(self.limit)));
        let mut count = 0;
        while let Some(page) = pages.try_next().await? {
            for node in page.nodes {
                Q::persist(self.store.as_ref(), tenant, node).await?;
                count += 1;
            }
            if page.has_more
                && let Some(cursor) = page.end_cursor.as_deref()
            {
                self.store.save_sync_cursor(tenant, resource, cursor).await?;
            }
            *pages_done += 1;
        }
        Ok(count)
    }
}
