//! `PostgreSQL` store.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use storepulse_core::{
    CustomerId, Email, EventId, EventType, ExternalId, OrderId, ProductId, TenantContext,
    TenantId,
};
use tracing::instrument;

use super::{RepositoryError, Store};
use crate::models::{
    Customer, CustomerLink, CustomerUpsert, Event, NewEvent, Order, OrderUpsert, Product,
    ProductUpsert, SyncCursor, SyncResource,
};

/// Embedded migrations from `crates/app/migrations/`.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const TENANT_CACHE_CAPACITY: u64 = 1_000;
const TENANT_CACHE_TTL: Duration = Duration::from_secs(600);

// =============================================================================
// Row types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct TenantRow {
    id: TenantId,
    shop: String,
}

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: CustomerId,
    tenant_id: TenantId,
    external_id: String,
    email: String,
    name: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: row.id,
            tenant_id: row.tenant_id,
            external_id: ExternalId::new(row.external_id),
            email: row.email,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    tenant_id: TenantId,
    external_id: String,
    title: String,
    handle: String,
    vendor: Option<String>,
    product_type: Option<String>,
    price: Decimal,
    inventory: i32,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            tenant_id: row.tenant_id,
            external_id: ExternalId::new(row.external_id),
            title: row.title,
            handle: row.handle,
            vendor: row.vendor,
            product_type: row.product_type,
            price: row.price,
            inventory: row.inventory,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    tenant_id: TenantId,
    external_id: String,
    total_price: Decimal,
    created_at: DateTime<Utc>,
    customer_id: Option<CustomerId>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            tenant_id: row.tenant_id,
            external_id: ExternalId::new(row.external_id),
            total_price: row.total_price,
            created_at: row.created_at,
            customer_id: row.customer_id,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: EventId,
    tenant_id: TenantId,
    event_type: String,
    external_id: Option<String>,
    customer_email: Option<String>,
    data: serde_json::Value,
    customer_id: Option<CustomerId>,
    created_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = RepositoryError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let event_type: EventType = row
            .event_type
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("{e}")))?;
        Ok(Self {
            id: row.id,
            tenant_id: row.tenant_id,
            event_type,
            external_id: row.external_id.map(ExternalId::new),
            customer_email: row.customer_email,
            data: row.data,
            customer_id: row.customer_id,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SyncCursorRow {
    tenant_id: TenantId,
    resource: String,
    cursor: String,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SyncCursorRow> for SyncCursor {
    type Error = RepositoryError;

    fn try_from(row: SyncCursorRow) -> Result<Self, Self::Error> {
        let resource: SyncResource = row
            .resource
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("{e}")))?;
        Ok(Self {
            tenant_id: row.tenant_id,
            resource,
            cursor: row.cursor,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Store
// =============================================================================

/// [`Store`] backed by `PostgreSQL`.
///
/// Tenant lookups by shop domain are cached; tenants are never deleted, so
/// cached entries cannot go stale.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    tenants: Cache<String, TenantContext>,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            tenants: Cache::builder()
                .max_capacity(TENANT_CACHE_CAPACITY)
                .time_to_live(TENANT_CACHE_TTL)
                .build(),
        }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run pending migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails to apply.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        MIGRATOR.run(&self.pool).await
    }
}

#[async_trait]
impl Store for PgStore {
    #[instrument(skip(self))]
    async fn register_tenant(&self, shop: &str) -> Result<TenantContext, RepositoryError> {
        if let Some(tenant) = self.tenants.get(shop).await {
            return Ok(tenant);
        }

        // The no-op update makes RETURNING yield the existing row on conflict.
        let row = sqlx::query_as::<_, TenantRow>(
            r"
            INSERT INTO tenants (shop, name)
            VALUES ($1, $1)
            ON CONFLICT (shop) DO UPDATE SET shop = EXCLUDED.shop
            RETURNING id, shop
            ",
        )
        .bind(shop)
        .fetch_one(&self.pool)
        .await?;

        let tenant = TenantContext::new(row.id, row.shop);
        self.tenants.insert(shop.to_string(), tenant.clone()).await;
        Ok(tenant)
    }

    #[instrument(skip(self, input), fields(tenant_id = %tenant.tenant_id, external_id = %input.external_id))]
    async fn upsert_customer(
        &self,
        tenant: &TenantContext,
        input: &CustomerUpsert,
    ) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            INSERT INTO customers (tenant_id, external_id, email, name, created_at)
            VALUES ($1, $2, $3, $4, COALESCE($5, now()))
            ON CONFLICT (tenant_id, external_id) DO UPDATE SET
                email = EXCLUDED.email,
                name = EXCLUDED.name,
                created_at = COALESCE($5, customers.created_at),
                updated_at = now()
            RETURNING id, tenant_id, external_id, email, name, created_at
            ",
        )
        .bind(tenant.tenant_id)
        .bind(input.external_id.as_str())
        .bind(&input.email)
        .bind(input.name.as_deref())
        .bind(input.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_customer_by_external_id(
        &self,
        tenant: &TenantContext,
        external_id: &ExternalId,
    ) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            SELECT id, tenant_id, external_id, email, name, created_at
            FROM customers
            WHERE tenant_id = $1 AND external_id = $2
            ",
        )
        .bind(tenant.tenant_id)
        .bind(external_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Customer::from))
    }

    async fn find_customer_by_email(
        &self,
        tenant: &TenantContext,
        email: &Email,
    ) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            SELECT id, tenant_id, external_id, email, name, created_at
            FROM customers
            WHERE tenant_id = $1 AND email = $2
            ORDER BY id
            LIMIT 1
            ",
        )
        .bind(tenant.tenant_id)
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Customer::from))
    }

    #[instrument(skip(self, input), fields(tenant_id = %tenant.tenant_id, external_id = %input.external_id))]
    async fn upsert_product(
        &self,
        tenant: &TenantContext,
        input: &ProductUpsert,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO products
                (tenant_id, external_id, title, handle, vendor, product_type, price, inventory, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, 0), COALESCE($9, now()))
            ON CONFLICT (tenant_id, external_id) DO UPDATE SET
                title = EXCLUDED.title,
                handle = EXCLUDED.handle,
                vendor = EXCLUDED.vendor,
                product_type = EXCLUDED.product_type,
                price = EXCLUDED.price,
                inventory = COALESCE($8, products.inventory),
                created_at = COALESCE($9, products.created_at),
                updated_at = now()
            RETURNING id, tenant_id, external_id, title, handle, vendor, product_type,
                      price, inventory, created_at
            ",
        )
        .bind(tenant.tenant_id)
        .bind(input.external_id.as_str())
        .bind(&input.title)
        .bind(&input.handle)
        .bind(input.vendor.as_deref())
        .bind(input.product_type.as_deref())
        .bind(input.price)
        .bind(input.inventory)
        .bind(input.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    #[instrument(skip(self, input), fields(tenant_id = %tenant.tenant_id, external_id = %input.external_id))]
    async fn upsert_order(
        &self,
        tenant: &TenantContext,
        input: &OrderUpsert,
    ) -> Result<Order, RepositoryError> {
        let (set_customer, customer_id) = match input.customer {
            CustomerLink::Unchanged => (false, None),
            CustomerLink::Set(id) => (true, id),
        };

        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO orders (tenant_id, external_id, total_price, created_at, customer_id)
            VALUES ($1, $2, $3, COALESCE($4, now()), $5)
            ON CONFLICT (tenant_id, external_id) DO UPDATE SET
                total_price = EXCLUDED.total_price,
                created_at = COALESCE($4, orders.created_at),
                customer_id = CASE WHEN $6 THEN EXCLUDED.customer_id ELSE orders.customer_id END,
                updated_at = now()
            RETURNING id, tenant_id, external_id, total_price, created_at, customer_id
            ",
        )
        .bind(tenant.tenant_id)
        .bind(input.external_id.as_str())
        .bind(input.total_price)
        .bind(input.created_at)
        .bind(customer_id)
        .bind(set_customer)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    #[instrument(skip(self, event), fields(tenant_id = %tenant.tenant_id, event_type = %event.event_type))]
    async fn insert_event(
        &self,
        tenant: &TenantContext,
        event: &NewEvent,
    ) -> Result<Event, RepositoryError> {
        let row = sqlx::query_as::<_, EventRow>(
            r"
            INSERT INTO events (tenant_id, event_type, external_id, customer_email, data, customer_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, tenant_id, event_type, external_id, customer_email, data,
                      customer_id, created_at
            ",
        )
        .bind(tenant.tenant_id)
        .bind(event.event_type.as_str())
        .bind(event.external_id.as_ref().map(ExternalId::as_str))
        .bind(event.customer_email.as_deref())
        .bind(&event.data)
        .bind(event.customer_id)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn load_sync_cursor(
        &self,
        tenant: &TenantContext,
        resource: SyncResource,
    ) -> Result<Option<SyncCursor>, RepositoryError> {
        let row = sqlx::query_as::<_, SyncCursorRow>(
            r"
            SELECT tenant_id, resource, cursor, updated_at
            FROM sync_cursors
            WHERE tenant_id = $1 AND resource = $2
            ",
        )
        .bind(tenant.tenant_id)
        .bind(resource.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(SyncCursor::try_from).transpose()
    }

    async fn save_sync_cursor(
        &self,
        tenant: &TenantContext,
        resource: SyncResource,
        cursor: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO sync_cursors (tenant_id, resource, cursor)
            VALUES ($1, $2, $3)
            ON CONFLICT (tenant_id, resource) DO UPDATE SET
                cursor = EXCLUDED.cursor,
                updated_at = now()
            ",
        )
        .bind(tenant.tenant_id)
        .bind(resource.as_str())
        .bind(cursor)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear_sync_cursor(
        &self,
        tenant: &TenantContext,
        resource: SyncResource,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM sync_cursors WHERE tenant_id = $1 AND resource = $2")
            .bind(tenant.tenant_id)
            .bind(resource.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
