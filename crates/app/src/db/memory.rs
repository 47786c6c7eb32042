//! In-process store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use storepulse_core::{
    CustomerId, Email, EventId, ExternalId, OrderId, ProductId, TenantContext, TenantId,
};
use tokio::sync::RwLock;

use super::{RepositoryError, Store};
use crate::models::{
    Customer, CustomerLink, CustomerUpsert, Event, NewEvent, Order, OrderUpsert, Product,
    ProductUpsert, SyncCursor, SyncResource, Tenant,
};

/// Everything a [`MemoryStore`] holds, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub tenants: Vec<Tenant>,
    pub customers: Vec<Customer>,
    pub products: Vec<Product>,
    pub orders: Vec<Order>,
    pub events: Vec<Event>,
    /// Sorted by tenant id, then resource.
    pub cursors: Vec<SyncCursor>,
}

#[derive(Default)]
struct Inner {
    tenants: Vec<Tenant>,
    customers: Vec<Customer>,
    products: Vec<Product>,
    orders: Vec<Order>,
    events: Vec<Event>,
    cursors: HashMap<(TenantId, SyncResource), SyncCursor>,
}

/// [`Store`] that keeps all rows in memory behind a single lock.
///
/// Ids are assigned sequentially from 1 per table.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

fn next_id(len: usize) -> Result<i32, RepositoryError> {
    len.checked_add(1)
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| RepositoryError::Conflict("id space exhausted".to_string()))
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> StoreSnapshot {
        let inner = self.inner.read().await;
        let mut cursors: Vec<SyncCursor> = inner.cursors.values().cloned().collect();
        cursors.sort_by_key(|c| (c.tenant_id.as_i32(), c.resource));
        StoreSnapshot {
            tenants: inner.tenants.clone(),
            customers: inner.customers.clone(),
            products: inner.products.clone(),
            orders: inner.orders.clone(),
            events: inner.events.clone(),
            cursors,
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn register_tenant(&self, shop: &str) -> Result<TenantContext, RepositoryError> {
        if let Some(tenant) = self.inner.read().await.tenants.iter().find(|t| t.shop == shop) {
            return Ok(tenant.context());
        }

        let mut inner = self.inner.write().await;
        // Re-check under the write lock; another writer may have registered it.
        if let Some(tenant) = inner.tenants.iter().find(|t| t.shop == shop) {
            return Ok(tenant.context());
        }
        let tenant = Tenant {
            id: TenantId::new(next_id(inner.tenants.len())?),
            shop: shop.to_string(),
            name: shop.to_string(),
            created_at: Utc::now(),
        };
        let context = tenant.context();
        inner.tenants.push(tenant);
        Ok(context)
    }

    async fn upsert_customer(
        &self,
        tenant: &TenantContext,
        input: &CustomerUpsert,
    ) -> Result<Customer, RepositoryError> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner
            .customers
            .iter_mut()
            .find(|c| c.tenant_id == tenant.tenant_id && c.external_id == input.external_id)
        {
            existing.email.clone_from(&input.email);
            existing.name.clone_from(&input.name);
            if let Some(created_at) = input.created_at {
                existing.created_at = created_at;
            }
            return Ok(existing.clone());
        }

        let customer = Customer {
            id: CustomerId::new(next_id(inner.customers.len())?),
            tenant_id: tenant.tenant_id,
            external_id: input.external_id.clone(),
            email: input.email.clone(),
            name: input.name.clone(),
            created_at: input.created_at.unwrap_or_else(Utc::now),
        };
        inner.customers.push(customer.clone());
        Ok(customer)
    }

    async fn find_customer_by_external_id(
        &self,
        tenant: &TenantContext,
        external_id: &ExternalId,
    ) -> Result<Option<Customer>, RepositoryError> {
        Ok(self
            .inner
            .read()
            .await
            .customers
            .iter()
            .find(|c| c.tenant_id == tenant.tenant_id && &c.external_id == external_id)
            .cloned())
    }

    async fn find_customer_by_email(
        &self,
        tenant: &TenantContext,
        email: &Email,
    ) -> Result<Option<Customer>, RepositoryError> {
        Ok(self
            .inner
            .read()
            .await
            .customers
            .iter()
            .find(|c| c.tenant_id == tenant.tenant_id && c.email == email.as_str())
            .cloned())
    }

    async fn upsert_product(
        &self,
        tenant: &TenantContext,
        input: &ProductUpsert,
    ) -> Result<Product, RepositoryError> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner
            .products
            .iter_mut()
            .find(|p| p.tenant_id == tenant.tenant_id && p.external_id == input.external_id)
        {
            existing.title.clone_from(&input.title);
            existing.handle.clone_from(&input.handle);
            existing.vendor.clone_from(&input.vendor);
            existing.product_type.clone_from(&input.product_type);
            existing.price = input.price;
            if let Some(inventory) = input.inventory {
                existing.inventory = inventory;
            }
            if let Some(created_at) = input.created_at {
                existing.created_at = created_at;
            }
            return Ok(existing.clone());
        }

        let product = Product {
            id: ProductId::new(next_id(inner.products.len())?),
            tenant_id: tenant.tenant_id,
            external_id: input.external_id.clone(),
            title: input.title.clone(),
            handle: input.handle.clone(),
            vendor: input.vendor.clone(),
            product_type: input.product_type.clone(),
            price: input.price,
            inventory: input.inventory.unwrap_or(0),
            created_at: input.created_at.unwrap_or_else(Utc::now),
        };
        inner.products.push(product.clone());
        Ok(product)
    }

    async fn upsert_order(
        &self,
        tenant: &TenantContext,
        input: &OrderUpsert,
    ) -> Result<Order, RepositoryError> {
        let mut inner = self.inner.write().await;

        if let CustomerLink::Set(Some(customer_id)) = input.customer
            && !inner
                .customers
                .iter()
                .any(|c| c.id == customer_id && c.tenant_id == tenant.tenant_id)
        {
            return Err(RepositoryError::Conflict(format!(
                "customer {customer_id} does not exist"
            )));
        }

        if let Some(existing) = inner
            .orders
            .iter_mut()
            .find(|o| o.tenant_id == tenant.tenant_id && o.external_id == input.external_id)
        {
            existing.total_price = input.total_price;
            if let Some(created_at) = input.created_at {
                existing.created_at = created_at;
            }
            if let CustomerLink::Set(customer_id) = input.customer {
                existing.customer_id = customer_id;
            }
            return Ok(existing.clone());
        }

        let customer_id = match input.customer {
            CustomerLink::Unchanged => None,
            CustomerLink::Set(id) => id,
        };
        let order = Order {
            id: OrderId::new(next_id(inner.orders.len())?),
            tenant_id: tenant.tenant_id,
            external_id: input.external_id.clone(),
            total_price: input.total_price,
            created_at: input.created_at.unwrap_or_else(Utc::now),
            customer_id,
        };
        inner.orders.push(order.clone());
        Ok(order)
    }

    async fn insert_event(
        &self,
        tenant: &TenantContext,
        event: &NewEvent,
    ) -> Result<Event, RepositoryError> {
        let mut inner = self.inner.write().await;
        let stored = Event {
            id: EventId::new(next_id(inner.events.len())?),
            tenant_id: tenant.tenant_id,
            event_type: event.event_type,
            external_id: event.external_id.clone(),
            customer_email: event.customer_email.clone(),
            data: event.data.clone(),
            customer_id: event.customer_id,
            created_at: Utc::now(),
        };
        inner.events.push(stored.clone());
        Ok(stored)
    }

    async fn load_sync_cursor(
        &self,
        tenant: &TenantContext,
        resource: SyncResource,
    ) -> Result<Option<SyncCursor>, RepositoryError> {
        Ok(self
            .inner
            .read()
            .await
            .cursors
            .get(&(tenant.tenant_id, resource))
            .cloned())
    }

    async fn save_sync_cursor(
        &self,
        tenant: &TenantContext,
        resource: SyncResource,
        cursor: &str,
    ) -> Result<(), RepositoryError> {
        self.inner.write().await.cursors.insert(
            (tenant.tenant_id, resource),
            SyncCursor {
                tenant_id: tenant.tenant_id,
                resource,
                cursor: cursor.to_string(),
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn clear_sync_cursor(
        &self,
        tenant: &TenantContext,
        resource: SyncResource,
    ) -> Result<(), RepositoryError> {
        self.inner
            .write()
            .await
            .cursors
            .remove(&(tenant.tenant_id, resource));
        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    use super::*;

    fn customer_input(id: &str, email: &str) -> CustomerUpsert {
        CustomerUpsert {
            external_id: ExternalId::new(id),
            email: email.to_string(),
            name: None,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_register_tenant_is_idempotent() {
        let store = MemoryStore::new();
        let first = store.register_tenant("a.myshopify.com").await.unwrap();
        let again = store.register_tenant("a.myshopify.com").await.unwrap();
        let other = store.register_tenant("b.myshopify.com").await.unwrap();

        assert_eq!(first, again);
        assert_ne!(first.tenant_id, other.tenant_id);
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.tenants.len(), 2);
        assert_eq!(snapshot.tenants[0].name, "a.myshopify.com");
    }

    #[tokio::test]
    async fn test_upsert_customer_keeps_id_and_created_at() {
        let store = MemoryStore::new();
        let tenant = store.register_tenant("a.myshopify.com").await.unwrap();
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let mut input = customer_input("9", "ada@example.com");
        input.created_at = Some(created);
        let first = store.upsert_customer(&tenant, &input).await.unwrap();

        let mut update = customer_input("9", "ada@new.example.com");
        update.name = Some("Ada".to_string());
        let second = store.upsert_customer(&tenant, &update).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.created_at, created);
        assert_eq!(second.email, "ada@new.example.com");
        assert_eq!(store.snapshot().await.customers.len(), 1);
    }

    #[tokio::test]
    async fn test_external_ids_are_scoped_per_tenant() {
        let store = MemoryStore::new();
        let a = store.register_tenant("a.myshopify.com").await.unwrap();
        let b = store.register_tenant("b.myshopify.com").await.unwrap();

        store.upsert_customer(&a, &customer_input("1", "x@example.com")).await.unwrap();
        store.upsert_customer(&b, &customer_input("1", "y@example.com")).await.unwrap();

        assert_eq!(store.snapshot().await.customers.len(), 2);
        let found = store
            .find_customer_by_email(&b, &Email::parse("x@example.com").unwrap())
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_order_customer_link_unchanged() {
        let store = MemoryStore::new();
        let tenant = store.register_tenant("a.myshopify.com").await.unwrap();
        let customer = store
            .upsert_customer(&tenant, &customer_input("9", "ada@example.com"))
            .await
            .unwrap();

        let linked = OrderUpsert {
            external_id: ExternalId::new("100"),
            total_price: Decimal::new(1000, 2),
            created_at: None,
            customer: CustomerLink::Set(Some(customer.id)),
        };
        store.upsert_order(&tenant, &linked).await.unwrap();

        let update = OrderUpsert {
            total_price: Decimal::new(2000, 2),
            customer: CustomerLink::Unchanged,
            ..linked
        };
        let order = store.upsert_order(&tenant, &update).await.unwrap();
        assert_eq!(order.customer_id, Some(customer.id));
        assert_eq!(order.total_price, Decimal::new(2000, 2));
    }

    #[tokio::test]
    async fn test_product_inventory_kept_when_unknown() {
        let store = MemoryStore::new();
        let tenant = store.register_tenant("a.myshopify.com").await.unwrap();
        let input = ProductUpsert {
            external_id: ExternalId::new("5"),
            title: "Red Snowboard".to_string(),
            handle: "red-snowboard".to_string(),
            vendor: None,
            product_type: None,
            price: Decimal::new(10000, 2),
            inventory: Some(7),
            created_at: None,
        };
        store.upsert_product(&tenant, &input).await.unwrap();

        let resync = ProductUpsert {
            inventory: None,
            ..input
        };
        let product = store.upsert_product(&tenant, &resync).await.unwrap();
        assert_eq!(product.inventory, 7);
    }

    #[tokio::test]
    async fn test_sync_cursor_lifecycle() {
        let store = MemoryStore::new();
        let tenant = store.register_tenant("a.myshopify.com").await.unwrap();

        store
            .save_sync_cursor(&tenant, SyncResource::Orders, "c1")
            .await
            .unwrap();
        store
            .save_sync_cursor(&tenant, SyncResource::Orders, "c2")
            .await
            .unwrap();
        let cursor = store
            .load_sync_cursor(&tenant, SyncResource::Orders)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cursor.cursor, "c2");
        assert!(
            store
                .load_sync_cursor(&tenant, SyncResource::Products)
                .await
                .unwrap()
                .is_none()
        );

        store
            .clear_sync_cursor(&tenant, SyncResource::Orders)
            .await
            .unwrap();
        assert!(store.snapshot().await.cursors.is_empty());
    }
}
