//! Webhook payloads → customer, order and product upserts.

use chrono::{DateTime, Utc};
use storepulse_core::{Email, ExternalId, TenantContext, parse_amount};
use tracing::instrument;

use crate::db::{RepositoryError, Store};
use crate::models::{CustomerLink, CustomerUpsert, OrderUpsert, ProductUpsert};
use crate::shopify::{CustomerPayload, OrderPayload, ProductPayload, WebhookCustomerPayload};

fn parse_time(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|t| t.with_timezone(&Utc))
}

fn payload_id(id: Option<&String>) -> Option<ExternalId> {
    id.map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(ExternalId::new)
}

/// `"first last"` trimmed; `None` when both parts are blank.
#[must_use]
pub fn full_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
    let name = format!("{} {}", first.unwrap_or_default(), last.unwrap_or_default());
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// `customers/create`: upsert the customer.
///
/// # Errors
///
/// Returns an error if the write fails.
#[instrument(skip(store, tenant, payload), fields(shop = %tenant.shop))]
pub async fn customer_created(
    store: &dyn Store,
    tenant: &TenantContext,
    payload: &CustomerPayload,
) -> Result<(), RepositoryError> {
    let Some(external_id) = payload_id(payload.id.as_ref()) else {
        tracing::warn!("Customer payload without id, skipping");
        return Ok(());
    };

    let customer = store
        .upsert_customer(
            tenant,
            &CustomerUpsert {
                external_id,
                email: payload.email.clone().unwrap_or_default(),
                name: full_name(payload.first_name.as_deref(), payload.last_name.as_deref()),
                created_at: parse_time(payload.created_at.as_deref()),
            },
        )
        .await?;

    tracing::info!(external_id = %customer.external_id, "Customer synced");
    Ok(())
}

/// Resolve an order's customer for `orders/create`.
///
/// Known customers are linked. Unknown ones are created only when the
/// payload has a usable email; otherwise the stored link is left alone. A customer
/// without an id is matched by email only.
async fn resolve_order_customer(
    store: &dyn Store,
    tenant: &TenantContext,
    customer: Option<&WebhookCustomerPayload>,
) -> Result<CustomerLink, RepositoryError> {
    let Some(customer) = customer else {
        return Ok(CustomerLink::Set(None));
    };
    let Some(external_id) = payload_id(customer.id.as_ref()) else {
        // No id to upsert by; an email can still point at a known customer
        let found = match Email::from_payload(customer.email.as_deref()) {
            Some(email) => store.find_customer_by_email(tenant, &email).await?,
            None => None,
        };
        return Ok(CustomerLink::Set(found.map(|c| c.id)));
    };

    if let Some(existing) = store
        .find_customer_by_external_id(tenant, &external_id)
        .await?
    {
        return Ok(CustomerLink::Set(Some(existing.id)));
    }

    let Some(email) = Email::from_payload(customer.email.as_deref()) else {
        return Ok(CustomerLink::Unchanged);
    };

    // Both name parts are required here, unlike customers/create.
    let name = match (customer.first_name.as_deref(), customer.last_name.as_deref()) {
        (Some(first), Some(last)) if !first.is_empty() && !last.is_empty() => {
            full_name(Some(first), Some(last))
        }
        _ => None,
    };
    let created = store
        .upsert_customer(
            tenant,
            &CustomerUpsert {
                external_id,
                email: email.into_string(),
                name,
                created_at: None,
            },
        )
        .await?;
    tracing::info!(email = %created.email, "Created new customer");
    Ok(CustomerLink::Set(Some(created.id)))
}

/// `orders/create`: upsert the order, linking or creating its customer.
///
/// # Errors
///
/// Returns an error if a lookup or write fails.
#[instrument(skip(store, tenant, payload), fields(shop = %tenant.shop))]
pub async fn order_created(
    store: &dyn Store,
    tenant: &TenantContext,
    payload: &OrderPayload,
) -> Result<(), RepositoryError> {
    let Some(external_id) = payload_id(payload.id.as_ref()) else {
        tracing::warn!("Order payload without id, skipping");
        return Ok(());
    };

    let customer = resolve_order_customer(store, tenant, payload.customer.as_ref()).await?;
    let order = store
        .upsert_order(
            tenant,
            &OrderUpsert {
                external_id,
                total_price: parse_amount(payload.total_price.as_deref()),
                created_at: parse_time(payload.created_at.as_deref()),
                customer,
            },
        )
        .await?;

    tracing::info!(external_id = %order.external_id, "Order synced");
    Ok(())
}

/// `orders/updated`: upsert price and creation time, keeping the customer link.
///
/// # Errors
///
/// Returns an error if the write fails.
#[instrument(skip(store, tenant, payload), fields(shop = %tenant.shop))]
pub async fn order_updated(
    store: &dyn Store,
    tenant: &TenantContext,
    payload: &OrderPayload,
) -> Result<(), RepositoryError> {
    let Some(external_id) = payload_id(payload.id.as_ref()) else {
        tracing::warn!("Order payload without id, skipping");
        return Ok(());
    };

    let order = store
        .upsert_order(
            tenant,
            &OrderUpsert {
                external_id,
                total_price: parse_amount(payload.total_price.as_deref()),
                created_at: parse_time(payload.created_at.as_deref()),
                customer: CustomerLink::Unchanged,
            },
        )
        .await?;

    tracing::info!(external_id = %order.external_id, "Order updated");
    Ok(())
}

/// `products/update`: upsert with price and inventory from the first variant.
///
/// # Errors
///
/// Returns an error if the write fails.
#[instrument(skip(store, tenant, payload), fields(shop = %tenant.shop))]
pub async fn product_updated(
    store: &dyn Store,
    tenant: &TenantContext,
    payload: &ProductPayload,
) -> Result<(), RepositoryError> {
    let Some(external_id) = payload_id(payload.id.as_ref()) else {
        tracing::warn!("Product payload without id, skipping");
        return Ok(());
    };

    let first_variant = payload.variants.first();
    let inventory = first_variant.map_or(0, |v| {
        i32::try_from(v.inventory_quantity).unwrap_or(if v.inventory_quantity < 0 {
            i32::MIN
        } else {
            i32::MAX
        })
    });

    let product = store
        .upsert_product(
            tenant,
            &ProductUpsert {
                external_id,
                title: payload.title.clone().unwrap_or_default(),
                handle: payload.handle.clone().unwrap_or_default(),
                vendor: payload.vendor.clone(),
                product_type: payload.product_type.clone(),
                price: parse_amount(first_variant.and_then(|v| v.price.as_deref())),
                inventory: Some(inventory),
                created_at: parse_time(payload.created_at.as_deref()),
            },
        )
        .await?;

    tracing::info!(external_id = %product.external_id, "Product updated");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;
    use crate::db::MemoryStore;

    #[test]
    fn test_full_name() {
        assert_eq!(full_name(Some("Ada"), Some("Lovelace")).as_deref(), Some("Ada Lovelace"));
        assert_eq!(full_name(Some("Ada"), None).as_deref(), Some("Ada"));
        assert_eq!(full_name(None, Some(" ")), None);
    }

    #[tokio::test]
    async fn test_order_created_creates_customer_with_email() {
        let store = MemoryStore::new();
        let tenant = store.register_tenant("a.myshopify.com").await.unwrap();
        let payload: OrderPayload = serde_json::from_value(json!({
            "id": 820_982_911_946_154_508_i64,
            "total_price": "403.00",
            "created_at": "2024-01-05T10:00:00-05:00",
            "customer": { "id": 115_310_627, "email": "bob@example.com", "first_name": "Bob", "last_name": "Norman" }
        }))
        .unwrap();

        order_created(&store, &tenant, &payload).await.unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.customers.len(), 1);
        assert_eq!(snapshot.customers[0].external_id.as_str(), "115310627");
        assert_eq!(snapshot.customers[0].name.as_deref(), Some("Bob Norman"));
        assert_eq!(snapshot.orders[0].customer_id, Some(snapshot.customers[0].id));
        assert_eq!(snapshot.orders[0].total_price, Decimal::new(40300, 2));
        assert_eq!(
            snapshot.orders[0].created_at,
            parse_time(Some("2024-01-05T15:00:00Z")).unwrap()
        );
    }

    #[tokio::test]
    async fn test_order_created_without_email_does_not_create_customer() {
        let store = MemoryStore::new();
        let tenant = store.register_tenant("a.myshopify.com").await.unwrap();
        let payload: OrderPayload = serde_json::from_value(json!({
            "id": 1,
            "total_price": "5.00",
            "customer": { "id": 2 }
        }))
        .unwrap();

        order_created(&store, &tenant, &payload).await.unwrap();

        let snapshot = store.snapshot().await;
        assert!(snapshot.customers.is_empty());
        assert_eq!(snapshot.orders[0].customer_id, None);
    }

    #[tokio::test]
    async fn test_malformed_email_neither_creates_nor_matches() {
        let store = MemoryStore::new();
        let tenant = store.register_tenant("a.myshopify.com").await.unwrap();
        // Stored without an email, as ingestion does for guest-less customers
        let blank: CustomerPayload = serde_json::from_value(json!({ "id": 9 })).unwrap();
        customer_created(&store, &tenant, &blank).await.unwrap();

        let unknown_id: OrderPayload = serde_json::from_value(json!({
            "id": 1,
            "total_price": "5.00",
            "customer": { "id": 2, "email": "guest" }
        }))
        .unwrap();
        order_created(&store, &tenant, &unknown_id).await.unwrap();

        let no_id: OrderPayload = serde_json::from_value(json!({
            "id": 3,
            "total_price": "1.00",
            "customer": { "email": "" }
        }))
        .unwrap();
        order_created(&store, &tenant, &no_id).await.unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.customers.len(), 1);
        assert_eq!(snapshot.orders[0].customer_id, None);
        assert_eq!(snapshot.orders[1].customer_id, None);
    }

    #[tokio::test]
    async fn test_order_without_customer_id_falls_back_to_email() {
        let store = MemoryStore::new();
        let tenant = store.register_tenant("a.myshopify.com").await.unwrap();
        let known: CustomerPayload =
            serde_json::from_value(json!({ "id": 9, "email": "known@example.com" })).unwrap();
        customer_created(&store, &tenant, &known).await.unwrap();

        let payload: OrderPayload = serde_json::from_value(json!({
            "id": 3,
            "total_price": "1.00",
            "customer": { "email": "known@example.com" }
        }))
        .unwrap();
        order_created(&store, &tenant, &payload).await.unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.customers.len(), 1);
        assert_eq!(snapshot.orders[0].customer_id, Some(snapshot.customers[0].id));
    }

    #[tokio::test]
    async fn test_order_updated_keeps_customer_link() {
        let store = MemoryStore::new();
        let tenant = store.register_tenant("a.myshopify.com").await.unwrap();
        let created: OrderPayload = serde_json::from_value(json!({
            "id": 1,
            "total_price": "5.00",
            "customer": { "id": 2, "email": "c@example.com" }
        }))
        .unwrap();
        order_created(&store, &tenant, &created).await.unwrap();

        let updated: OrderPayload =
            serde_json::from_value(json!({ "id": 1, "total_price": "6.00" })).unwrap();
        order_updated(&store, &tenant, &updated).await.unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.orders.len(), 1);
        assert_eq!(snapshot.orders[0].total_price, Decimal::new(600, 2));
        assert_eq!(snapshot.orders[0].customer_id, Some(snapshot.customers[0].id));
    }

    #[tokio::test]
    async fn test_product_updated_reads_first_variant() {
        let store = MemoryStore::new();
        let tenant = store.register_tenant("a.myshopify.com").await.unwrap();
        let payload: ProductPayload = serde_json::from_value(json!({
            "id": 632_910_392,
            "title": "IPod Nano - 8GB",
            "handle": "ipod-nano",
            "vendor": "Apple",
            "product_type": "Cult Products",
            "created_at": "2024-01-01T00:00:00Z",
            "variants": [
                { "price": "199.00", "inventory_quantity": 10 },
                { "price": "299.00", "inventory_quantity": 20 }
            ]
        }))
        .unwrap();

        product_updated(&store, &tenant, &payload).await.unwrap();

        let product = &store.snapshot().await.products[0];
        assert_eq!(product.external_id.as_str(), "632910392");
        assert_eq!(product.price, Decimal::new(19900, 2));
        assert_eq!(product.inventory, 10);
    }

    #[tokio::test]
    async fn test_customer_created_without_id_is_skipped() {
        let store = MemoryStore::new();
        let tenant = store.register_tenant("a.myshopify.com").await.unwrap();
        let payload: CustomerPayload =
            serde_json::from_value(json!({ "email": "x@example.com" })).unwrap();

        customer_created(&store, &tenant, &payload).await.unwrap();
        assert!(store.snapshot().await.customers.is_empty());
    }
}
