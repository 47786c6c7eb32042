//! Ingestion from a mocked Admin API into `MemoryStore`.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;
use storepulse_app::db::{MemoryStore, Store};
use storepulse_app::models::SyncResource;
use storepulse_app::services::{IngestError, Ingestor};
use storepulse_app::shopify::{AdminShopifyError, GraphQLError};
use storepulse_integration_tests::{
    MockShopify, SHOP, customer_node, order_node, page, paginator, product_node,
};

fn ingestor(store: &Arc<MemoryStore>, shopify: &Arc<MockShopify>) -> Ingestor {
    Ingestor::new(Arc::clone(store) as Arc<dyn Store>, paginator(shopify))
}

fn product_pages(shopify: MockShopify) -> MockShopify {
    shopify
        .on(
            "listProducts",
            Ok(page(
                "products",
                &[
                    product_node(1, "Red Snowboard", "100.00"),
                    product_node(2, "Green Snowboard", "120.50"),
                ],
                Some("p1"),
                true,
            )),
        )
        .on(
            "listProducts",
            Ok(page(
                "products",
                &[product_node(3, "Yellow Snowboard", "99.99")],
                Some("p2"),
                false,
            )),
        )
}

#[tokio::test]
async fn test_ingesting_twice_yields_same_state() {
    let shopify = Arc::new(product_pages(product_pages(MockShopify::new())));
    let store = Arc::new(MemoryStore::new());
    let tenant = store.register_tenant(SHOP).await.unwrap();
    let ingestor = ingestor(&store, &shopify);

    assert_eq!(ingestor.ingest_products(&tenant).await.unwrap(), 3);
    let first = store.snapshot().await;
    assert_eq!(ingestor.ingest_products(&tenant).await.unwrap(), 3);
    let second = store.snapshot().await;

    assert_eq!(first, second);
    assert_eq!(second.products.len(), 3);
    assert_eq!(second.products[1].external_id.as_str(), "2");
    assert_eq!(second.products[1].price, Decimal::new(12050, 2));
    assert!(second.cursors.is_empty());
}

#[tokio::test]
async fn test_failed_run_resumes_from_saved_cursor() {
    let shopify = Arc::new(
        MockShopify::new()
            .on(
                "listCustomers",
                Ok(page(
                    "customers",
                    &[
                        customer_node(10, "ada@example.com", "Ada Lovelace"),
                        customer_node(11, "alan@example.com", "Alan Turing"),
                    ],
                    Some("c1"),
                    true,
                )),
            )
            .on(
                "listCustomers",
                Err(AdminShopifyError::Unauthorized("token revoked".into())),
            )
            .on(
                "listCustomers",
                Ok(page(
                    "customers",
                    &[customer_node(12, "grace@example.com", "Grace Hopper")],
                    Some("c2"),
                    false,
                )),
            ),
    );
    let store = Arc::new(MemoryStore::new());
    let tenant = store.register_tenant(SHOP).await.unwrap();
    let ingestor = ingestor(&store, &shopify);

    let err = ingestor.ingest_customers(&tenant).await.unwrap_err();
    assert!(matches!(
        err,
        IngestError::Shopify(AdminShopifyError::Unauthorized(_))
    ));

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.customers.len(), 2);
    assert_eq!(snapshot.cursors.len(), 1);
    assert_eq!(snapshot.cursors[0].resource, SyncResource::Customers);
    assert_eq!(snapshot.cursors[0].cursor, "c1");

    // Unauthorized is not retried: exactly one failing request
    assert_eq!(shopify.variables_for("listCustomers").len(), 2);

    assert_eq!(ingestor.ingest_customers(&tenant).await.unwrap(), 1);

    let variables = shopify.variables_for("listCustomers");
    assert_eq!(variables.len(), 3);
    assert_eq!(variables[2]["after"], json!("c1"));

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.customers.len(), 3);
    assert!(snapshot.cursors.is_empty());
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let shopify = Arc::new(
        MockShopify::new()
            .on("listOrders", Err(AdminShopifyError::Server(502)))
            .on("listOrders", Err(AdminShopifyError::RateLimited(1)))
            .on(
                "listOrders",
                Ok(page(
                    "orders",
                    &[order_node(
                        100,
                        "2024-01-05T10:00:00Z",
                        "25.00",
                        Some(json!({
                            "id": "gid://shopify/Customer/7",
                            "displayName": "Bob Norman",
                            "email": "bob@example.com"
                        })),
                    )],
                    None,
                    false,
                )),
            ),
    );
    let store = Arc::new(MemoryStore::new());
    let tenant = store.register_tenant(SHOP).await.unwrap();

    assert_eq!(ingestor(&store, &shopify).ingest_orders(&tenant).await.unwrap(), 1);
    assert_eq!(shopify.variables_for("listOrders").len(), 3);

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.customers.len(), 1);
    assert_eq!(snapshot.customers[0].external_id.as_str(), "7");
    assert_eq!(snapshot.orders[0].customer_id, Some(snapshot.customers[0].id));
    assert_eq!(snapshot.orders[0].total_price, Decimal::new(2500, 2));
}

#[tokio::test]
async fn test_retries_give_up_after_max_attempts() {
    let shopify = Arc::new(
        MockShopify::new()
            .on("listOrders", Err(AdminShopifyError::Server(503)))
            .on("listOrders", Err(AdminShopifyError::Server(503)))
            .on("listOrders", Err(AdminShopifyError::Server(503)))
            .on("listOrders", Ok(page("orders", &[], None, false))),
    );
    let store = Arc::new(MemoryStore::new());
    let tenant = store.register_tenant(SHOP).await.unwrap();

    let err = ingestor(&store, &shopify).ingest_orders(&tenant).await.unwrap_err();
    assert!(matches!(err, IngestError::Shopify(AdminShopifyError::Server(503))));
    assert_eq!(shopify.variables_for("listOrders").len(), 3);
}

#[tokio::test]
async fn test_ingest_all_links_orders_to_ingested_customers() {
    let shopify = Arc::new(
        MockShopify::new()
            .on(
                "listProducts",
                Ok(page("products", &[product_node(1, "Red Snowboard", "100.00")], None, false)),
            )
            .on(
                "listCustomers",
                Ok(page(
                    "customers",
                    &[customer_node(7, "bob@example.com", "Bob Norman")],
                    None,
                    false,
                )),
            )
            .on(
                "listOrders",
                Ok(page(
                    "orders",
                    &[
                        order_node(
                            100,
                            "2024-01-05T10:00:00Z",
                            "25.00",
                            Some(json!({ "id": "gid://shopify/Customer/7", "email": "bob@example.com" })),
                        ),
                        order_node(101, "2024-01-06T10:00:00Z", "5.00", None),
                    ],
                    None,
                    false,
                )),
            ),
    );
    let store = Arc::new(MemoryStore::new());
    let tenant = store.register_tenant(SHOP).await.unwrap();

    let summary = ingestor(&store, &shopify).ingest_all(&tenant).await.unwrap();
    assert_eq!(summary.products, Some(1));
    assert_eq!(summary.customers, Some(1));
    assert_eq!(summary.orders, Some(2));

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.customers.len(), 1);
    // The customers query supplied createdAt; the order's embedded customer must not reset it
    assert_eq!(
        snapshot.customers[0].created_at.to_rfc3339(),
        "2024-01-02T00:00:00+00:00"
    );
    assert_eq!(snapshot.orders[0].customer_id, Some(snapshot.customers[0].id));
    assert_eq!(snapshot.orders[1].customer_id, None);

    let operations: Vec<_> = shopify
        .requests()
        .iter()
        .map(|r| r["operationName"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(operations, ["listProducts", "listCustomers", "listOrders"]);
}

#[tokio::test]
async fn test_limit_caps_a_run_and_clears_the_cursor() {
    let shopify = Arc::new(product_pages(MockShopify::new()));
    let store = Arc::new(MemoryStore::new());
    let tenant = store.register_tenant(SHOP).await.unwrap();

    let count = ingestor(&store, &shopify)
        .with_limit(2)
        .ingest_products(&tenant)
        .await
        .unwrap();

    assert_eq!(count, 2);
    assert_eq!(shopify.variables_for("listProducts").len(), 1);
    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.products.len(), 2);
    assert!(snapshot.cursors.is_empty());
}

fn invalid_cursor() -> AdminShopifyError {
    AdminShopifyError::GraphQL(vec![GraphQLError {
        message: "Invalid cursor for current pagination sort.".to_string(),
        locations: vec![],
        path: vec![json!("products")],
    }])
}

#[tokio::test]
async fn test_rejected_saved_cursor_restarts_from_first_page() {
    let shopify = Arc::new(
        MockShopify::new()
            .on("listProducts", Err(invalid_cursor()))
            .on(
                "listProducts",
                Ok(page("products", &[product_node(1, "Red Snowboard", "100.00")], None, false)),
            ),
    );
    let store = Arc::new(MemoryStore::new());
    let tenant = store.register_tenant(SHOP).await.unwrap();
    store
        .save_sync_cursor(&tenant, SyncResource::Products, "expired")
        .await
        .unwrap();

    assert_eq!(ingestor(&store, &shopify).ingest_products(&tenant).await.unwrap(), 1);

    let variables = shopify.variables_for("listProducts");
    assert_eq!(variables.len(), 2);
    assert_eq!(variables[0]["after"], json!("expired"));
    assert!(variables[1].get("after").is_none());

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.products.len(), 1);
    assert!(snapshot.cursors.is_empty());
}

#[tokio::test]
async fn test_rejected_cursor_on_fresh_run_is_an_error() {
    let shopify = Arc::new(MockShopify::new().on("listProducts", Err(invalid_cursor())));
    let store = Arc::new(MemoryStore::new());
    let tenant = store.register_tenant(SHOP).await.unwrap();

    let err = ingestor(&store, &shopify).ingest_products(&tenant).await.unwrap_err();
    assert!(matches!(err, IngestError::Shopify(AdminShopifyError::GraphQL(_))));
    assert_eq!(shopify.variables_for("listProducts").len(), 1);
}

#[tokio::test]
async fn test_auth_failure_on_resume_keeps_the_cursor() {
    let shopify = Arc::new(
        MockShopify::new().on(
            "listCustomers",
            Err(AdminShopifyError::Unauthorized("token revoked".into())),
        ),
    );
    let store = Arc::new(MemoryStore::new());
    let tenant = store.register_tenant(SHOP).await.unwrap();
    store
        .save_sync_cursor(&tenant, SyncResource::Customers, "c1")
        .await
        .unwrap();

    let err = ingestor(&store, &shopify).ingest_customers(&tenant).await.unwrap_err();
    assert!(matches!(err, IngestError::Shopify(AdminShopifyError::Unauthorized(_))));

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.cursors.len(), 1);
    assert_eq!(snapshot.cursors[0].cursor, "c1");
}
