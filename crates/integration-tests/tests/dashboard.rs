//! `POST /app` intents through the router.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use storepulse_app::db::{MemoryStore, Store};
use storepulse_app::routes;
use storepulse_app::shopify::AdminShopifyError;
use storepulse_integration_tests::{
    FailingStore, MockShopify, customer_node, dashboard_request, json_body, order_node, page,
    test_state,
};
use tower::ServiceExt;

fn app(store: Arc<dyn Store>, shopify: &Arc<MockShopify>) -> axum::Router {
    routes::app(test_state(store, shopify, None))
}

#[tokio::test]
async fn test_metrics_intent_aggregates_orders() {
    let shopify = Arc::new(
        MockShopify::new()
            .on(
                "listOrders",
                Ok(page(
                    "orders",
                    &[
                        order_node(
                            1,
                            "2024-01-01T09:00:00Z",
                            "10.10",
                            Some(json!({ "id": "gid://shopify/Customer/1", "displayName": "Ada", "email": "ada@example.com" })),
                        ),
                        order_node(
                            2,
                            "2024-01-01T18:00:00Z",
                            "20.20",
                            Some(json!({ "id": "gid://shopify/Customer/2", "displayName": "Alan", "email": "alan@example.com" })),
                        ),
                    ],
                    Some("o1"),
                    true,
                )),
            )
            .on(
                "listOrders",
                Ok(page(
                    "orders",
                    &[
                        order_node(
                            3,
                            "2024-01-03T12:00:00Z",
                            "30.30",
                            Some(json!({ "id": "gid://shopify/Customer/1", "displayName": "Ada", "email": "ada@example.com" })),
                        ),
                        order_node(4, "2024-01-03T13:00:00Z", "1.00", None),
                    ],
                    None,
                    false,
                )),
            ),
    );

    let response = app(Arc::new(MemoryStore::new()), &shopify)
        .oneshot(dashboard_request(&json!({
            "intent": "metrics",
            "startDate": "2024-01-01",
            "endDate": "2024-01-31"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let metrics = &body["metrics"];
    assert_eq!(metrics["totals"]["orders"], json!(4));
    assert_eq!(metrics["totals"]["customers"], json!(2));
    assert_eq!(metrics["totals"]["revenue"], json!(61.6));
    assert_eq!(metrics["series"].as_array().unwrap().len(), 2);
    assert_eq!(metrics["series"][0]["date"], json!("2024-01-01"));
    assert_eq!(metrics["series"][1]["orders"], json!(2));
    assert_eq!(metrics["topCustomers"][0]["name"], json!("Ada"));
    assert_eq!(metrics["topCustomers"][0]["total"], json!(40.4));
    assert_eq!(metrics["range"]["start"], json!("2024-01-01"));

    let variables = shopify.variables_for("listOrders");
    assert_eq!(
        variables[0]["query"],
        json!("created_at:>=2024-01-01 created_at:<=2024-01-31")
    );
    assert_eq!(variables[1]["after"], json!("o1"));
}

#[tokio::test]
async fn test_metrics_with_bad_dates_is_bad_request() {
    let shopify = Arc::new(MockShopify::new());

    for body in [
        json!({ "intent": "metrics", "startDate": "January 1st" }),
        json!({ "intent": "metrics", "startDate": "2024-02-01", "endDate": "2024-01-01" }),
    ] {
        let response = app(Arc::new(MemoryStore::new()), &shopify)
            .oneshot(dashboard_request(&body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
    assert!(shopify.requests().is_empty());
}

#[tokio::test]
async fn test_ingest_intent_from_form() {
    let shopify = Arc::new(MockShopify::new().on(
        "listCustomers",
        Ok(page(
            "customers",
            &[customer_node(5, "grace@example.com", "Grace Hopper")],
            None,
            false,
        )),
    ));
    let store = Arc::new(MemoryStore::new());

    let request = Request::post("/app")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("intent=ingest_customers"))
        .unwrap();
    let response = app(Arc::clone(&store) as Arc<dyn Store>, &shopify)
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "ingested": { "customers": 1 }, "ok": true })
    );
    assert_eq!(store.snapshot().await.customers.len(), 1);
}

#[tokio::test]
async fn test_store_failure_is_server_error() {
    let shopify = Arc::new(MockShopify::new());
    let response = app(Arc::new(FailingStore), &shopify)
        .oneshot(dashboard_request(&json!({ "intent": "ingest_all" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_shopify_failure_is_bad_gateway() {
    let shopify = Arc::new(MockShopify::new().on(
        "listProducts",
        Err(AdminShopifyError::Unauthorized("Invalid API key".into())),
    ));
    let response = app(Arc::new(MemoryStore::new()), &shopify)
        .oneshot(dashboard_request(&json!({ "intent": "ingest_products" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_generate_product_is_the_default_intent() {
    let shopify = Arc::new(
        MockShopify::new()
            .on(
                "populateProduct",
                Ok(json!({ "data": { "productCreate": {
                    "product": {
                        "id": "gid://shopify/Product/9",
                        "title": "Green Snowboard",
                        "handle": "green-snowboard",
                        "status": "ACTIVE",
                        "variants": { "edges": [{ "node": { "id": "gid://shopify/ProductVariant/90", "price": "0.00" } }] }
                    },
                    "userErrors": []
                } } })),
            )
            .on(
                "updateDemoVariant",
                Ok(json!({ "data": { "productVariantsBulkUpdate": {
                    "productVariants": [{ "id": "gid://shopify/ProductVariant/90", "price": "100.00" }],
                    "userErrors": []
                } } })),
            ),
    );

    let response = app(Arc::new(MemoryStore::new()), &shopify)
        .oneshot(dashboard_request(&json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["product"]["id"], json!("gid://shopify/Product/9"));
    assert_eq!(body["variant"][0]["price"], json!("100.00"));

    let update = &shopify.variables_for("updateDemoVariant")[0];
    assert_eq!(update["productId"], json!("gid://shopify/Product/9"));
    assert_eq!(update["variants"][0]["price"], json!("100.00"));

    let title = shopify.variables_for("populateProduct")[0]["product"]["title"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(title.ends_with(" Snowboard"));
}

#[tokio::test]
async fn test_health_endpoints() {
    let shopify = Arc::new(MockShopify::new());

    let response = app(Arc::new(MemoryStore::new()), &shopify)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app(Arc::new(MemoryStore::new()), &shopify)
        .oneshot(Request::get("/health/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app(Arc::new(FailingStore), &shopify)
        .oneshot(Request::get("/health/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
