//! Integration test support for StorePulse.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (MemoryStore + mocked Shopify)
//! cargo test -p storepulse-integration-tests
//!
//! # Postgres-backed tests
//! TEST_DATABASE_URL=postgres://... cargo test -p storepulse-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `ingest` - Paginated ingestion, idempotence and cursor resume
//! - `webhooks` - Signed webhook deliveries through the router
//! - `dashboard` - `POST /app` intents through the router
//! - `postgres` - `PgStore` against a real database

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response};
use secrecy::SecretString;
use serde_json::{Value, json};
use storepulse_app::config::{AppConfig, ShopifyConfig, StoreBackend, SyncConfig};
use storepulse_app::db::{RepositoryError, Store};
use storepulse_app::models::{
    Customer, CustomerUpsert, Event, NewEvent, Order, OrderUpsert, Product, ProductUpsert,
    SyncCursor, SyncResource,
};
use storepulse_app::routes::webhooks::{HMAC_HEADER, SHOP_HEADER, TOPIC_HEADER, sign_payload};
use storepulse_app::shopify::{AdminClient, AdminShopifyError, GraphQLTransport, Paginator};
use storepulse_app::state::AppState;
use storepulse_core::{Email, ExternalId, TenantContext};

pub const SHOP: &str = "pulse-test.myshopify.com";
pub const API_SECRET: &str = "whsec_test_secret";

/// Shopify Admin API double that answers per `operationName`.
///
/// Each operation has its own queue of scripted responses; an exhausted or
/// unknown operation answers `NotFound`. Every request body is recorded.
#[derive(Default)]
pub struct MockShopify {
    scripts: Mutex<HashMap<String, VecDeque<Result<Value, AdminShopifyError>>>>,
    requests: Mutex<Vec<Value>>,
}

impl MockShopify {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `operation`.
    #[must_use]
    pub fn on(self, operation: &str, response: Result<Value, AdminShopifyError>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(operation.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Request bodies received so far, oldest first.
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    /// `variables` of each request made for `operation`.
    pub fn variables_for(&self, operation: &str) -> Vec<Value> {
        self.requests()
            .into_iter()
            .filter(|r| r["operationName"] == operation)
            .map(|r| r["variables"].clone())
            .collect()
    }
}

#[async_trait]
impl GraphQLTransport for MockShopify {
    async fn post(&self, body: Value) -> Result<Value, AdminShopifyError> {
        let operation = body["operationName"].as_str().unwrap_or_default().to_string();
        self.requests.lock().unwrap().push(body);
        self.scripts
            .lock()
            .unwrap()
            .get_mut(&operation)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(AdminShopifyError::NotFound(format!("no script for {operation}"))))
    }
}

/// `{data: {<root>: connection}}` for one page.
#[must_use]
pub fn page(root: &str, nodes: &[Value], end_cursor: Option<&str>, has_next_page: bool) -> Value {
    let edges: Vec<_> = nodes
        .iter()
        .map(|n| json!({ "node": n, "cursor": end_cursor }))
        .collect();
    json!({
        "data": {
            root: {
                "edges": edges,
                "pageInfo": { "hasNextPage": has_next_page, "endCursor": end_cursor }
            }
        }
    })
}

#[must_use]
pub fn product_node(id: u64, title: &str, price: &str) -> Value {
    json!({
        "id": format!("gid://shopify/Product/{id}"),
        "title": title,
        "handle": title.to_lowercase().replace(' ', "-"),
        "vendor": "Pulse",
        "productType": "Snowboard",
        "createdAt": "2024-01-01T00:00:00Z",
        "variants": { "edges": [{ "node": { "price": price }, "cursor": null }], "pageInfo": { "hasNextPage": false, "endCursor": null } }
    })
}

#[must_use]
pub fn customer_node(id: u64, email: &str, name: &str) -> Value {
    json!({
        "id": format!("gid://shopify/Customer/{id}"),
        "email": email,
        "displayName": name,
        "createdAt": "2024-01-02T00:00:00Z"
    })
}

#[must_use]
pub fn order_node(id: u64, created_at: &str, amount: &str, customer: Option<Value>) -> Value {
    json!({
        "id": format!("gid://shopify/Order/{id}"),
        "createdAt": created_at,
        "totalPriceSet": { "shopMoney": { "amount": amount } },
        "customer": customer
    })
}

/// Sync settings with millisecond backoff so retry tests stay fast.
#[must_use]
pub fn fast_sync() -> SyncConfig {
    SyncConfig {
        page_size: 2,
        max_attempts: 3,
        retry_base: Duration::from_millis(1),
        retry_max: Duration::from_millis(5),
    }
}

/// In-memory app configuration; `api_secret` enables webhook signatures.
#[must_use]
pub fn test_config(api_secret: Option<&str>) -> AppConfig {
    AppConfig {
        store: StoreBackend::Memory,
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        shopify: ShopifyConfig {
            store: SHOP.to_string(),
            api_version: "2025-01".to_string(),
            access_token: SecretString::from("shpat_integration"),
            api_secret: api_secret.map(SecretString::from),
        },
        sync: fast_sync(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

#[must_use]
pub fn admin_client(shopify: &Arc<MockShopify>) -> AdminClient {
    AdminClient::with_transport(SHOP, Arc::clone(shopify) as Arc<dyn GraphQLTransport>)
}

#[must_use]
pub fn paginator(shopify: &Arc<MockShopify>) -> Paginator {
    Paginator::new(&admin_client(shopify), &fast_sync())
}

#[must_use]
pub fn test_state(store: Arc<dyn Store>, shopify: &Arc<MockShopify>, api_secret: Option<&str>) -> AppState {
    AppState::new(test_config(api_secret), store, admin_client(shopify))
}

/// A signed webhook delivery for `topic` (e.g. `orders/create`).
#[must_use]
pub fn webhook_request(topic: &str, body: &Value, secret: &str) -> Request<Body> {
    let raw = serde_json::to_vec(body).unwrap();
    Request::post(format!("/webhooks/{topic}"))
        .header("content-type", "application/json")
        .header(HMAC_HEADER, sign_payload(secret, &raw))
        .header(SHOP_HEADER, SHOP)
        .header(TOPIC_HEADER, topic)
        .body(Body::from(raw))
        .unwrap()
}

/// `POST /app` with a JSON body.
#[must_use]
pub fn dashboard_request(body: &Value) -> Request<Body> {
    Request::post("/app")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

/// Read a response body as JSON (`Value::Null` when it is not JSON).
pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

/// A store whose every call fails, for error-path tests.
pub struct FailingStore;

fn broken<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Conflict("store unavailable".into()))
}

#[async_trait]
impl Store for FailingStore {
    async fn register_tenant(&self, _shop: &str) -> Result<TenantContext, RepositoryError> {
        broken()
    }

    async fn upsert_customer(
        &self,
        _tenant: &TenantContext,
        _input: &CustomerUpsert,
    ) -> Result<Customer, RepositoryError> {
        broken()
    }

    async fn find_customer_by_external_id(
        &self,
        _tenant: &TenantContext,
        _external_id: &ExternalId,
    ) -> Result<Option<Customer>, RepositoryError> {
        broken()
    }

    async fn find_customer_by_email(
        &self,
        _tenant: &TenantContext,
        _email: &Email,
    ) -> Result<Option<Customer>, RepositoryError> {
        broken()
    }

    async fn upsert_product(
        &self,
        _tenant: &TenantContext,
        _input: &ProductUpsert,
    ) -> Result<Product, RepositoryError> {
        broken()
    }

    async fn upsert_order(
        &self,
        _tenant: &TenantContext,
        _input: &OrderUpsert,
    ) -> Result<Order, RepositoryError> {
        broken()
    }

    async fn insert_event(
        &self,
        _tenant: &TenantContext,
        _input: &NewEvent,
    ) -> Result<Event, RepositoryError> {
        broken()
    }

    async fn load_sync_cursor(
        &self,
        _tenant: &TenantContext,
        _resource: SyncResource,
    ) -> Result<Option<SyncCursor>, RepositoryError> {
        broken()
    }

    async fn save_sync_cursor(
        &self,
        _tenant: &TenantContext,
        _resource: SyncResource,
        _cursor: &str,
    ) -> Result<(), RepositoryError> {
        broken()
    }

    async fn clear_sync_cursor(
        &self,
        _tenant: &TenantContext,
        _resource: SyncResource,
    ) -> Result<(), RepositoryError> {
        broken()
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        broken()
    }
}
