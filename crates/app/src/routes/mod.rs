//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                        - Liveness
//! GET  /health/ready                  - Store reachable
//!
//! # Dashboard
//! POST /app                           - intent = metrics | ingest_* | generate_product
//!
//! # Webhooks (HMAC-verified, always 200 once accepted)
//! POST /webhooks/carts/create
//! POST /webhooks/carts/update          (also /webhook/carts/update)
//! POST /webhooks/checkouts/create
//! POST /webhooks/checkouts/update
//! POST /webhooks/checkouts/delete
//! POST /webhooks/customers/create
//! POST /webhooks/draft_orders/create
//! POST /webhooks/orders/create
//! POST /webhooks/orders/updated         (also /webhooks/orders/update)
//! POST /webhooks/products/update
//! ```

pub mod dashboard;
pub mod health;
pub mod webhooks;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Build all application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(dashboard::router())
        .merge(webhooks::router())
}

/// Routes with state applied, ready to serve or drive with `oneshot`.
pub fn app(state: AppState) -> Router {
    routes().with_state(state)
}
