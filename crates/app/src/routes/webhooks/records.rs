//! Customer, order and product webhooks, upserted into the local copy.

use axum::{extract::State, http::StatusCode};
use tracing::instrument;

use super::{ShopifyWebhook, acknowledge, tenant};
use crate::error::AppError;
use crate::services::records;
use crate::shopify::{CustomerPayload, OrderPayload, ProductPayload};
use crate::state::AppState;

#[instrument(skip_all, fields(shop = %webhook.shop))]
pub async fn customers_create(
    State(state): State<AppState>,
    webhook: ShopifyWebhook,
) -> Result<StatusCode, AppError> {
    let payload: CustomerPayload = webhook.json()?;
    let result = async {
        let tenant = tenant(&state, &webhook).await?;
        records::customer_created(state.store(), &tenant, &payload).await
    }
    .await;
    Ok(acknowledge("customers/create", result))
}

#[instrument(skip_all, fields(shop = %webhook.shop))]
pub async fn orders_create(
    State(state): State<AppState>,
    webhook: ShopifyWebhook,
) -> Result<StatusCode, AppError> {
    let payload: OrderPayload = webhook.json()?;
    let result = async {
        let tenant = tenant(&state, &webhook).await?;
        records::order_created(state.store(), &tenant, &payload).await
    }
    .await;
    Ok(acknowledge("orders/create", result))
}

#[instrument(skip_all, fields(shop = %webhook.shop))]
pub async fn orders_updated(
    State(state): State<AppState>,
    webhook: ShopifyWebhook,
) -> Result<StatusCode, AppError> {
    let payload: OrderPayload = webhook.json()?;
    let result = async {
        let tenant = tenant(&state, &webhook).await?;
        records::order_updated(state.store(), &tenant, &payload).await
    }
    .await;
    Ok(acknowledge("orders/updated", result))
}

#[instrument(skip_all, fields(shop = %webhook.shop))]
pub async fn products_update(
    State(state): State<AppState>,
    webhook: ShopifyWebhook,
) -> Result<StatusCode, AppError> {
    let payload: ProductPayload = webhook.json()?;
    let result = async {
        let tenant = tenant(&state, &webhook).await?;
        records::product_updated(state.store(), &tenant, &payload).await
    }
    .await;
    Ok(acknowledge("products/update", result))
}
