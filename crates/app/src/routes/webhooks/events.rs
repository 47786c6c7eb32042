//! Cart, checkout and draft-order webhooks, stored as events.

use axum::{extract::State, http::StatusCode};
use tracing::instrument;

use super::{ShopifyWebhook, acknowledge, tenant};
use crate::db::RepositoryError;
use crate::error::AppError;
use crate::services::{EventDraft, events};
use crate::shopify::{CartPayload, CheckoutPayload, DraftOrderPayload};
use crate::state::AppState;

async fn store_event(
    state: &AppState,
    webhook: &ShopifyWebhook,
    draft: EventDraft,
) -> Result<(), RepositoryError> {
    let tenant = tenant(state, webhook).await?;
    events::record(state.store(), &tenant, draft).await?;
    Ok(())
}

#[instrument(skip_all, fields(shop = %webhook.shop))]
pub async fn carts_create(
    State(state): State<AppState>,
    webhook: ShopifyWebhook,
) -> Result<StatusCode, AppError> {
    let cart: CartPayload = webhook.json()?;
    let result = store_event(&state, &webhook, events::cart_created(&cart)).await;
    Ok(acknowledge("carts/create", result))
}

#[instrument(skip_all, fields(shop = %webhook.shop))]
pub async fn carts_update(
    State(state): State<AppState>,
    webhook: ShopifyWebhook,
) -> Result<StatusCode, AppError> {
    let cart: CartPayload = webhook.json()?;
    let result = store_event(&state, &webhook, events::cart_updated(&cart)).await;
    Ok(acknowledge("carts/update", result))
}

#[instrument(skip_all, fields(shop = %webhook.shop))]
pub async fn checkouts_create(
    State(state): State<AppState>,
    webhook: ShopifyWebhook,
) -> Result<StatusCode, AppError> {
    let checkout: CheckoutPayload = webhook.json()?;
    let result = store_event(&state, &webhook, events::checkout_created(&checkout)).await;
    Ok(acknowledge("checkouts/create", result))
}

/// Stored as completed, abandoned or updated depending on the checkout state.
#[instrument(skip_all, fields(shop = %webhook.shop))]
pub async fn checkouts_update(
    State(state): State<AppState>,
    webhook: ShopifyWebhook,
) -> Result<StatusCode, AppError> {
    let checkout: CheckoutPayload = webhook.json()?;
    let result = store_event(&state, &webhook, events::checkout_updated(&checkout)).await;
    Ok(acknowledge("checkouts/update", result))
}

#[instrument(skip_all, fields(shop = %webhook.shop))]
pub async fn checkouts_delete(
    State(state): State<AppState>,
    webhook: ShopifyWebhook,
) -> Result<StatusCode, AppError> {
    let checkout: CheckoutPayload = webhook.json()?;
    let result = store_event(&state, &webhook, events::checkout_deleted(&checkout)).await;
    Ok(acknowledge("checkouts/delete", result))
}

#[instrument(skip_all, fields(shop = %webhook.shop))]
pub async fn draft_orders_create(
    State(state): State<AppState>,
    webhook: ShopifyWebhook,
) -> Result<StatusCode, AppError> {
    let draft: DraftOrderPayload = webhook.json()?;
    let result = store_event(&state, &webhook, events::draft_order_created(&draft)).await;
    Ok(acknowledge("draft_orders/create", result))
}
