//! Webhook payloads → append-only events.
//!
//! Builders are pure; [`record`] resolves the customer by email and stores
//! the event.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Value, json};
use storepulse_core::{Email, EventType, ExternalId, TenantContext, parse_amount};
use tracing::instrument;

use crate::db::{RepositoryError, Store};
use crate::models::{Event, NewEvent};
use crate::shopify::{CartPayload, CheckoutPayload, DraftOrderPayload, LineItemPayload};

/// An event before customer resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub event_type: EventType,
    pub external_id: Option<ExternalId>,
    pub customer_email: Option<String>,
    pub data: Value,
}

fn money(value: Decimal) -> Value {
    value.to_f64().map_or(Value::Null, Value::from)
}

fn external_id(id: Option<&String>) -> Option<ExternalId> {
    id.filter(|s| !s.is_empty()).map(ExternalId::new)
}

/// The payload id as Shopify sent it: numeric ids stay numbers.
fn raw_id(id: Option<&String>) -> Value {
    match id {
        Some(id) => id.parse::<u64>().map_or_else(|_| Value::from(id.as_str()), Value::from),
        None => Value::Null,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

fn parse_time(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|t| t.with_timezone(&Utc))
}

fn item_summary(item: &LineItemPayload) -> Value {
    json!({
        "title": item.title,
        "quantity": item.quantity,
        "price": item.price,
    })
}

fn item_ids(item: &LineItemPayload) -> Value {
    json!({
        "productId": item.product_id,
        "variantId": item.variant_id,
        "quantity": item.quantity,
        "price": item.price,
    })
}

fn item_with_variant(item: &LineItemPayload) -> Value {
    json!({
        "title": item.title,
        "quantity": item.quantity,
        "price": item.price,
        "variant_title": item.variant_title,
    })
}

/// `carts/create`: recorded as `cart_abandoned`.
#[must_use]
pub fn cart_created(cart: &CartPayload) -> EventDraft {
    EventDraft {
        event_type: EventType::CartAbandoned,
        external_id: external_id(cart.id.as_ref()),
        customer_email: cart.email.clone(),
        data: json!({
            "cartValue": cart.total_price,
            "itemCount": cart.line_items.len(),
            "currency": cart.currency,
            "abandonedAt": cart.updated_at,
            "cartToken": cart.token,
            "items": cart.line_items.iter().map(item_summary).collect::<Vec<_>>(),
        }),
    }
}

/// Sum of `price × quantity` over line items; unparseable prices count as 0.
///
/// Saturates at the `Decimal` bounds instead of overflowing.
#[must_use]
pub fn cart_value(items: &[LineItemPayload]) -> Decimal {
    items.iter().fold(Decimal::ZERO, |total, item| {
        let line =
            parse_amount(item.price.as_deref()).saturating_mul(Decimal::from(item.quantity));
        total.saturating_add(line)
    })
}

/// `carts/update`: recorded as `cart_updated`.
#[must_use]
pub fn cart_updated(cart: &CartPayload) -> EventDraft {
    EventDraft {
        event_type: EventType::CartUpdated,
        external_id: external_id(cart.id.as_ref()),
        customer_email: cart.email.clone(),
        data: json!({
            "cartId": raw_id(cart.id.as_ref()),
            "itemCount": cart.line_items.len(),
            "totalValue": money(cart_value(&cart.line_items)),
            "lineItems": cart.line_items.iter().map(item_ids).collect::<Vec<_>>(),
        }),
    }
}

/// `checkouts/create`: recorded as `checkout_started`.
#[must_use]
pub fn checkout_created(checkout: &CheckoutPayload) -> EventDraft {
    EventDraft {
        event_type: EventType::CheckoutStarted,
        external_id: external_id(checkout.id.as_ref()),
        customer_email: checkout.email.clone(),
        data: json!({
            "checkoutValue": checkout.total_price,
            "itemCount": checkout.line_items.len(),
            "currency": checkout.currency,
            "startedAt": checkout.created_at,
            "checkoutToken": checkout.token,
            "shippingAddress": checkout.shipping_address,
            "items": checkout.line_items.iter().map(item_with_variant).collect::<Vec<_>>(),
        }),
    }
}

/// Event type for a checkout update: completed, abandoned, or just updated.
#[must_use]
pub fn checkout_update_type(checkout: &CheckoutPayload) -> EventType {
    if non_empty(checkout.completed_at.as_deref()).is_some() {
        EventType::CheckoutCompleted
    } else if non_empty(checkout.abandoned_checkout_url.as_deref()).is_some() {
        EventType::CheckoutAbandoned
    } else {
        EventType::CheckoutUpdated
    }
}

/// `checkouts/update`.
#[must_use]
pub fn checkout_updated(checkout: &CheckoutPayload) -> EventDraft {
    let abandoned_at = non_empty(checkout.abandoned_checkout_url.as_deref())
        .and(checkout.updated_at.as_deref());
    EventDraft {
        event_type: checkout_update_type(checkout),
        external_id: external_id(checkout.id.as_ref()),
        customer_email: checkout.email.clone(),
        data: json!({
            "checkoutValue": checkout.total_price,
            "itemCount": checkout.line_items.len(),
            "currency": checkout.currency,
            "updatedAt": checkout.updated_at,
            "completedAt": checkout.completed_at,
            "abandonedAt": abandoned_at,
            "checkoutToken": checkout.token,
            "shippingAddress": checkout.shipping_address,
            "billingAddress": checkout.billing_address,
            "paymentGatewayNames": checkout.payment_gateway_names,
            "items": checkout.line_items.iter().map(item_with_variant).collect::<Vec<_>>(),
        }),
    }
}

/// Milliseconds between checkout creation and its last update.
///
/// `None` when either timestamp is missing or unparseable.
#[must_use]
pub fn time_to_abandon_ms(checkout: &CheckoutPayload) -> Option<i64> {
    let created = parse_time(checkout.created_at.as_deref())?;
    let updated = parse_time(checkout.updated_at.as_deref())?;
    Some((updated - created).num_milliseconds())
}

/// `checkouts/delete`: recorded as `checkout_abandoned`.
#[must_use]
pub fn checkout_deleted(checkout: &CheckoutPayload) -> EventDraft {
    let email = checkout.customer.as_ref().and_then(|c| c.email.clone());
    let line_items: Vec<Value> = checkout
        .line_items
        .iter()
        .map(|item| {
            json!({
                "productId": item.product_id,
                "variantId": item.variant_id,
                "quantity": item.quantity,
                "price": item.price,
                "title": item.title,
            })
        })
        .collect();

    EventDraft {
        event_type: EventType::CheckoutAbandoned,
        external_id: external_id(checkout.id.as_ref()),
        customer_email: email,
        data: json!({
            "checkoutId": raw_id(checkout.id.as_ref()),
            "abandonedValue": money(parse_amount(checkout.total_price.as_deref())),
            "abandonedItems": checkout.line_items.len(),
            "timeToAbandonMs": time_to_abandon_ms(checkout),
            "shippingAddress": checkout.shipping_address,
            "paymentMethod": checkout.gateway,
            "discountCodes": checkout.discount_codes,
            "lineItems": line_items,
        }),
    }
}

/// `draft_orders/create`: recorded as `draft_order_created`.
#[must_use]
pub fn draft_order_created(draft: &DraftOrderPayload) -> EventDraft {
    let email = non_empty(draft.email.as_deref())
        .or_else(|| {
            draft
                .customer
                .as_ref()
                .and_then(|c| non_empty(c.email.as_deref()))
        })
        .map(str::to_string);
    let total = non_empty(draft.total_price.as_deref())
        .or_else(|| non_empty(draft.subtotal_price.as_deref()));
    let line_items: Vec<Value> = draft
        .line_items
        .iter()
        .map(|item| {
            let price = non_empty(item.price.as_deref()).or_else(|| {
                item.applied_discount
                    .as_ref()
                    .and_then(|d| non_empty(d.value.as_deref()))
            });
            json!({
                "title": item.title,
                "quantity": item.quantity,
                "price": price,
                "productId": item.product_id,
                "variantId": item.variant_id,
            })
        })
        .collect();

    EventDraft {
        event_type: EventType::DraftOrderCreated,
        external_id: external_id(draft.id.as_ref()),
        customer_email: email,
        data: json!({
            "draftOrderId": raw_id(draft.id.as_ref()),
            "name": draft.name,
            "itemCount": draft.line_items.len(),
            "total": money(parse_amount(total)),
            "currency": draft.currency,
            "createdAt": draft.created_at,
            "invoiceUrl": draft.invoice_url,
            "status": draft.status,
            "lineItems": line_items,
        }),
    }
}

/// Store `draft`, linking the tenant's customer with the same email if any.
///
/// # Errors
///
/// Returns an error if the lookup or the insert fails.
#[instrument(skip(store, tenant, draft), fields(shop = %tenant.shop, event_type = %draft.event_type))]
pub async fn record(
    store: &dyn Store,
    tenant: &TenantContext,
    draft: EventDraft,
) -> Result<Event, RepositoryError> {
    let customer_id = match Email::from_payload(draft.customer_email.as_deref()) {
        Some(email) => store
            .find_customer_by_email(tenant, &email)
            .await?
            .map(|c| c.id),
        None => None,
    };

    let event = store
        .insert_event(
            tenant,
            &NewEvent {
                event_type: draft.event_type,
                external_id: draft.external_id,
                customer_email: draft.customer_email,
                data: draft.data,
                customer_id,
            },
        )
        .await?;

    tracing::info!(
        event_id = %event.id,
        customer = event.customer_email.as_deref().unwrap_or("guest"),
        "Stored event"
    );
    Ok(event)
}
