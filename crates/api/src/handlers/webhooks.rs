//! Inbound webhooks from Shopify, Stripe and EasyPost.
//!
//! Every endpoint reads the raw body and verifies the signature before
//! anything else; a bad or missing signature is a 401 with no database
//! write. Verified deliveries are logged in `webhook_events`, keyed by the
//! provider's event id, so a redelivery of a processed event is acknowledged
//! without running it again.

use std::future::Future;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use kct_core::error::CoreError;
use kct_core::notifications::{
    Severity, KIND_PAYMENT_FAILED, KIND_PAYMENT_SUCCEEDED, KIND_SHIPPING_EXCEPTION,
};
use kct_core::order_status::{validate_transition, OrderStatus};
use kct_core::shipping::{order_status_for_tracker, tracker_needs_attention};
use kct_core::signatures::{
    verify_easypost, verify_shopify, verify_stripe, SignatureError, STRIPE_TOLERANCE_SECS,
};
use kct_core::types::DbId;
use kct_db::models::admin_notification::CreateAdminNotification;
use kct_db::models::webhook_event::{SOURCE_EASYPOST, SOURCE_SHOPIFY, SOURCE_STRIPE};
use kct_db::repositories::{OrderRepo, PartyMemberRepo, PaymentRepo, WebhookEventRepo};
use kct_sync::webhook::{
    apply_inventory_level, apply_product_payload, InventoryLevelPayload, ProductPayload,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::notify::{notify_admin, order_status_email, send_email};
use crate::response::{ok, DataResponse};
use crate::state::AppState;

/// Actor recorded in order history for provider-driven changes.
const ACTOR_STRIPE: &str = "webhook:stripe";
const ACTOR_EASYPOST: &str = "webhook:easypost";

/// Acknowledgement body.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    /// The event was already processed earlier.
    pub duplicate: bool,
    pub event_type: String,
}

#[derive(Debug, Deserialize)]
struct StripeEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct EasyPostEvent {
    id: String,
    description: String,
    #[serde(default)]
    result: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Shopify
// ---------------------------------------------------------------------------

/// POST /api/v1/webhooks/shopify
///
/// `inventory_levels/update` refreshes vendor and internal stock;
/// `products/create` and `products/update` upsert the mirrored product.
/// Other topics are acknowledged and ignored.
pub async fn shopify(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<DataResponse<WebhookAck>>> {
    let secret = configured_secret(state.config.webhooks.shopify.as_deref(), "Shopify")?;
    verify_shopify(secret, &body, header(&headers, "x-shopify-hmac-sha256"))
        .map_err(rejected)?;

    let topic = required_header(&headers, "x-shopify-topic")?.to_string();
    let external_id = required_header(&headers, "x-shopify-webhook-id")?.to_string();
    let payload: serde_json::Value = parse_body(&body)?;

    record_and_process(&state, SOURCE_SHOPIFY, &external_id, &topic, &payload, || {
        process_shopify(&state, &topic, &payload)
    })
    .await
}

async fn process_shopify(
    state: &AppState,
    topic: &str,
    payload: &serde_json::Value,
) -> AppResult<()> {
    match topic {
        "inventory_levels/update" => {
            let level: InventoryLevelPayload = from_payload(payload)?;
            let (vendor_updated, internal_updated) =
                apply_inventory_level(
                    &state.pool,
                    state.integrations.catalog.as_deref(),
                    &level,
                )
                .await?;
            tracing::info!(
                inventory_item_id = level.inventory_item_id,
                available = ?level.available,
                vendor_updated,
                internal_updated,
                "Inventory level applied from webhook"
            );
        }
        "products/create" | "products/update" => {
            let product: ProductPayload = from_payload(payload)?;
            apply_product_payload(&state.pool, &product).await?;
        }
        other => tracing::debug!(topic = other, "Ignoring Shopify topic"),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Stripe
// ---------------------------------------------------------------------------

/// POST /api/v1/webhooks/stripe
///
/// `payment_intent.succeeded` settles the payment, its order and its
/// wedding members; `payment_intent.payment_failed` records the failure.
pub async fn stripe(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<DataResponse<WebhookAck>>> {
    let secret = configured_secret(state.config.webhooks.stripe.as_deref(), "Stripe")?;
    verify_stripe(
        secret,
        &body,
        header(&headers, "stripe-signature"),
        chrono::Utc::now().timestamp(),
        STRIPE_TOLERANCE_SECS,
    )
    .map_err(rejected)?;

    let payload: serde_json::Value = parse_body(&body)?;
    let event: StripeEvent = from_payload(&payload)?;

    record_and_process(&state, SOURCE_STRIPE, &event.id, &event.event_type, &payload, || {
        process_stripe(&state, &event)
    })
    .await
}

async fn process_stripe(state: &AppState, event: &StripeEvent) -> AppResult<()> {
    let intent = &event.data.object;
    let Some(intent_id) = intent.get("id").and_then(|v| v.as_str()) else {
        return Err(AppError::BadRequest("Stripe event object has no id".into()));
    };

    match event.event_type.as_str() {
        "payment_intent.succeeded" => payment_succeeded(state, intent_id).await,
        "payment_intent.payment_failed" => {
            let message = intent
                .pointer("/last_payment_error/message")
                .and_then(|v| v.as_str());
            payment_failed(state, intent_id, message).await
        }
        other => {
            tracing::debug!(event_type = other, "Ignoring Stripe event");
            Ok(())
        }
    }
}

/// The payment, its order and its members change in one transaction, so a
/// failure part way leaves the payment unsettled and the redelivery applies
/// everything again.
async fn payment_succeeded(state: &AppState, intent_id: &str) -> AppResult<()> {
    let mut tx = state.pool.begin().await?;

    let Some(payment) = PaymentRepo::mark_succeeded(&mut tx, intent_id).await? else {
        tx.rollback().await?;
        if PaymentRepo::find_by_intent_id(&state.pool, intent_id).await?.is_none() {
            tracing::warn!(intent_id, "Succeeded intent has no payment row");
        }
        return Ok(());
    };

    let paid_order = match payment.order_id {
        Some(order_id) => {
            let paid = OrderRepo::mark_paid_in_tx(&mut tx, order_id, ACTOR_STRIPE).await?;
            if paid.is_none() {
                tracing::warn!(order_id, intent_id, "Order was not unpaid when payment succeeded");
            }
            paid
        }
        None => None,
    };

    let members_marked = if payment.member_ids.is_empty() {
        0
    } else {
        PartyMemberRepo::mark_paid(&mut tx, &payment.member_ids).await?
    };

    tx.commit().await?;

    if let Some(paid) = paid_order {
        tracing::info!(order_id = paid.order.id, confirmed = paid.confirmed, "Order paid");
        if paid.confirmed {
            send_email(state, order_status_email(&paid.order, OrderStatus::Confirmed)).await;
        }
    }
    if !payment.member_ids.is_empty() {
        tracing::info!(
            intent_id,
            members = payment.member_ids.len(),
            marked = members_marked,
            "Wedding members paid"
        );
    }

    notify_admin(
        state,
        CreateAdminNotification {
            kind: KIND_PAYMENT_SUCCEEDED,
            severity: Severity::Info,
            title: format!("Payment received: ${:.2}", payment.amount_cents as f64 / 100.0),
            message: payment_summary(payment.payment_type.as_str(), payment.order_id, &payment.member_ids),
            data: json!({
                "payment_id": payment.id,
                "payment_intent_id": intent_id,
                "payment_type": payment.payment_type,
                "order_id": payment.order_id,
                "wedding_id": payment.wedding_id,
                "member_ids": payment.member_ids,
                "amount_cents": payment.amount_cents,
            }),
        },
    )
    .await;
    Ok(())
}

async fn payment_failed(state: &AppState, intent_id: &str, message: Option<&str>) -> AppResult<()> {
    let Some(payment) = PaymentRepo::mark_failed(&state.pool, intent_id, message).await? else {
        return Ok(());
    };
    tracing::warn!(intent_id, reason = ?message, "Payment failed");

    notify_admin(
        state,
        CreateAdminNotification {
            kind: KIND_PAYMENT_FAILED,
            severity: Severity::Warning,
            title: format!("Payment failed: ${:.2}", payment.amount_cents as f64 / 100.0),
            message: format!(
                "{}. {}",
                payment_summary(payment.payment_type.as_str(), payment.order_id, &payment.member_ids),
                message.unwrap_or("No reason given")
            ),
            data: json!({
                "payment_id": payment.id,
                "payment_intent_id": intent_id,
                "order_id": payment.order_id,
                "wedding_id": payment.wedding_id,
            }),
        },
    )
    .await;
    Ok(())
}

fn payment_summary(payment_type: &str, order_id: Option<DbId>, member_ids: &[DbId]) -> String {
    match (order_id, member_ids.len()) {
        (Some(order_id), _) => format!("{payment_type} payment for order {order_id}"),
        (None, 1) => format!("{payment_type} payment for member {}", member_ids[0]),
        (None, n) => format!("{payment_type} payment for {n} members"),
    }
}

// ---------------------------------------------------------------------------
// EasyPost
// ---------------------------------------------------------------------------

/// POST /api/v1/webhooks/easypost
///
/// `tracker.updated` moves the order with that tracking number to
/// `shipped` or `delivered` when the transition is valid; carrier failures
/// raise an admin notification instead.
pub async fn easypost(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<DataResponse<WebhookAck>>> {
    let secret = configured_secret(state.config.webhooks.easypost.as_deref(), "EasyPost")?;
    verify_easypost(secret, &body, header(&headers, "x-hmac-signature")).map_err(rejected)?;

    let payload: serde_json::Value = parse_body(&body)?;
    let event: EasyPostEvent = from_payload(&payload)?;

    record_and_process(&state, SOURCE_EASYPOST, &event.id, &event.description, &payload, || {
        process_easypost(&state, &event)
    })
    .await
}

async fn process_easypost(state: &AppState, event: &EasyPostEvent) -> AppResult<()> {
    if event.description != "tracker.updated" {
        tracing::debug!(description = %event.description, "Ignoring EasyPost event");
        return Ok(());
    }
    let tracking_code = event.result.get("tracking_code").and_then(|v| v.as_str());
    let tracker_status = event.result.get("status").and_then(|v| v.as_str());
    let (Some(tracking_code), Some(tracker_status)) = (tracking_code, tracker_status) else {
        return Err(AppError::BadRequest(
            "tracker.updated event without tracking_code or status".into(),
        ));
    };

    let Some(order) = OrderRepo::find_by_tracking_number(&state.pool, tracking_code).await? else {
        tracing::debug!(tracking_code, "No order for tracker");
        return Ok(());
    };

    if tracker_needs_attention(tracker_status) {
        tracing::warn!(order_id = order.id, tracking_code, tracker_status, "Shipment needs attention");
        notify_admin(
            state,
            CreateAdminNotification {
                kind: KIND_SHIPPING_EXCEPTION,
                severity: Severity::Warning,
                title: format!("Shipping problem on {}", order.order_number),
                message: format!("Tracker {tracking_code} reported '{tracker_status}'"),
                data: json!({
                    "order_id": order.id,
                    "tracking_number": tracking_code,
                    "tracker_status": tracker_status,
                }),
            },
        )
        .await;
        return Ok(());
    }

    let Some(next) = order_status_for_tracker(tracker_status) else {
        return Ok(());
    };
    if order.status == next.as_str() {
        return Ok(());
    }
    let current = match validate_transition(&order.status, next) {
        Ok(current) => current,
        Err(e) => {
            tracing::debug!(order_id = order.id, tracker_status, error = %e, "Tracker update not applicable");
            return Ok(());
        }
    };

    let note = format!("Carrier reported '{tracker_status}'");
    if let Some(updated) =
        OrderRepo::transition(&state.pool, order.id, current, next, Some(&note), ACTOR_EASYPOST)
            .await?
    {
        tracing::info!(order_id = order.id, from = %current, to = %next, "Order status updated from tracker");
        send_email(state, order_status_email(&updated, next)).await;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Shared plumbing
// ---------------------------------------------------------------------------

/// Record the delivery and run `process` unless it was already processed.
///
/// A processing error is stored on the event row and returned, so the
/// provider retries and the retry runs again.
async fn record_and_process<F, Fut>(
    state: &AppState,
    source: &'static str,
    external_id: &str,
    event_type: &str,
    payload: &serde_json::Value,
    process: F,
) -> AppResult<Json<DataResponse<WebhookAck>>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = AppResult<()>>,
{
    let ack = |duplicate| {
        ok(WebhookAck {
            received: true,
            duplicate,
            event_type: event_type.to_string(),
        })
    };

    let Some(event_id) =
        WebhookEventRepo::record(&state.pool, source, external_id, event_type, payload).await?
    else {
        tracing::info!(source, external_id, event_type, "Duplicate webhook acknowledged");
        return Ok(ack(true));
    };

    match process().await {
        Ok(()) => {
            WebhookEventRepo::mark_processed(&state.pool, event_id).await?;
            tracing::info!(source, external_id, event_type, "Webhook processed");
            Ok(ack(false))
        }
        Err(e) => {
            tracing::error!(source, external_id, event_type, error = %e, "Webhook processing failed");
            if let Err(db_err) =
                WebhookEventRepo::mark_failed(&state.pool, event_id, &e.to_string()).await
            {
                tracing::warn!(event_id, error = %db_err, "Failed to record webhook failure");
            }
            Err(e)
        }
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn required_header<'a>(headers: &'a HeaderMap, name: &str) -> AppResult<&'a str> {
    header(headers, name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("Missing {name} header")))
}

/// An unset secret rejects every delivery rather than trusting it.
fn configured_secret<'a>(secret: Option<&'a str>, service: &str) -> AppResult<&'a str> {
    secret.ok_or_else(|| {
        tracing::warn!(service, "Webhook received but no signing secret is configured");
        AppError::Core(CoreError::Unauthorized(format!(
            "{service} webhook signing secret is not configured"
        )))
    })
}

fn rejected(err: SignatureError) -> AppError {
    tracing::warn!(error = %err, "Webhook signature rejected");
    AppError::Core(CoreError::Unauthorized(format!(
        "Invalid webhook signature: {err}"
    )))
}

fn parse_body(body: &[u8]) -> AppResult<serde_json::Value> {
    serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Webhook body is not valid JSON: {e}")))
}

fn from_payload<T: serde::de::DeserializeOwned>(payload: &serde_json::Value) -> AppResult<T> {
    T::deserialize(payload)
        .map_err(|e| AppError::BadRequest(format!("Unexpected webhook payload: {e}")))
}
