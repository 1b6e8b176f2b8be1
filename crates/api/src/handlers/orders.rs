//! Handlers for orders: storefront creation and the admin lifecycle.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use kct_core::checkout::{normalize_line_items, validate_session_id};
use kct_core::contact::validate_email;
use kct_core::error::CoreError;
use kct_core::notifications::{Severity, KIND_ORDER_CREATED};
use kct_core::order_status::{parse_status, validate_transition};
use kct_core::types::DbId;
use kct_db::models::admin_notification::CreateAdminNotification;
use kct_db::models::order::{CreateOrder, Order, OrderCreation, OrderDetail};
use kct_db::repositories::OrderRepo;
use kct_integrations::shipping::Address;
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::middleware::rbac::RequireAdmin;
use crate::notify::{notify_admin, order_status_email, send_email};
use crate::query::resolve_page;
use crate::response::{ok, DataResponse};
use crate::state::AppState;

/// Query parameters for `GET /admin/orders`.
#[derive(Debug, Deserialize)]
pub struct OrderListParams {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Body of `PATCH /admin/orders/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatus {
    pub status: String,
    pub note: Option<String>,
}

/// POST /api/v1/orders
///
/// Turn a reserved checkout session into a pending, unpaid order. Every item
/// must be covered by the session's active reservations.
pub async fn create_order(
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateOrder>,
) -> AppResult<(StatusCode, Json<DataResponse<OrderDetail>>)> {
    validate_session_id(&input.session_id)?;
    let items = normalize_line_items(&input.items)?;
    let customer_email = validate_email("customer_email", &input.customer_email)?;
    serde_json::from_value::<Address>(input.shipping_address.clone()).map_err(|e| {
        CoreError::Validation(format!("shipping_address is not a valid address: {e}"))
    })?;

    let input = CreateOrder {
        session_id: input.session_id.trim().to_string(),
        customer_email,
        customer_name: input
            .customer_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        items: items.clone(),
        ..input
    };

    let detail = match OrderRepo::create_from_session(&state.pool, &input, &items).await? {
        OrderCreation::Created(detail) => detail,
        OrderCreation::NotReserved { variant_ids } => {
            let ids: Vec<String> = variant_ids.iter().map(|id| id.to_string()).collect();
            return Err(AppError::Core(CoreError::Conflict(format!(
                "Items are not reserved for this session (variant ids: {}). Validate the checkout again",
                ids.join(", ")
            ))));
        }
    };

    let order = &detail.order;
    tracing::info!(
        order_id = order.id,
        order_number = %order.order_number,
        total_cents = order.total_cents,
        items = detail.items.len(),
        "Order created"
    );

    notify_admin(
        &state,
        CreateAdminNotification {
            kind: KIND_ORDER_CREATED,
            severity: Severity::Info,
            title: format!("New order {}", order.order_number),
            message: format!(
                "{} placed an order for ${:.2}",
                order.customer_email,
                order.total_cents as f64 / 100.0
            ),
            data: json!({ "order_id": order.id, "order_number": order.order_number }),
        },
    )
    .await;

    Ok((StatusCode::CREATED, ok(detail)))
}

/// GET /api/v1/admin/orders
pub async fn list_orders(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<OrderListParams>,
) -> AppResult<Json<DataResponse<Vec<Order>>>> {
    let status = match params.status.as_deref() {
        Some(raw) => Some(parse_status(raw)?.as_str()),
        None => None,
    };
    let (limit, offset) = resolve_page(params.limit, params.offset);
    let orders = OrderRepo::list(&state.pool, status, limit, offset).await?;
    Ok(ok(orders))
}

/// GET /api/v1/admin/orders/{id}
pub async fn get_order(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<OrderDetail>>> {
    let detail = OrderRepo::find_detail(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound { entity: "Order", id })?;
    Ok(ok(detail))
}

/// PATCH /api/v1/admin/orders/{id}/status
///
/// Apply one step of the order lifecycle. Moves outside the transition
/// table are rejected with 409. The customer email afterwards is best effort.
pub async fn update_status(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<UpdateOrderStatus>,
) -> AppResult<Json<DataResponse<Order>>> {
    let next = parse_status(&input.status)?;
    let order = OrderRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound { entity: "Order", id })?;
    let current = validate_transition(&order.status, next)?;

    let note = input.note.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let updated = OrderRepo::transition(&state.pool, id, current, next, note, &admin.actor())
        .await?
        .ok_or_else(|| {
            CoreError::Conflict("Order status changed concurrently, reload and retry".into())
        })?;

    tracing::info!(order_id = id, from = %current, to = %next, by = %admin.actor(), "Order status updated");

    send_email(&state, order_status_email(&updated, next)).await;

    Ok(ok(updated))
}
