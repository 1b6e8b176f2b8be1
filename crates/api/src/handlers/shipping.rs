//! Admin shipping handlers: EasyPost rate quotes and label purchase.

use axum::extract::{Path, State};
use axum::Json;
use kct_core::error::CoreError;
use kct_core::order_status::{validate_transition, OrderStatus};
use kct_core::types::DbId;
use kct_db::models::order::{Order, ShippingLabel};
use kct_db::repositories::OrderRepo;
use kct_integrations::shipping::{Address, Parcel, Rate};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::middleware::rbac::RequireAdmin;
use crate::notify::{order_status_email, send_email};
use crate::response::{ok, DataResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RatesResponse {
    pub shipment_id: String,
    pub rates: Vec<Rate>,
    pub cheapest_rate_id: Option<String>,
}

/// Body of `POST /admin/orders/{id}/shipping/label`.
#[derive(Debug, Deserialize)]
pub struct BuyLabel {
    pub shipment_id: String,
    pub rate_id: String,
}

/// POST /api/v1/admin/orders/{id}/shipping/rates
///
/// Create an EasyPost shipment to the order's address (default suit box)
/// and return its rates. The shipment id is remembered on the order.
pub async fn quote_rates(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<RatesResponse>>> {
    let order = find_order(&state, id).await?;
    // Only an order that may still move to `shipped` needs a label.
    validate_transition(&order.status, OrderStatus::Shipped)?;
    let address = shipping_address(&order)?;

    let carrier = state.integrations.shipping()?;
    let shipment = carrier.create_shipment(&address, &Parcel::default()).await?;
    OrderRepo::set_shipment(&state.pool, id, &shipment.id).await?;

    tracing::info!(order_id = id, shipment_id = %shipment.id, rates = shipment.rates.len(), "Shipping rates quoted");

    let cheapest_rate_id = shipment.cheapest_rate().map(|r| r.id.clone());
    Ok(ok(RatesResponse {
        shipment_id: shipment.id,
        rates: shipment.rates,
        cheapest_rate_id,
    }))
}

/// POST /api/v1/admin/orders/{id}/shipping/label
///
/// Buy the chosen rate, store tracking details and move the order to
/// `shipped`. The customer email afterwards is best effort.
pub async fn buy_label(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<BuyLabel>,
) -> AppResult<Json<DataResponse<Order>>> {
    if input.shipment_id.trim().is_empty() || input.rate_id.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "shipment_id and rate_id are required".into(),
        )));
    }
    let order = find_order(&state, id).await?;
    let current = validate_transition(&order.status, OrderStatus::Shipped)?;

    let carrier = state.integrations.shipping()?;
    let label = carrier
        .buy_label(input.shipment_id.trim(), input.rate_id.trim())
        .await?;

    let stored = ShippingLabel {
        shipment_id: label.shipment_id.clone(),
        tracking_number: label.tracking_code.clone(),
        carrier: label.carrier.clone(),
        label_url: label.label_url.clone(),
    };
    let Some(updated) =
        OrderRepo::ship_with_label(&state.pool, id, current, &stored, &admin.actor()).await?
    else {
        // The label is bought; keep enough in the log to attach it by hand.
        tracing::error!(
            order_id = id,
            tracking_number = %label.tracking_code,
            label_url = %label.label_url,
            "Label purchased but order changed concurrently"
        );
        return Err(AppError::Core(CoreError::Conflict(
            "Order status changed while the label was purchased".into(),
        )));
    };

    tracing::info!(
        order_id = id,
        carrier = %label.carrier,
        tracking_number = %label.tracking_code,
        "Shipping label purchased"
    );

    send_email(&state, order_status_email(&updated, OrderStatus::Shipped)).await;

    Ok(ok(updated))
}

async fn find_order(state: &AppState, id: DbId) -> AppResult<Order> {
    Ok(OrderRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound { entity: "Order", id })?)
}

fn shipping_address(order: &Order) -> AppResult<Address> {
    let value = order.shipping_address.clone().ok_or_else(|| {
        CoreError::Validation(format!("Order {} has no shipping address", order.order_number))
    })?;
    serde_json::from_value(value).map_err(|e| {
        AppError::Core(CoreError::Validation(format!(
            "Order {} has an invalid shipping address: {e}",
            order.order_number
        )))
    })
}
