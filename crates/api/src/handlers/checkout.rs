//! Handlers for `/checkout`: validate-and-reserve and release.
//!
//! Public endpoints; the storefront identifies a cart by `session_id`.

use axum::extract::State;
use axum::Json;
use kct_core::checkout::{normalize_line_items, validate_session_id, LineItem};
use kct_core::types::DbId;
use kct_db::models::reservation::ReservationOutcome;
use kct_db::repositories::ReservationRepo;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::response::{ok, DataResponse};
use crate::state::AppState;

/// Body of `POST /checkout/validate`.
#[derive(Debug, Deserialize)]
pub struct ValidateCheckout {
    pub items: Vec<LineItem>,
    pub session_id: String,
    pub user_id: Option<String>,
    pub order_id: Option<DbId>,
}

#[derive(Debug, Deserialize)]
pub struct ReleaseCheckout {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct ReleaseResponse {
    pub released: u64,
}

/// POST /api/v1/checkout/validate
///
/// Check every item against effective availability and reserve the whole
/// batch for 15 minutes, or nothing at all. The session's previous holds are
/// replaced.
pub async fn validate(
    State(state): State<AppState>,
    AppJson(input): AppJson<ValidateCheckout>,
) -> AppResult<Json<DataResponse<ReservationOutcome>>> {
    validate_session_id(&input.session_id)?;
    let items = normalize_line_items(&input.items)?;
    let session_id = input.session_id.trim();

    let swept = ReservationRepo::sweep_expired(&state.pool).await?;
    if swept > 0 {
        tracing::debug!(swept, "Expired reservations removed before checkout");
    }

    let outcome = ReservationRepo::reserve_batch(
        &state.pool,
        session_id,
        input.user_id.as_deref(),
        input.order_id,
        &items,
    )
    .await?;

    tracing::info!(
        session_id,
        items = items.len(),
        valid = outcome.valid,
        reserved = outcome.reservations.len(),
        "Checkout validated"
    );

    Ok(ok(outcome))
}

/// POST /api/v1/checkout/release
///
/// Drop the session's holds (cart abandoned or emptied).
pub async fn release(
    State(state): State<AppState>,
    AppJson(input): AppJson<ReleaseCheckout>,
) -> AppResult<Json<DataResponse<ReleaseResponse>>> {
    validate_session_id(&input.session_id)?;
    let released = ReservationRepo::release_session(&state.pool, input.session_id.trim()).await?;

    tracing::info!(session_id = input.session_id.trim(), released, "Checkout reservations released");

    Ok(ok(ReleaseResponse { released }))
}
