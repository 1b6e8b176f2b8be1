//! Handlers for `/admin/inventory`: stock levels, low-stock alerts and the
//! reservation sweep.

use axum::extract::{Path, Query, State};
use axum::Json;
use kct_core::error::CoreError;
use kct_core::stock::{validate_stock_quantity, validate_threshold};
use kct_core::types::DbId;
use kct_db::models::low_stock_alert::{LowStockAlert, ALERT_OPEN, ALERT_RESOLVED};
use kct_db::models::product::{EffectiveVariant, ProductVariant, UpdateVariantStock};
use kct_db::repositories::{LowStockAlertRepo, VariantRepo};
use kct_sync::low_stock::{run_low_stock_scan, LowStockReport};
use kct_sync::reservations::sweep_expired_reservations;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::middleware::rbac::RequireAdmin;
use crate::query::resolve_page;
use crate::response::{ok, DataResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VariantQuery {
    pub low_stock_only: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AlertQuery {
    /// `open` or `resolved`; all alerts when absent.
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub removed: u64,
}

/// GET /api/v1/admin/inventory/variants
///
/// Reads the effective-availability view (on hand minus committed minus
/// active holds).
pub async fn list_variants(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<VariantQuery>,
) -> AppResult<Json<DataResponse<Vec<EffectiveVariant>>>> {
    let (limit, offset) = resolve_page(params.limit, params.offset);
    let variants = VariantRepo::list_effective(
        &state.pool,
        params.low_stock_only.unwrap_or(false),
        limit,
        offset,
    )
    .await?;
    Ok(ok(variants))
}

/// PATCH /api/v1/admin/inventory/variants/{id}
pub async fn update_variant(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<UpdateVariantStock>,
) -> AppResult<Json<DataResponse<ProductVariant>>> {
    if input.available_quantity.is_none() && input.low_stock_threshold.is_none() {
        return Err(AppError::Core(CoreError::Validation(
            "Provide available_quantity and/or low_stock_threshold".into(),
        )));
    }
    if let Some(quantity) = input.available_quantity {
        validate_stock_quantity(quantity)?;
    }
    if let Some(threshold) = input.low_stock_threshold {
        validate_threshold(threshold)?;
    }

    let variant = VariantRepo::update_stock(&state.pool, id, &input)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Variant",
            id,
        })?;

    tracing::info!(
        variant_id = id,
        available_quantity = variant.available_quantity,
        low_stock_threshold = variant.low_stock_threshold,
        stock_status = %variant.stock_status,
        by = %admin.actor(),
        "Variant stock updated"
    );
    Ok(ok(variant))
}

/// POST /api/v1/admin/inventory/low-stock-scan
pub async fn low_stock_scan(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<LowStockReport>>> {
    let report = run_low_stock_scan(&state.pool).await?;
    Ok(ok(report))
}

/// GET /api/v1/admin/inventory/alerts
pub async fn list_alerts(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<AlertQuery>,
) -> AppResult<Json<DataResponse<Vec<LowStockAlert>>>> {
    let status = params.status.as_deref();
    if let Some(s) = status {
        if s != ALERT_OPEN && s != ALERT_RESOLVED {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Invalid status '{s}'. Must be one of: {ALERT_OPEN}, {ALERT_RESOLVED}"
            ))));
        }
    }
    let (limit, offset) = resolve_page(params.limit, params.offset);
    let alerts = LowStockAlertRepo::list(&state.pool, status, limit, offset).await?;
    Ok(ok(alerts))
}

/// POST /api/v1/admin/inventory/reservations/sweep
pub async fn sweep_reservations(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<SweepResponse>>> {
    let removed = sweep_expired_reservations(&state.pool).await?;
    Ok(ok(SweepResponse { removed }))
}
