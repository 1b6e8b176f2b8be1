//! Handlers for `/admin/vendor`: the Shopify mirror, import decisions and
//! on-demand sync runs.

use axum::extract::{Path, Query, State};
use axum::Json;
use kct_core::error::CoreError;
use kct_core::pagination::{clamp_limit, ilike_pattern};
use kct_core::types::DbId;
use kct_core::vendor::{validate_import_status, SYNC_FAILED, SYNC_KIND_CATALOG, SYNC_KIND_INVENTORY};
use kct_db::models::vendor::{DecideVendorProduct, VendorProduct, VendorProductDetail, VendorSyncRun};
use kct_db::repositories::{SyncRunRepo, VendorRepo};
use kct_sync::catalog::{run_catalog_sync, SyncReport};
use kct_sync::import::{apply_decision, ImportOutcome};
use kct_sync::inventory::{run_inventory_sync, InventoryReport};
use kct_sync::notify_sync_failed;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::middleware::rbac::RequireAdmin;
use crate::query::resolve_page;
use crate::response::{ok, DataResponse};
use crate::state::AppState;

const DEFAULT_RUNS_LIMIT: i64 = 20;
const MAX_RUNS_LIMIT: i64 = 100;

/// Query parameters for `GET /admin/vendor/products`.
#[derive(Debug, Deserialize)]
pub struct VendorProductQuery {
    pub import_status: Option<String>,
    /// Case-insensitive substring of title or vendor.
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SyncRunQuery {
    pub kind: Option<String>,
    pub limit: Option<i64>,
}

/// GET /api/v1/admin/vendor/products
pub async fn list_products(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<VendorProductQuery>,
) -> AppResult<Json<DataResponse<Vec<VendorProduct>>>> {
    if let Some(status) = params.import_status.as_deref() {
        validate_import_status(status)?;
    }
    let pattern = params.search.as_deref().and_then(ilike_pattern);
    let (limit, offset) = resolve_page(params.limit, params.offset);

    let products = VendorRepo::list_products(
        &state.pool,
        params.import_status.as_deref(),
        pattern.as_deref(),
        limit,
        offset,
    )
    .await?;
    Ok(ok(products))
}

/// GET /api/v1/admin/vendor/products/{id}
pub async fn get_product(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<VendorProductDetail>>> {
    let detail = VendorRepo::find_detail(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Vendor product",
            id,
        })?;
    Ok(ok(detail))
}

/// POST /api/v1/admin/vendor/products/{id}/decision
///
/// `import` creates or refreshes the internal product and its variants;
/// `skip` only records the decision.
pub async fn decide(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<DecideVendorProduct>,
) -> AppResult<Json<DataResponse<ImportOutcome>>> {
    let outcome = apply_decision(&state.pool, id, &input)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Vendor product",
            id,
        })?;

    tracing::info!(
        vendor_product_id = id,
        decision = %input.decision,
        product_id = ?outcome.product.as_ref().map(|p| p.id),
        variants = outcome.variants.len(),
        by = %admin.actor(),
        "Vendor product decision recorded"
    );
    Ok(ok(outcome))
}

/// POST /api/v1/admin/vendor/sync
///
/// Run a full catalog sync now. A vendor failure still answers 200 with
/// `status = "failed"`; committed pages are kept.
pub async fn run_sync(
    admin: RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<SyncReport>>> {
    let source = state.integrations.catalog()?;
    tracing::info!(by = %admin.actor(), "Catalog sync triggered");

    let report = run_catalog_sync(&state.pool, source.as_ref(), &state.sync_options).await?;
    if report.status == SYNC_FAILED {
        notify_sync_failed(&state.pool, SYNC_KIND_CATALOG, report.run_id, report.error.as_deref())
            .await;
    }
    Ok(ok(report))
}

/// POST /api/v1/admin/vendor/inventory-sync
pub async fn run_inventory(
    admin: RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<InventoryReport>>> {
    let source = state.integrations.catalog()?;
    tracing::info!(by = %admin.actor(), "Inventory sync triggered");

    let report = run_inventory_sync(&state.pool, source.as_ref(), &state.sync_options).await?;
    if report.status == SYNC_FAILED {
        notify_sync_failed(&state.pool, SYNC_KIND_INVENTORY, report.run_id, report.error.as_deref())
            .await;
    }
    Ok(ok(report))
}

/// GET /api/v1/admin/vendor/sync-runs
pub async fn list_sync_runs(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<SyncRunQuery>,
) -> AppResult<Json<DataResponse<Vec<VendorSyncRun>>>> {
    let kind = match params.kind.as_deref() {
        None => None,
        Some(kind @ (SYNC_KIND_CATALOG | SYNC_KIND_INVENTORY)) => Some(kind),
        Some(other) => {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Invalid kind '{other}'. Must be one of: {SYNC_KIND_CATALOG}, {SYNC_KIND_INVENTORY}"
            ))))
        }
    };
    let limit = clamp_limit(params.limit, DEFAULT_RUNS_LIMIT, MAX_RUNS_LIMIT);
    let runs = SyncRunRepo::list_recent(&state.pool, kind, limit).await?;
    Ok(ok(runs))
}
