//! Handlers for `/admin/notifications`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use kct_core::error::CoreError;
use kct_core::types::DbId;
use kct_db::models::admin_notification::AdminNotification;
use kct_db::repositories::AdminNotificationRepo;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::query::resolve_page;
use crate::response::{ok, DataResponse};
use crate::state::AppState;

/// Query parameters for `GET /admin/notifications`.
#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    /// If `true`, return only unread notifications. Defaults to `false`.
    pub unread_only: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub unread_count: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub marked_read: u64,
}

/// GET /api/v1/admin/notifications
pub async fn list_notifications(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<NotificationQuery>,
) -> AppResult<Json<DataResponse<Vec<AdminNotification>>>> {
    let (limit, offset) = resolve_page(params.limit, params.offset);
    let unread_only = params.unread_only.unwrap_or(false);

    let notifications =
        AdminNotificationRepo::list(&state.pool, unread_only, limit, offset).await?;
    Ok(ok(notifications))
}

/// GET /api/v1/admin/notifications/unread-count
pub async fn unread_count(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<UnreadCount>>> {
    let unread_count = AdminNotificationRepo::unread_count(&state.pool).await?;
    Ok(ok(UnreadCount { unread_count }))
}

/// POST /api/v1/admin/notifications/{id}/read
///
/// Returns 204 No Content, or 404 if the notification does not exist or was
/// already read.
pub async fn mark_read(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(notification_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let found = AdminNotificationRepo::mark_read(&state.pool, notification_id).await?;

    if !found {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Unread notification",
            id: notification_id,
        }));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/admin/notifications/read-all
///
/// Mark every unread notification read. Rows read earlier keep their
/// `read_at`.
pub async fn mark_all_read(
    admin: RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<MarkedRead>>> {
    let marked_read = AdminNotificationRepo::mark_all_read(&state.pool).await?;
    tracing::info!(marked_read, by = %admin.actor(), "Notifications marked read");
    Ok(ok(MarkedRead { marked_read }))
}
