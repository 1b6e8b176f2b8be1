//! Admin notification feed.

mod common;

use axum::http::StatusCode;
use common::{admin_token, expect_data, get_auth, post_json_auth};
use kct_core::types::{DbId, Timestamp};
use serde_json::json;
use sqlx::PgPool;

async fn seed_notification(pool: &PgPool, title: &str) -> DbId {
    let (id,): (DbId,) = sqlx::query_as(
        "INSERT INTO admin_notifications (kind, title, message) \
         VALUES ('order_created', $1, 'A new order arrived') RETURNING id",
    )
    .bind(title)
    .fetch_one(pool)
    .await
    .unwrap();
    id
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unread_count_and_mark_read(pool: PgPool) {
    let first = seed_notification(&pool, "Order 1").await;
    seed_notification(&pool, "Order 2").await;
    let app = common::build_test_app(pool.clone());

    let data = expect_data(
        get_auth(app.clone(), "/api/v1/admin/notifications/unread-count", &admin_token()).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(data["unread_count"], 2);

    let response = post_json_auth(
        app.clone(),
        &format!("/api/v1/admin/notifications/{first}/read"),
        json!({}),
        &admin_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Already read.
    let response = post_json_auth(
        app.clone(),
        &format!("/api/v1/admin/notifications/{first}/read"),
        json!({}),
        &admin_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let unread = expect_data(
        get_auth(app, "/api/v1/admin/notifications?unread_only=true", &admin_token()).await,
        StatusCode::OK,
    )
    .await;
    let unread = unread.as_array().unwrap();
    assert_eq!(unread.len(), 1);
    assert_eq!(unread[0]["title"], "Order 2");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn mark_all_read_preserves_earlier_read_at(pool: PgPool) {
    let early = seed_notification(&pool, "Earlier").await;
    seed_notification(&pool, "Later").await;
    sqlx::query(
        "UPDATE admin_notifications SET is_read = true, read_at = NOW() - INTERVAL '2 days' \
         WHERE id = $1",
    )
    .bind(early)
    .execute(&pool)
    .await
    .unwrap();
    let (before,): (Timestamp,) =
        sqlx::query_as("SELECT read_at FROM admin_notifications WHERE id = $1")
            .bind(early)
            .fetch_one(&pool)
            .await
            .unwrap();

    let app = common::build_test_app(pool.clone());
    let data = expect_data(
        post_json_auth(app, "/api/v1/admin/notifications/read-all", json!({}), &admin_token()).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(data["marked_read"], 1);

    let (after,): (Timestamp,) =
        sqlx::query_as("SELECT read_at FROM admin_notifications WHERE id = $1")
            .bind(early)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(before, after);

    let (unread,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM admin_notifications WHERE NOT is_read OR read_at IS NULL")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(unread, 0);
}
