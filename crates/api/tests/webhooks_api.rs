//! Signed webhook deliveries from Shopify, Stripe and EasyPost.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use common::{
    count_rows, expect_data, post_raw, seed_member, seed_variant, seed_wedding, EASYPOST_SECRET,
    SHOPIFY_SECRET, STRIPE_SECRET,
};
use kct_core::signatures::{
    compute_easypost_header, compute_shopify_signature, compute_stripe_header,
};
use kct_core::signatures::STRIPE_TOLERANCE_SECS;
use kct_core::types::DbId;
use kct_db::repositories::WebhookEventRepo;
use kct_integrations::catalog::{CatalogPage, CatalogSource, InventoryLevel};
use kct_integrations::{IntegrationError, Integrations};
use serde_json::json;
use sqlx::PgPool;

/// Reports a fixed total for every inventory item, as if summed across
/// several locations.
struct SummedLevels(i32);

#[async_trait]
impl CatalogSource for SummedLevels {
    async fn fetch_products_page(
        &self,
        _cursor: Option<&str>,
        _page_size: u32,
    ) -> Result<CatalogPage, IntegrationError> {
        Ok(CatalogPage::default())
    }

    async fn fetch_inventory_levels(
        &self,
        inventory_item_ids: &[i64],
    ) -> Result<Vec<InventoryLevel>, IntegrationError> {
        Ok(inventory_item_ids
            .iter()
            .map(|&inventory_item_id| InventoryLevel {
                inventory_item_id,
                available: self.0,
            })
            .collect())
    }
}

fn stripe_headers(body: &[u8], timestamp: i64) -> Vec<(&'static str, String)> {
    vec![(
        "stripe-signature",
        compute_stripe_header(STRIPE_SECRET, body, timestamp),
    )]
}

async fn seed_payment(pool: &PgPool, intent_id: &str, wedding_id: DbId, member_ids: &[DbId]) {
    sqlx::query(
        "INSERT INTO payments (stripe_payment_intent_id, payment_type, wedding_id, member_ids, amount_cents) \
         VALUES ($1, 'group_payment', $2, $3, 50000)",
    )
    .bind(intent_id)
    .bind(wedding_id)
    .bind(member_ids)
    .execute(pool)
    .await
    .unwrap();
}

async fn payment_and_member_status(pool: &PgPool, intent_id: &str, member: DbId) -> (String, String) {
    let (payment,): (String,) =
        sqlx::query_as("SELECT status FROM payments WHERE stripe_payment_intent_id = $1")
            .bind(intent_id)
            .fetch_one(pool)
            .await
            .unwrap();
    let (member,): (String,) =
        sqlx::query_as("SELECT payment_status FROM wedding_party_members WHERE id = $1")
            .bind(member)
            .fetch_one(pool)
            .await
            .unwrap();
    (payment, member)
}

fn failed_event(event_id: &str, intent_id: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": event_id,
        "type": "payment_intent.payment_failed",
        "data": { "object": {
            "id": intent_id,
            "status": "requires_payment_method",
            "last_payment_error": { "message": "Your card was declined." }
        } }
    }))
    .unwrap()
}

fn succeeded_event(event_id: &str, intent_id: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": event_id,
        "type": "payment_intent.succeeded",
        "data": { "object": { "id": intent_id, "status": "succeeded" } }
    }))
    .unwrap()
}

// ---------------------------------------------------------------------------
// Shopify
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn shopify_bad_hmac_is_401_with_no_writes(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let body = br#"{"inventory_item_id": 1, "location_id": 2, "available": 7}"#;

    let response = post_raw(
        app,
        "/api/v1/webhooks/shopify",
        body,
        &[
            ("x-shopify-hmac-sha256", compute_shopify_signature("wrong-secret", body)),
            ("x-shopify-topic", "inventory_levels/update".into()),
            ("x-shopify-webhook-id", "wh-1".into()),
        ],
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(count_rows(&pool, "webhook_events").await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn shopify_product_update_upserts_mirror_and_dedupes(pool: PgPool) {
    let body = serde_json::to_vec(&json!({
        "id": 8001,
        "title": "Slim Fit Navy Suit",
        "handle": "slim-fit-navy-suit",
        "vendor": "KCT",
        "status": "active",
        "tags": "suits, navy",
        "variants": [
            { "id": 9001, "title": "40R", "sku": "SUIT-NAVY-40R", "price": "299.00",
              "option1": "40R", "inventory_item_id": 7001, "inventory_quantity": 4 }
        ],
        "images": []
    }))
    .unwrap();
    let headers = [
        ("x-shopify-hmac-sha256", compute_shopify_signature(SHOPIFY_SECRET, &body)),
        ("x-shopify-topic", "products/update".to_string()),
        ("x-shopify-webhook-id", "wh-product-1".to_string()),
    ];

    let app = common::build_test_app(pool.clone());
    let ack = expect_data(
        post_raw(app.clone(), "/api/v1/webhooks/shopify", &body, &headers).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(ack["duplicate"], false);

    let (title, tags): (String, Vec<String>) =
        sqlx::query_as("SELECT title, tags FROM vendor_products WHERE shopify_product_id = 8001")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(title, "Slim Fit Navy Suit");
    assert_eq!(tags, vec!["suits".to_string(), "navy".to_string()]);
    assert_eq!(count_rows(&pool, "vendor_variants").await, 1);

    let again = expect_data(
        post_raw(app, "/api/v1/webhooks/shopify", &body, &headers).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(again["duplicate"], true);
    assert_eq!(count_rows(&pool, "webhook_events").await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn shopify_level_update_applies_total_across_locations(pool: PgPool) {
    sqlx::query(
        "INSERT INTO vendor_products (shopify_product_id, title, handle, status) \
         VALUES (8001, 'Slim Fit Navy Suit', 'slim-fit-navy-suit', 'active')",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO vendor_variants \
         (shopify_variant_id, shopify_product_id, title, sku, price_cents, inventory_item_id, inventory_quantity) \
         VALUES (9001, 8001, '40R', 'SUIT-NAVY-40R', 29900, 7001, 4)",
    )
    .execute(&pool)
    .await
    .unwrap();

    let integrations = Integrations {
        catalog: Some(Arc::new(SummedLevels(9))),
        ..Integrations::default()
    };
    let app = common::build_test_app_with(pool.clone(), integrations);
    // This location alone holds 2 of the 9.
    let body = br#"{"inventory_item_id": 7001, "location_id": 2, "available": 2}"#;
    let headers = [
        ("x-shopify-hmac-sha256", compute_shopify_signature(SHOPIFY_SECRET, body)),
        ("x-shopify-topic", "inventory_levels/update".to_string()),
        ("x-shopify-webhook-id", "wh-level-1".to_string()),
    ];

    expect_data(
        post_raw(app, "/api/v1/webhooks/shopify", body, &headers).await,
        StatusCode::OK,
    )
    .await;

    let (quantity,): (i32,) = sqlx::query_as(
        "SELECT inventory_quantity FROM vendor_variants WHERE inventory_item_id = 7001",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(quantity, 9);
}

// ---------------------------------------------------------------------------
// Stripe
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn stripe_expired_signature_is_401(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let body = succeeded_event("evt_old", "pi_old");
    let stale = chrono::Utc::now().timestamp() - 3600;

    let response = post_raw(app, "/api/v1/webhooks/stripe", &body, &stripe_headers(&body, stale)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(count_rows(&pool, "webhook_events").await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn stripe_success_marks_payment_and_members_paid(pool: PgPool) {
    let wedding = seed_wedding(&pool, "LEE-2026").await;
    let a = seed_member(&pool, wedding, "a@example.com", 25_000).await;
    let b = seed_member(&pool, wedding, "b@example.com", 25_000).await;
    seed_payment(&pool, "pi_group", wedding, &[a, b]).await;

    let app = common::build_test_app(pool.clone());
    let body = succeeded_event("evt_1", "pi_group");
    let now = chrono::Utc::now().timestamp();

    let ack = expect_data(
        post_raw(app.clone(), "/api/v1/webhooks/stripe", &body, &stripe_headers(&body, now)).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(ack["event_type"], "payment_intent.succeeded");

    let (status,): (String,) =
        sqlx::query_as("SELECT status FROM payments WHERE stripe_payment_intent_id = 'pi_group'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(status, "succeeded");

    let (paid,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM wedding_party_members WHERE payment_status = 'paid'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(paid, 2);

    let (kind,): (String,) = sqlx::query_as("SELECT kind FROM admin_notifications")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(kind, "payment_succeeded");

    // Redelivery is acknowledged without a second notification.
    let again = expect_data(
        post_raw(app, "/api/v1/webhooks/stripe", &body, &stripe_headers(&body, now)).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(again["duplicate"], true);
    assert_eq!(count_rows(&pool, "admin_notifications").await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn stripe_signature_just_outside_tolerance_is_401(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let body = succeeded_event("evt_late", "pi_late");
    let now = chrono::Utc::now().timestamp();

    let late = post_raw(
        app.clone(),
        "/api/v1/webhooks/stripe",
        &body,
        &stripe_headers(&body, now - STRIPE_TOLERANCE_SECS - 10),
    )
    .await;
    assert_eq!(late.status(), StatusCode::UNAUTHORIZED);

    let early = post_raw(
        app,
        "/api/v1/webhooks/stripe",
        &body,
        &stripe_headers(&body, now + STRIPE_TOLERANCE_SECS + 10),
    )
    .await;
    assert_eq!(early.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(count_rows(&pool, "webhook_events").await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn stripe_success_after_decline_settles_payment(pool: PgPool) {
    let wedding = seed_wedding(&pool, "ROSS-2026").await;
    let member = seed_member(&pool, wedding, "r@example.com", 30_000).await;
    seed_payment(&pool, "pi_retry", wedding, &[member]).await;

    let app = common::build_test_app(pool.clone());
    let now = chrono::Utc::now().timestamp();

    let declined = failed_event("evt_declined", "pi_retry");
    expect_data(
        post_raw(app.clone(), "/api/v1/webhooks/stripe", &declined, &stripe_headers(&declined, now)).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(
        payment_and_member_status(&pool, "pi_retry", member).await,
        ("failed".to_string(), "unpaid".to_string())
    );

    let succeeded = succeeded_event("evt_retried", "pi_retry");
    expect_data(
        post_raw(app, "/api/v1/webhooks/stripe", &succeeded, &stripe_headers(&succeeded, now)).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(
        payment_and_member_status(&pool, "pi_retry", member).await,
        ("succeeded".to_string(), "paid".to_string())
    );

    let (failure_message,): (Option<String>,) = sqlx::query_as(
        "SELECT failure_message FROM payments WHERE stripe_payment_intent_id = 'pi_retry'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(failure_message, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn stripe_redelivery_after_processing_error_settles_everything(pool: PgPool) {
    let wedding = seed_wedding(&pool, "KIM-2026").await;
    let member = seed_member(&pool, wedding, "k@example.com", 28_000).await;
    seed_payment(&pool, "pi_flaky", wedding, &[member]).await;

    // Member updates fail until the trigger is dropped.
    sqlx::query(
        "CREATE FUNCTION reject_member_update() RETURNS trigger AS $$ \
         BEGIN RAISE EXCEPTION 'members temporarily locked'; END; \
         $$ LANGUAGE plpgsql",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "CREATE TRIGGER members_locked BEFORE UPDATE ON wedding_party_members \
         FOR EACH ROW EXECUTE FUNCTION reject_member_update()",
    )
    .execute(&pool)
    .await
    .unwrap();

    let app = common::build_test_app(pool.clone());
    let body = succeeded_event("evt_flaky", "pi_flaky");
    let now = chrono::Utc::now().timestamp();

    let first = post_raw(app.clone(), "/api/v1/webhooks/stripe", &body, &stripe_headers(&body, now)).await;
    assert_eq!(first.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // Nothing was half-applied.
    assert_eq!(
        payment_and_member_status(&pool, "pi_flaky", member).await,
        ("pending".to_string(), "unpaid".to_string())
    );
    let logged = WebhookEventRepo::find_by_external_id(&pool, "stripe", "evt_flaky")
        .await
        .unwrap()
        .unwrap();
    assert!(logged.processed_at.is_none());
    assert!(logged.error.is_some());

    sqlx::query("DROP TRIGGER members_locked ON wedding_party_members")
        .execute(&pool)
        .await
        .unwrap();

    let retry = expect_data(
        post_raw(app, "/api/v1/webhooks/stripe", &body, &stripe_headers(&body, now)).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(retry["duplicate"], false);
    assert_eq!(
        payment_and_member_status(&pool, "pi_flaky", member).await,
        ("succeeded".to_string(), "paid".to_string())
    );

    let logged = WebhookEventRepo::find_by_external_id(&pool, "stripe", "evt_flaky")
        .await
        .unwrap()
        .unwrap();
    assert!(logged.processed_at.is_some());
    assert!(logged.error.is_none());
    assert_eq!(count_rows(&pool, "webhook_events").await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn stripe_success_confirms_order_and_commits_stock(pool: PgPool) {
    let variant = seed_variant(&pool, "JKT-NAVY-40R", 5, 29_900).await;
    let app = common::build_test_app(pool.clone());

    let items = json!([{ "variant_id": variant, "quantity": 2 }]);
    common::post_json(
        app.clone(),
        "/api/v1/checkout/validate",
        json!({ "session_id": "sess-pay", "items": items }),
    )
    .await;
    let order = expect_data(
        common::post_json(
            app.clone(),
            "/api/v1/orders",
            json!({
                "session_id": "sess-pay",
                "customer_email": "guest@example.com",
                "shipping_address": { "name": "G", "street1": "1 Main", "city": "Kalamazoo", "state": "MI", "zip": "49007" },
                "items": items
            }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    let order_id = order["id"].as_i64().unwrap();

    sqlx::query(
        "INSERT INTO payments (stripe_payment_intent_id, payment_type, order_id, amount_cents) \
         VALUES ('pi_order', 'individual', $1, 59800)",
    )
    .bind(order_id)
    .execute(&pool)
    .await
    .unwrap();

    let body = succeeded_event("evt_order", "pi_order");
    let now = chrono::Utc::now().timestamp();
    post_raw(app, "/api/v1/webhooks/stripe", &body, &stripe_headers(&body, now)).await;

    let (status, payment_status): (String, String) =
        sqlx::query_as("SELECT status, payment_status FROM orders WHERE id = $1")
            .bind(order_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(status, "confirmed");
    assert_eq!(payment_status, "paid");

    let (committed, holds): (i32, i64) = sqlx::query_as(
        "SELECT v.committed_quantity, \
                (SELECT COUNT(*) FROM inventory_reservations WHERE order_id = $2) \
         FROM product_variants v WHERE v.id = $1",
    )
    .bind(variant)
    .bind(order_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(committed, 2);
    assert_eq!(holds, 0);
}

// ---------------------------------------------------------------------------
// EasyPost
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn easypost_delivered_tracker_delivers_order(pool: PgPool) {
    sqlx::query(
        "INSERT INTO orders (order_number, customer_email, status, payment_status, tracking_number) \
         VALUES ('KCT-TEST-1', 'guest@example.com', 'shipped', 'paid', '9400TRACK')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let body = serde_json::to_vec(&json!({
        "id": "evt_ep_1",
        "description": "tracker.updated",
        "result": { "tracking_code": "9400TRACK", "status": "delivered" }
    }))
    .unwrap();
    let app = common::build_test_app(pool.clone());
    let response = post_raw(
        app,
        "/api/v1/webhooks/easypost",
        &body,
        &[("x-hmac-signature", compute_easypost_header(EASYPOST_SECRET, &body))],
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let (status,): (String,) =
        sqlx::query_as("SELECT status FROM orders WHERE tracking_number = '9400TRACK'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(status, "delivered");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn easypost_unsigned_delivery_is_401(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let body = br#"{"id": "evt_ep_2", "description": "tracker.updated", "result": {}}"#;

    let response = post_raw(app, "/api/v1/webhooks/easypost", body, &[]).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(count_rows(&pool, "webhook_events").await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn easypost_bad_signature_is_401_with_no_writes(pool: PgPool) {
    sqlx::query(
        "INSERT INTO orders (order_number, customer_email, status, payment_status, tracking_number) \
         VALUES ('KCT-TEST-2', 'guest@example.com', 'shipped', 'paid', '9400FORGED')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let body = serde_json::to_vec(&json!({
        "id": "evt_ep_forged",
        "description": "tracker.updated",
        "result": { "tracking_code": "9400FORGED", "status": "delivered" }
    }))
    .unwrap();
    let app = common::build_test_app(pool.clone());
    let response = post_raw(
        app,
        "/api/v1/webhooks/easypost",
        &body,
        &[("x-hmac-signature", compute_easypost_header("not-the-secret", &body))],
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(count_rows(&pool, "webhook_events").await, 0);
    let (status,): (String,) =
        sqlx::query_as("SELECT status FROM orders WHERE tracking_number = '9400FORGED'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(status, "shipped");
}
