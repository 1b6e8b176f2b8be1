//! Integration tests for checkout reservations against a real database.

mod common;

use common::{reservation_count, seed_variant};
use kct_core::checkout::{LineItem, REASON_INSUFFICIENT, REASON_NOT_FOUND};
use kct_db::repositories::{ReservationRepo, VariantRepo};
use sqlx::PgPool;

fn item(variant_id: i64, quantity: i32) -> LineItem {
    LineItem {
        variant_id,
        quantity,
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_valid_batch_reserves_every_item(pool: PgPool) {
    let a = seed_variant(&pool, "SUIT-A", 10).await;
    let b = seed_variant(&pool, "SUIT-B", 3).await;

    let outcome = ReservationRepo::reserve_batch(
        &pool,
        "sess-1",
        None,
        None,
        &[item(a.id, 2), item(b.id, 3)],
    )
    .await
    .unwrap();

    assert!(outcome.valid);
    assert_eq!(outcome.reservations.len(), 2);
    assert!(outcome.expires_at.is_some());

    let effective = VariantRepo::find_effective(&pool, b.id).await.unwrap().unwrap();
    assert_eq!(effective.reserved_quantity, 3);
    assert_eq!(effective.effective_available, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_one_short_item_rejects_whole_batch(pool: PgPool) {
    let a = seed_variant(&pool, "SUIT-A", 10).await;
    let b = seed_variant(&pool, "SUIT-B", 1).await;

    let outcome = ReservationRepo::reserve_batch(
        &pool,
        "sess-1",
        None,
        None,
        &[item(a.id, 1), item(b.id, 2)],
    )
    .await
    .unwrap();

    assert!(!outcome.valid);
    assert!(outcome.reservations.is_empty());
    assert!(outcome.expires_at.is_none());
    assert!(outcome.items[0].valid);
    assert_eq!(outcome.items[1].reason, Some(REASON_INSUFFICIENT));
    assert_eq!(outcome.items[1].available, 1);
    assert_eq!(reservation_count(&pool).await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_variant_is_reported(pool: PgPool) {
    let outcome = ReservationRepo::reserve_batch(&pool, "sess-1", None, None, &[item(999_999, 1)])
        .await
        .unwrap();

    assert!(!outcome.valid);
    assert_eq!(outcome.items[0].reason, Some(REASON_NOT_FOUND));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_committed_stock_is_not_reservable(pool: PgPool) {
    let v = seed_variant(&pool, "SUIT-C", 5).await;
    sqlx::query("UPDATE product_variants SET committed_quantity = 4 WHERE id = $1")
        .bind(v.id)
        .execute(&pool)
        .await
        .unwrap();

    let outcome = ReservationRepo::reserve_batch(&pool, "sess-1", None, None, &[item(v.id, 2)])
        .await
        .unwrap();
    assert!(!outcome.valid);
    assert_eq!(outcome.items[0].available, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_revalidating_session_replaces_holds(pool: PgPool) {
    let v = seed_variant(&pool, "SUIT-A", 3).await;

    let first = ReservationRepo::reserve_batch(&pool, "sess-1", None, None, &[item(v.id, 3)])
        .await
        .unwrap();
    assert!(first.valid);

    // The session's own hold must not count against it.
    let second = ReservationRepo::reserve_batch(&pool, "sess-1", None, None, &[item(v.id, 2)])
        .await
        .unwrap();
    assert!(second.valid);
    assert_eq!(reservation_count(&pool).await, 1);

    // Another shopper only sees what is left.
    let other = ReservationRepo::reserve_batch(&pool, "sess-2", None, None, &[item(v.id, 2)])
        .await
        .unwrap();
    assert!(!other.valid);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failed_revalidation_keeps_previous_holds(pool: PgPool) {
    let v = seed_variant(&pool, "SUIT-A", 3).await;

    ReservationRepo::reserve_batch(&pool, "sess-1", None, None, &[item(v.id, 2)])
        .await
        .unwrap();
    let retry = ReservationRepo::reserve_batch(&pool, "sess-1", None, None, &[item(v.id, 5)])
        .await
        .unwrap();

    assert!(!retry.valid);
    let held = ReservationRepo::list_active_for_session(&pool, "sess-1")
        .await
        .unwrap();
    assert_eq!(held.len(), 1);
    assert_eq!(held[0].quantity, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_checkouts_for_last_unit(pool: PgPool) {
    let v = seed_variant(&pool, "LAST-ONE", 1).await;
    let items = [item(v.id, 1)];

    let (a, b) = tokio::join!(
        ReservationRepo::reserve_batch(&pool, "sess-a", None, None, &items),
        ReservationRepo::reserve_batch(&pool, "sess-b", None, None, &items),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert!(a.valid ^ b.valid, "exactly one checkout must win the last unit");
    assert_eq!(reservation_count(&pool).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_sweep_removes_only_expired(pool: PgPool) {
    let v = seed_variant(&pool, "SUIT-A", 10).await;
    ReservationRepo::reserve_batch(&pool, "live", None, None, &[item(v.id, 1)])
        .await
        .unwrap();
    ReservationRepo::reserve_batch(&pool, "stale", None, None, &[item(v.id, 1)])
        .await
        .unwrap();
    sqlx::query(
        "UPDATE inventory_reservations SET expires_at = NOW() - INTERVAL '1 minute' \
         WHERE session_id = 'stale'",
    )
    .execute(&pool)
    .await
    .unwrap();

    // Expired holds no longer reduce availability even before the sweep.
    let effective = VariantRepo::find_effective(&pool, v.id).await.unwrap().unwrap();
    assert_eq!(effective.reserved_quantity, 1);

    assert_eq!(ReservationRepo::sweep_expired(&pool).await.unwrap(), 1);
    assert_eq!(reservation_count(&pool).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_release_session(pool: PgPool) {
    let v = seed_variant(&pool, "SUIT-A", 10).await;
    ReservationRepo::reserve_batch(&pool, "sess-1", None, None, &[item(v.id, 4)])
        .await
        .unwrap();

    assert_eq!(ReservationRepo::release_session(&pool, "sess-1").await.unwrap(), 1);
    let effective = VariantRepo::find_effective(&pool, v.id).await.unwrap().unwrap();
    assert_eq!(effective.effective_available, 10);
}
