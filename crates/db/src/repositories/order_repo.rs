//! Repository for the `orders`, `order_items` and `order_status_history`
//! tables.
//!
//! Status changes are compare-and-set on the current status and always write
//! a history row in the same transaction. Stock side effects of a transition
//! (commit on payment, fulfil on shipment, release on cancellation) run in
//! that transaction too.

use std::collections::HashMap;

use kct_core::checkout::LineItem;
use kct_core::order_status::{generate_order_number, OrderStatus, PAYMENT_PAID, PAYMENT_UNPAID};
use kct_core::types::{Cents, DbId};
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::order::{
    CreateOrder, Order, OrderCreation, OrderDetail, OrderItem, OrderStatusHistory, PaidOrder,
    ShippingLabel,
};
use crate::repositories::{ReservationRepo, VariantRepo};

const COLUMNS: &str = "id, order_number, session_id, customer_email, customer_name, status, \
    payment_status, subtotal_cents, shipping_cents, total_cents, shipping_address, \
    easypost_shipment_id, tracking_number, carrier, label_url, created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, order_id, variant_id, sku, product_name, quantity, unit_price_cents, created_at";

const HISTORY_COLUMNS: &str = "id, order_id, from_status, to_status, note, changed_by, created_at";

pub struct OrderRepo;

impl OrderRepo {
    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Create a pending order from a checkout session.
    ///
    /// `items` must be normalized. Every item must be covered by the
    /// session's active, unattached holds; those holds are then attached to
    /// the new order. Unit prices are read from the variants.
    pub async fn create_from_session(
        pool: &PgPool,
        input: &CreateOrder,
        items: &[LineItem],
    ) -> Result<OrderCreation, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let held: Vec<(DbId, i32)> = sqlx::query_as(
            "SELECT variant_id, quantity FROM inventory_reservations \
             WHERE session_id = $1 AND order_id IS NULL AND expires_at > NOW() \
             FOR UPDATE",
        )
        .bind(&input.session_id)
        .fetch_all(&mut *tx)
        .await?;
        let mut reserved: HashMap<DbId, i64> = HashMap::new();
        for (variant_id, quantity) in held {
            *reserved.entry(variant_id).or_insert(0) += i64::from(quantity);
        }

        let uncovered: Vec<DbId> = items
            .iter()
            .filter(|item| reserved.get(&item.variant_id).copied().unwrap_or(0) < i64::from(item.quantity))
            .map(|item| item.variant_id)
            .collect();
        if !uncovered.is_empty() {
            tx.rollback().await?;
            return Ok(OrderCreation::NotReserved {
                variant_ids: uncovered,
            });
        }

        let variant_ids: Vec<DbId> = items.iter().map(|i| i.variant_id).collect();
        let priced: Vec<(DbId, String, String, Cents)> = sqlx::query_as(
            "SELECT v.id, v.sku, p.name, v.price_cents \
             FROM product_variants v JOIN products p ON p.id = v.product_id \
             WHERE v.id = ANY($1)",
        )
        .bind(&variant_ids)
        .fetch_all(&mut *tx)
        .await?;
        let priced: HashMap<DbId, (String, String, Cents)> = priced
            .into_iter()
            .map(|(id, sku, name, price)| (id, (sku, name, price)))
            .collect();

        let mut subtotal: Cents = 0;
        for item in items {
            if let Some((_, _, price)) = priced.get(&item.variant_id) {
                subtotal += price * Cents::from(item.quantity);
            }
        }

        let insert = format!(
            "INSERT INTO orders \
                (order_number, session_id, customer_email, customer_name, \
                 subtotal_cents, shipping_cents, total_cents, shipping_address) \
             VALUES ($1, $2, $3, $4, $5, 0, $5, $6) \
             RETURNING {COLUMNS}"
        );
        let order = sqlx::query_as::<_, Order>(&insert)
            .bind(generate_order_number())
            .bind(&input.session_id)
            .bind(&input.customer_email)
            .bind(&input.customer_name)
            .bind(subtotal)
            .bind(&input.shipping_address)
            .fetch_one(&mut *tx)
            .await?;

        let item_insert = format!(
            "INSERT INTO order_items \
                (order_id, variant_id, sku, product_name, quantity, unit_price_cents) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {ITEM_COLUMNS}"
        );
        let mut order_items = Vec::with_capacity(items.len());
        for item in items {
            let Some((sku, name, price)) = priced.get(&item.variant_id) else {
                continue;
            };
            let row = sqlx::query_as::<_, OrderItem>(&item_insert)
                .bind(order.id)
                .bind(item.variant_id)
                .bind(sku)
                .bind(name)
                .bind(item.quantity)
                .bind(price)
                .fetch_one(&mut *tx)
                .await?;
            order_items.push(row);
        }

        ReservationRepo::attach_to_order(&mut tx, &input.session_id, order.id).await?;

        tx.commit().await?;

        Ok(OrderCreation::Created(OrderDetail {
            order,
            items: order_items,
            history: Vec::new(),
        }))
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE id = $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_tracking_number(
        pool: &PgPool,
        tracking_number: &str,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM orders WHERE tracking_number = $1 \
             ORDER BY id DESC LIMIT 1"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(tracking_number)
            .fetch_optional(pool)
            .await
    }

    /// List orders, newest first, optionally filtered by status.
    pub async fn list(
        pool: &PgPool,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM orders \
             WHERE ($1::TEXT IS NULL OR status = $1) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn items_for(pool: &PgPool, order_id: DbId) -> Result<Vec<OrderItem>, sqlx::Error> {
        let query = format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id");
        sqlx::query_as::<_, OrderItem>(&query)
            .bind(order_id)
            .fetch_all(pool)
            .await
    }

    pub async fn history_for(
        pool: &PgPool,
        order_id: DbId,
    ) -> Result<Vec<OrderStatusHistory>, sqlx::Error> {
        let query = format!(
            "SELECT {HISTORY_COLUMNS} FROM order_status_history \
             WHERE order_id = $1 ORDER BY created_at, id"
        );
        sqlx::query_as::<_, OrderStatusHistory>(&query)
            .bind(order_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_detail(pool: &PgPool, id: DbId) -> Result<Option<OrderDetail>, sqlx::Error> {
        let Some(order) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let items = Self::items_for(pool, id).await?;
        let history = Self::history_for(pool, id).await?;
        Ok(Some(OrderDetail {
            order,
            items,
            history,
        }))
    }

    // -----------------------------------------------------------------------
    // Status changes
    // -----------------------------------------------------------------------

    /// Move an order from `from` to `to`, recording history.
    ///
    /// The caller validates the transition; this only applies it if the row
    /// still has status `from`. Returns `None` when it does not (concurrent
    /// change or unknown id).
    pub async fn transition(
        pool: &PgPool,
        id: DbId,
        from: OrderStatus,
        to: OrderStatus,
        note: Option<&str>,
        changed_by: &str,
    ) -> Result<Option<Order>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let order = Self::transition_in_tx(&mut tx, id, from, to, note, changed_by).await?;
        if order.is_some() {
            tx.commit().await?;
        } else {
            tx.rollback().await?;
        }
        Ok(order)
    }

    /// Store a purchased label and move the order to `shipped` atomically.
    pub async fn ship_with_label(
        pool: &PgPool,
        id: DbId,
        from: OrderStatus,
        label: &ShippingLabel,
        changed_by: &str,
    ) -> Result<Option<Order>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query(
            "UPDATE orders SET \
                easypost_shipment_id = $2, tracking_number = $3, carrier = $4, label_url = $5 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&label.shipment_id)
        .bind(&label.tracking_number)
        .bind(&label.carrier)
        .bind(&label.label_url)
        .execute(&mut *tx)
        .await?;

        let note = format!("Label purchased ({} {})", label.carrier, label.tracking_number);
        let order = Self::transition_in_tx(
            &mut tx,
            id,
            from,
            OrderStatus::Shipped,
            Some(&note),
            changed_by,
        )
        .await?;
        if order.is_some() {
            tx.commit().await?;
        } else {
            tx.rollback().await?;
        }
        Ok(order)
    }

    async fn transition_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
        from: OrderStatus,
        to: OrderStatus,
        note: Option<&str>,
        changed_by: &str,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!(
            "UPDATE orders SET status = $3 WHERE id = $1 AND status = $2 RETURNING {COLUMNS}"
        );
        let Some(order) = sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(from.as_str())
            .bind(to.as_str())
            .fetch_optional(&mut **tx)
            .await?
        else {
            return Ok(None);
        };

        Self::insert_history(tx, id, from, to, note, changed_by).await?;

        match to {
            OrderStatus::Shipped => {
                VariantRepo::fulfil_order_items(tx, id).await?;
            }
            OrderStatus::Cancelled => {
                if order.payment_status == PAYMENT_PAID {
                    VariantRepo::release_committed_items(tx, id).await?;
                }
                ReservationRepo::delete_for_order(tx, id).await?;
            }
            _ => {}
        }

        Ok(Some(order))
    }

    async fn insert_history(
        tx: &mut Transaction<'_, Postgres>,
        order_id: DbId,
        from: OrderStatus,
        to: OrderStatus,
        note: Option<&str>,
        changed_by: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO order_status_history (order_id, from_status, to_status, note, changed_by) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(order_id)
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(note)
        .bind(changed_by)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Payment and shipping
    // -----------------------------------------------------------------------

    /// Apply a successful payment.
    ///
    /// Only an `unpaid` order is changed, so a replayed webhook is a no-op
    /// (`None`). The order's quantities become committed stock, its holds are
    /// dropped and a `pending` order is confirmed.
    pub async fn mark_paid(
        pool: &PgPool,
        id: DbId,
        changed_by: &str,
    ) -> Result<Option<PaidOrder>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let paid = Self::mark_paid_in_tx(&mut tx, id, changed_by).await?;
        tx.commit().await?;
        Ok(paid)
    }

    /// [`Self::mark_paid`] inside the caller's transaction.
    pub async fn mark_paid_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
        changed_by: &str,
    ) -> Result<Option<PaidOrder>, sqlx::Error> {
        let query = format!(
            "UPDATE orders SET payment_status = $2 \
             WHERE id = $1 AND payment_status = $3 \
             RETURNING {COLUMNS}"
        );
        let Some(mut order) = sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(PAYMENT_PAID)
            .bind(PAYMENT_UNPAID)
            .fetch_optional(&mut **tx)
            .await?
        else {
            return Ok(None);
        };

        VariantRepo::commit_order_items(tx, id).await?;
        ReservationRepo::delete_for_order(tx, id).await?;

        let mut confirmed = false;
        if order.status == OrderStatus::Pending.as_str() {
            if let Some(updated) = Self::transition_in_tx(
                tx,
                id,
                OrderStatus::Pending,
                OrderStatus::Confirmed,
                Some("Payment received"),
                changed_by,
            )
            .await?
            {
                order = updated;
                confirmed = true;
            }
        }

        Ok(Some(PaidOrder { order, confirmed }))
    }

    /// Remember the EasyPost shipment created for a rate quote.
    pub async fn set_shipment(
        pool: &PgPool,
        id: DbId,
        shipment_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE orders SET easypost_shipment_id = $2 WHERE id = $1")
            .bind(id)
            .bind(shipment_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
