//! Repository for the `products` and `product_variants` tables and the
//! `v_product_variants_effective` view.

use kct_core::stock::{compute_stock_status, DEFAULT_LOW_STOCK_THRESHOLD};
use kct_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::product::{
    CreateProduct, CreateProductVariant, EffectiveVariant, Product, ProductVariant, StockLevel,
    UpdateVariantStock,
};

/// Column list for the `products` table.
const PRODUCT_COLUMNS: &str = "id, name, handle, description, category, base_price_cents, \
    vendor, is_active, deleted_at, created_at, updated_at";

/// Column list for the `product_variants` table.
const VARIANT_COLUMNS: &str = "id, product_id, sku, size, color, price_cents, \
    available_quantity, committed_quantity, low_stock_threshold, stock_status, \
    vendor_variant_id, deleted_at, created_at, updated_at";

/// Column list for `v_product_variants_effective`.
const EFFECTIVE_COLUMNS: &str = "variant_id, product_id, product_name, sku, size, color, \
    price_cents, available_quantity, committed_quantity, reserved_quantity, \
    effective_available, low_stock_threshold, stock_status, updated_at";

/// SQL expression deriving `stock_status` from the row's own columns.
/// Mirrors `kct_core::stock::compute_stock_status`.
const STOCK_STATUS_SQL: &str = "CASE \
        WHEN available_quantity <= 0 THEN 'out_of_stock' \
        WHEN available_quantity <= low_stock_threshold THEN 'low_stock' \
        ELSE 'in_stock' END";

pub struct ProductRepo;

impl ProductRepo {
    pub async fn create(pool: &PgPool, input: &CreateProduct) -> Result<Product, sqlx::Error> {
        let query = format!(
            "INSERT INTO products (name, handle, description, category, base_price_cents, vendor) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(&input.name)
            .bind(&input.handle)
            .bind(&input.description)
            .bind(&input.category)
            .bind(input.base_price_cents)
            .bind(&input.vendor)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Product>, sqlx::Error> {
        let query = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert or refresh the product an imported vendor product maps to.
    ///
    /// When `existing_id` is set (re-import) that row is updated and undeleted;
    /// otherwise a new product is inserted.
    pub async fn upsert_imported(
        tx: &mut Transaction<'_, Postgres>,
        existing_id: Option<DbId>,
        input: &CreateProduct,
    ) -> Result<Product, sqlx::Error> {
        if let Some(id) = existing_id {
            let query = format!(
                "UPDATE products SET \
                    name = $2, handle = $3, description = $4, category = $5, \
                    base_price_cents = $6, vendor = $7, is_active = true, deleted_at = NULL \
                 WHERE id = $1 \
                 RETURNING {PRODUCT_COLUMNS}"
            );
            let updated = sqlx::query_as::<_, Product>(&query)
                .bind(id)
                .bind(&input.name)
                .bind(&input.handle)
                .bind(&input.description)
                .bind(&input.category)
                .bind(input.base_price_cents)
                .bind(&input.vendor)
                .fetch_optional(&mut **tx)
                .await?;
            if let Some(product) = updated {
                return Ok(product);
            }
        }

        let query = format!(
            "INSERT INTO products (name, handle, description, category, base_price_cents, vendor) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(&input.name)
            .bind(&input.handle)
            .bind(&input.description)
            .bind(&input.category)
            .bind(input.base_price_cents)
            .bind(&input.vendor)
            .fetch_one(&mut **tx)
            .await
    }
}

pub struct VariantRepo;

impl VariantRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateProductVariant,
    ) -> Result<ProductVariant, sqlx::Error> {
        let threshold = input
            .low_stock_threshold
            .unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
        let status = compute_stock_status(input.available_quantity, threshold);
        let query = format!(
            "INSERT INTO product_variants \
                (product_id, sku, size, color, price_cents, available_quantity, \
                 low_stock_threshold, stock_status, vendor_variant_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {VARIANT_COLUMNS}"
        );
        sqlx::query_as::<_, ProductVariant>(&query)
            .bind(input.product_id)
            .bind(&input.sku)
            .bind(&input.size)
            .bind(&input.color)
            .bind(input.price_cents)
            .bind(input.available_quantity)
            .bind(threshold)
            .bind(status.as_str())
            .bind(input.vendor_variant_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ProductVariant>, sqlx::Error> {
        let query = format!("SELECT {VARIANT_COLUMNS} FROM product_variants WHERE id = $1");
        sqlx::query_as::<_, ProductVariant>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Read one row of the effective-availability view.
    pub async fn find_effective(
        pool: &PgPool,
        variant_id: DbId,
    ) -> Result<Option<EffectiveVariant>, sqlx::Error> {
        let query = format!(
            "SELECT {EFFECTIVE_COLUMNS} FROM v_product_variants_effective WHERE variant_id = $1"
        );
        sqlx::query_as::<_, EffectiveVariant>(&query)
            .bind(variant_id)
            .fetch_optional(pool)
            .await
    }

    /// List variants with effective availability, lowest stock first when
    /// `low_stock_only` is set.
    pub async fn list_effective(
        pool: &PgPool,
        low_stock_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<EffectiveVariant>, sqlx::Error> {
        let (filter, order) = if low_stock_only {
            (
                "WHERE available_quantity <= low_stock_threshold",
                "available_quantity ASC, variant_id",
            )
        } else {
            ("", "product_name, sku")
        };
        let query = format!(
            "SELECT {EFFECTIVE_COLUMNS} FROM v_product_variants_effective \
             {filter} ORDER BY {order} LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, EffectiveVariant>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Apply an admin stock edit and recompute `stock_status`.
    ///
    /// Returns `None` if the variant does not exist or is deleted.
    pub async fn update_stock(
        pool: &PgPool,
        id: DbId,
        input: &UpdateVariantStock,
    ) -> Result<Option<ProductVariant>, sqlx::Error> {
        let query = format!(
            "UPDATE product_variants SET \
                available_quantity = COALESCE($2, available_quantity), \
                low_stock_threshold = COALESCE($3, low_stock_threshold), \
                stock_status = CASE \
                    WHEN COALESCE($2, available_quantity) <= 0 THEN 'out_of_stock' \
                    WHEN COALESCE($2, available_quantity) <= COALESCE($3, low_stock_threshold) \
                        THEN 'low_stock' \
                    ELSE 'in_stock' END \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {VARIANT_COLUMNS}"
        );
        sqlx::query_as::<_, ProductVariant>(&query)
            .bind(id)
            .bind(input.available_quantity)
            .bind(input.low_stock_threshold)
            .fetch_optional(pool)
            .await
    }

    /// Set on-hand stock of the variant linked to a Shopify variant.
    ///
    /// Returns the number of internal variants updated (0 or 1).
    pub async fn set_available_by_vendor_variant(
        tx: &mut Transaction<'_, Postgres>,
        vendor_variant_id: i64,
        available_quantity: i32,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE product_variants SET \
                available_quantity = $2, \
                stock_status = CASE \
                    WHEN $2 <= 0 THEN 'out_of_stock' \
                    WHEN $2 <= low_stock_threshold THEN 'low_stock' \
                    ELSE 'in_stock' END \
             WHERE vendor_variant_id = $1 AND deleted_at IS NULL",
        )
            .bind(vendor_variant_id)
            .bind(available_quantity)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected())
    }

    /// Insert or refresh the internal variant produced by importing a vendor
    /// variant. Keyed on `vendor_variant_id`; on-hand stock and threshold are
    /// preserved on refresh.
    pub async fn upsert_imported(
        tx: &mut Transaction<'_, Postgres>,
        input: &CreateProductVariant,
    ) -> Result<ProductVariant, sqlx::Error> {
        let threshold = input
            .low_stock_threshold
            .unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
        let status = compute_stock_status(input.available_quantity, threshold);
        let query = format!(
            "INSERT INTO product_variants \
                (product_id, sku, size, color, price_cents, available_quantity, \
                 low_stock_threshold, stock_status, vendor_variant_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (vendor_variant_id) WHERE vendor_variant_id IS NOT NULL DO UPDATE SET \
                product_id = EXCLUDED.product_id, \
                sku = EXCLUDED.sku, \
                size = EXCLUDED.size, \
                color = EXCLUDED.color, \
                price_cents = EXCLUDED.price_cents, \
                deleted_at = NULL \
             RETURNING {VARIANT_COLUMNS}"
        );
        sqlx::query_as::<_, ProductVariant>(&query)
            .bind(input.product_id)
            .bind(&input.sku)
            .bind(&input.size)
            .bind(&input.color)
            .bind(input.price_cents)
            .bind(input.available_quantity)
            .bind(threshold)
            .bind(status.as_str())
            .bind(input.vendor_variant_id)
            .fetch_one(&mut **tx)
            .await
    }

    /// Recompute `stock_status` for every live variant whose stored value is
    /// stale. Returns the number of rows changed.
    pub async fn refresh_stock_statuses(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let query = format!(
            "UPDATE product_variants SET stock_status = {STOCK_STATUS_SQL} \
             WHERE deleted_at IS NULL AND stock_status <> {STOCK_STATUS_SQL}"
        );
        let result = sqlx::query(&query).execute(pool).await?;
        Ok(result.rows_affected())
    }

    /// Count live variants of live products.
    pub async fn count_active(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM product_variants v \
             JOIN products p ON p.id = v.product_id \
             WHERE v.deleted_at IS NULL AND p.deleted_at IS NULL",
        )
        .fetch_one(pool)
        .await
    }

    /// Live variants at or below their low-stock threshold.
    pub async fn list_at_or_below_threshold(pool: &PgPool) -> Result<Vec<StockLevel>, sqlx::Error> {
        sqlx::query_as::<_, StockLevel>(
            "SELECT v.id, v.sku, p.name AS product_name, \
                    v.available_quantity, v.low_stock_threshold \
             FROM product_variants v \
             JOIN products p ON p.id = v.product_id \
             WHERE v.deleted_at IS NULL AND p.deleted_at IS NULL \
               AND v.available_quantity <= v.low_stock_threshold \
             ORDER BY v.id",
        )
        .fetch_all(pool)
        .await
    }

    /// Move paid order quantities into `committed_quantity`.
    pub async fn commit_order_items(
        tx: &mut Transaction<'_, Postgres>,
        order_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE product_variants v \
             SET committed_quantity = v.committed_quantity + i.quantity \
             FROM (SELECT variant_id, SUM(quantity)::INTEGER AS quantity \
                   FROM order_items WHERE order_id = $1 GROUP BY variant_id) i \
             WHERE v.id = i.variant_id",
        )
        .bind(order_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }

    /// Shipped stock leaves the building: decrement both on-hand and committed.
    pub async fn fulfil_order_items(
        tx: &mut Transaction<'_, Postgres>,
        order_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE product_variants v SET \
                available_quantity = GREATEST(v.available_quantity - i.quantity, 0), \
                committed_quantity = GREATEST(v.committed_quantity - i.quantity, 0) \
             FROM (SELECT variant_id, SUM(quantity)::INTEGER AS quantity \
                   FROM order_items WHERE order_id = $1 GROUP BY variant_id) i \
             WHERE v.id = i.variant_id",
        )
        .bind(order_id)
        .execute(&mut **tx)
        .await?;
        // Status depends on the new on-hand value, so refresh it separately.
        let status_query = format!(
            "UPDATE product_variants SET stock_status = {STOCK_STATUS_SQL} \
             WHERE id IN (SELECT variant_id FROM order_items WHERE order_id = $1)"
        );
        sqlx::query(&status_query)
            .bind(order_id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected())
    }

    /// Return committed stock of a cancelled paid order to the sellable pool.
    pub async fn release_committed_items(
        tx: &mut Transaction<'_, Postgres>,
        order_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE product_variants v \
             SET committed_quantity = GREATEST(v.committed_quantity - i.quantity, 0) \
             FROM (SELECT variant_id, SUM(quantity)::INTEGER AS quantity \
                   FROM order_items WHERE order_id = $1 GROUP BY variant_id) i \
             WHERE v.id = i.variant_id",
        )
        .bind(order_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }
}
