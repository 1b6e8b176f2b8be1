//! Repository for the Shopify mirror tables: `vendor_products`,
//! `vendor_variants` and `vendor_images`.
//!
//! Sync writes are upserts keyed on the Shopify ids and run inside the
//! caller's per-page transaction.

use kct_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::vendor::{
    NewVendorImage, NewVendorProduct, NewVendorVariant, VendorImage, VendorProduct,
    VendorProductDetail, VendorVariant,
};

const PRODUCT_COLUMNS: &str = "id, shopify_product_id, title, handle, vendor, product_type, \
    status, tags, description_html, shopify_updated_at, import_status, imported_product_id, \
    override_title, override_price_cents, decided_at, synced_at, created_at, updated_at";

const VARIANT_COLUMNS: &str = "id, shopify_variant_id, shopify_product_id, title, sku, \
    price_cents, size, color, inventory_item_id, inventory_quantity, synced_at";

const IMAGE_COLUMNS: &str =
    "id, shopify_image_id, shopify_product_id, src, alt_text, position, synced_at";

pub struct VendorRepo;

impl VendorRepo {
    // -----------------------------------------------------------------------
    // Sync upserts
    // -----------------------------------------------------------------------

    /// Insert or refresh a mirrored product. Import decisions and overrides
    /// are never touched by sync.
    pub async fn upsert_product(
        tx: &mut Transaction<'_, Postgres>,
        row: &NewVendorProduct,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO vendor_products \
                (shopify_product_id, title, handle, vendor, product_type, status, tags, \
                 description_html, shopify_updated_at, synced_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW()) \
             ON CONFLICT (shopify_product_id) DO UPDATE SET \
                title = EXCLUDED.title, \
                handle = EXCLUDED.handle, \
                vendor = EXCLUDED.vendor, \
                product_type = EXCLUDED.product_type, \
                status = EXCLUDED.status, \
                tags = EXCLUDED.tags, \
                description_html = EXCLUDED.description_html, \
                shopify_updated_at = EXCLUDED.shopify_updated_at, \
                synced_at = NOW() \
             RETURNING id",
        )
        .bind(row.shopify_product_id)
        .bind(&row.title)
        .bind(&row.handle)
        .bind(&row.vendor)
        .bind(&row.product_type)
        .bind(&row.status)
        .bind(&row.tags)
        .bind(&row.description_html)
        .bind(row.shopify_updated_at)
        .fetch_one(&mut **tx)
        .await
    }

    pub async fn upsert_variant(
        tx: &mut Transaction<'_, Postgres>,
        row: &NewVendorVariant,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO vendor_variants \
                (shopify_variant_id, shopify_product_id, title, sku, price_cents, size, color, \
                 inventory_item_id, inventory_quantity, synced_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW()) \
             ON CONFLICT (shopify_variant_id) DO UPDATE SET \
                shopify_product_id = EXCLUDED.shopify_product_id, \
                title = EXCLUDED.title, \
                sku = EXCLUDED.sku, \
                price_cents = EXCLUDED.price_cents, \
                size = EXCLUDED.size, \
                color = EXCLUDED.color, \
                inventory_item_id = EXCLUDED.inventory_item_id, \
                inventory_quantity = EXCLUDED.inventory_quantity, \
                synced_at = NOW() \
             RETURNING id",
        )
        .bind(row.shopify_variant_id)
        .bind(row.shopify_product_id)
        .bind(&row.title)
        .bind(&row.sku)
        .bind(row.price_cents)
        .bind(&row.size)
        .bind(&row.color)
        .bind(row.inventory_item_id)
        .bind(row.inventory_quantity)
        .fetch_one(&mut **tx)
        .await
    }

    pub async fn upsert_image(
        tx: &mut Transaction<'_, Postgres>,
        row: &NewVendorImage,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO vendor_images \
                (shopify_image_id, shopify_product_id, src, alt_text, position, synced_at) \
             VALUES ($1, $2, $3, $4, $5, NOW()) \
             ON CONFLICT (shopify_image_id) DO UPDATE SET \
                shopify_product_id = EXCLUDED.shopify_product_id, \
                src = EXCLUDED.src, \
                alt_text = EXCLUDED.alt_text, \
                position = EXCLUDED.position, \
                synced_at = NOW() \
             RETURNING id",
        )
        .bind(row.shopify_image_id)
        .bind(row.shopify_product_id)
        .bind(&row.src)
        .bind(&row.alt_text)
        .bind(row.position)
        .fetch_one(&mut **tx)
        .await
    }

    /// Update the mirrored quantity of a Shopify variant by its inventory item.
    ///
    /// Returns the Shopify variant ids that were updated, so the caller can
    /// propagate the level to linked internal variants.
    pub async fn set_inventory_quantity(
        tx: &mut Transaction<'_, Postgres>,
        inventory_item_id: i64,
        quantity: i32,
    ) -> Result<Vec<i64>, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE vendor_variants SET inventory_quantity = $2, synced_at = NOW() \
             WHERE inventory_item_id = $1 \
             RETURNING shopify_variant_id",
        )
        .bind(inventory_item_id)
        .bind(quantity)
        .fetch_all(&mut **tx)
        .await
    }

    /// All inventory item ids known to the mirror, ascending.
    pub async fn list_inventory_item_ids(pool: &PgPool) -> Result<Vec<i64>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT DISTINCT inventory_item_id FROM vendor_variants \
             WHERE inventory_item_id IS NOT NULL \
             ORDER BY inventory_item_id",
        )
        .fetch_all(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Admin reads
    // -----------------------------------------------------------------------

    /// List mirrored products filtered by import status and a title/vendor
    /// search pattern (already escaped for `ILIKE`).
    pub async fn list_products(
        pool: &PgPool,
        import_status: Option<&str>,
        search_pattern: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<VendorProduct>, sqlx::Error> {
        let query = format!(
            "SELECT {PRODUCT_COLUMNS} FROM vendor_products \
             WHERE ($1::TEXT IS NULL OR import_status = $1) \
               AND ($2::TEXT IS NULL OR title ILIKE $2 OR vendor ILIKE $2) \
             ORDER BY shopify_updated_at DESC NULLS LAST, id DESC \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, VendorProduct>(&query)
            .bind(import_status)
            .bind(search_pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn find_product(pool: &PgPool, id: DbId) -> Result<Option<VendorProduct>, sqlx::Error> {
        let query = format!("SELECT {PRODUCT_COLUMNS} FROM vendor_products WHERE id = $1");
        sqlx::query_as::<_, VendorProduct>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_product_by_shopify_id(
        pool: &PgPool,
        shopify_product_id: i64,
    ) -> Result<Option<VendorProduct>, sqlx::Error> {
        let query =
            format!("SELECT {PRODUCT_COLUMNS} FROM vendor_products WHERE shopify_product_id = $1");
        sqlx::query_as::<_, VendorProduct>(&query)
            .bind(shopify_product_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn variants_for(
        pool: &PgPool,
        shopify_product_id: i64,
    ) -> Result<Vec<VendorVariant>, sqlx::Error> {
        let query = format!(
            "SELECT {VARIANT_COLUMNS} FROM vendor_variants \
             WHERE shopify_product_id = $1 ORDER BY shopify_variant_id"
        );
        sqlx::query_as::<_, VendorVariant>(&query)
            .bind(shopify_product_id)
            .fetch_all(pool)
            .await
    }

    pub async fn images_for(
        pool: &PgPool,
        shopify_product_id: i64,
    ) -> Result<Vec<VendorImage>, sqlx::Error> {
        let query = format!(
            "SELECT {IMAGE_COLUMNS} FROM vendor_images \
             WHERE shopify_product_id = $1 ORDER BY position, shopify_image_id"
        );
        sqlx::query_as::<_, VendorImage>(&query)
            .bind(shopify_product_id)
            .fetch_all(pool)
            .await
    }

    /// A product with its variants and images.
    pub async fn find_detail(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<VendorProductDetail>, sqlx::Error> {
        let Some(product) = Self::find_product(pool, id).await? else {
            return Ok(None);
        };
        let variants = Self::variants_for(pool, product.shopify_product_id).await?;
        let images = Self::images_for(pool, product.shopify_product_id).await?;
        Ok(Some(VendorProductDetail {
            product,
            variants,
            images,
        }))
    }

    // -----------------------------------------------------------------------
    // Import decisions
    // -----------------------------------------------------------------------

    /// Record an admin decision and the overrides that go with it.
    pub async fn set_decision(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
        import_status: &str,
        imported_product_id: Option<DbId>,
        override_title: Option<&str>,
        override_price_cents: Option<i64>,
    ) -> Result<VendorProduct, sqlx::Error> {
        let query = format!(
            "UPDATE vendor_products SET \
                import_status = $2, \
                imported_product_id = COALESCE($3, imported_product_id), \
                override_title = $4, \
                override_price_cents = $5, \
                decided_at = NOW() \
             WHERE id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, VendorProduct>(&query)
            .bind(id)
            .bind(import_status)
            .bind(imported_product_id)
            .bind(override_title)
            .bind(override_price_cents)
            .fetch_one(&mut **tx)
            .await
    }
}
