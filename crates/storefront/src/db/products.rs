//! Catalog queries.
//!
//! Only products with status `active` are ever returned to the storefront.

use sqlx::PgPool;

use bazaar_core::{ProductId, VariantId};

use super::RepositoryError;
use crate::models::catalog::{
    ACTIVE_STATUS, Product, ProductDetail, ProductImage, ProductSummary, ProductVariant,
};

/// Listing projection with the lowest-position image.
const SUMMARY_SELECT: &str = r"
    SELECT p.id, p.name, p.slug, p.price, p.compare_at_price, p.stock_quantity, p.featured,
           (SELECT i.url FROM product_images i
             WHERE i.product_id = p.id
             ORDER BY i.position ASC, i.id ASC
             LIMIT 1) AS image_url
    FROM products p
";

/// Repository for catalog reads.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All active products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<ProductSummary>, RepositoryError> {
        let sql = format!("{SUMMARY_SELECT} WHERE p.status = $1 ORDER BY p.created_at DESC");
        let rows = sqlx::query_as::<_, ProductSummary>(&sql)
            .bind(ACTIVE_STATUS)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Featured active products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_featured(&self, limit: i64) -> Result<Vec<ProductSummary>, RepositoryError> {
        let sql = format!(
            "{SUMMARY_SELECT} WHERE p.status = $1 AND p.featured ORDER BY p.created_at DESC LIMIT $2"
        );
        let rows = sqlx::query_as::<_, ProductSummary>(&sql)
            .bind(ACTIVE_STATUS)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// An active product with its images and variants.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any query fails.
    pub async fn get_detail(&self, id: ProductId) -> Result<Option<ProductDetail>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            r"
            SELECT id, name, slug, description, price, compare_at_price, stock_quantity,
                   featured, status, created_at
            FROM products
            WHERE id = $1 AND status = $2
            ",
        )
        .bind(id)
        .bind(ACTIVE_STATUS)
        .fetch_optional(self.pool)
        .await?;

        let Some(product) = product else {
            return Ok(None);
        };

        let images = sqlx::query_as::<_, ProductImage>(
            r"
            SELECT id, product_id, url, alt_text, position
            FROM product_images
            WHERE product_id = $1
            ORDER BY position ASC, id ASC
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        let variants = sqlx::query_as::<_, ProductVariant>(
            r"
            SELECT id, product_id, name, price, stock_quantity, sku
            FROM product_variants
            WHERE product_id = $1
            ORDER BY name ASC
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(ProductDetail {
            product,
            images,
            variants,
        }))
    }

    /// Whether `variant_id` belongs to `product_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn variant_belongs_to(
        &self,
        product_id: ProductId,
        variant_id: VariantId,
    ) -> Result<bool, RepositoryError> {
        let found = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (
                SELECT 1 FROM product_variants WHERE id = $1 AND product_id = $2
            )
            ",
        )
        .bind(variant_id)
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;
        Ok(found)
    }

    /// Current stock count of an active product, or `None` if there is no
    /// active product with this id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_stock(&self, id: ProductId) -> Result<Option<i32>, RepositoryError> {
        let stock = sqlx::query_scalar::<_, i32>(
            "SELECT stock_quantity FROM products WHERE id = $1 AND status = $2",
        )
        .bind(id)
        .bind(ACTIVE_STATUS)
        .fetch_optional(self.pool)
        .await?;
        Ok(stock)
    }
}
