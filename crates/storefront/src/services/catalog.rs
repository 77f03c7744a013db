//! Catalog reads.
//!
//! Product detail lookups are cached in-process with `moka` for
//! `CATALOG_CACHE_TTL_SECS`; listings always hit the database so newly
//! activated products appear immediately.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use bazaar_core::{ProductId, VariantId};

use crate::db::RepositoryError;
use crate::db::products::ProductRepository;
use crate::models::catalog::{ProductDetail, ProductSummary, StockLevel};

/// Number of featured products shown on the home page.
pub const FEATURED_LIMIT: i64 = 8;

const CACHE_CAPACITY: u64 = 1000;

/// Catalog service with a product detail cache.
///
/// Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct CatalogService {
    details: Cache<ProductId, Arc<ProductDetail>>,
}

impl CatalogService {
    /// Create a catalog service whose cached entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let details = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(ttl)
            .build();

        Self { details }
    }

    /// Active products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, pool: &PgPool) -> Result<Vec<ProductSummary>, RepositoryError> {
        ProductRepository::new(pool).list_active().await
    }

    /// Featured active products for the home page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured(&self, pool: &PgPool) -> Result<Vec<ProductSummary>, RepositoryError> {
        ProductRepository::new(pool).list_featured(FEATURED_LIMIT).await
    }

    /// An active product with images and variants, served from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn detail(
        &self,
        pool: &PgPool,
        id: ProductId,
    ) -> Result<Option<Arc<ProductDetail>>, RepositoryError> {
        if let Some(detail) = self.details.get(&id).await {
            tracing::debug!(product_id = %id, "Product detail cache hit");
            return Ok(Some(detail));
        }

        let Some(detail) = ProductRepository::new(pool).get_detail(id).await? else {
            return Ok(None);
        };

        let detail = Arc::new(detail);
        self.details.insert(id, Arc::clone(&detail)).await;
        Ok(Some(detail))
    }

    /// Check that a product is active and, if given, that the variant is one
    /// of its own. Returns the product's current stock level, read from the
    /// database rather than the detail cache.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if either check fails.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn ensure_purchasable(
        &self,
        pool: &PgPool,
        product_id: ProductId,
        variant_id: Option<VariantId>,
    ) -> Result<StockLevel, RepositoryError> {
        let products = ProductRepository::new(pool);

        let Some(stock) = products.active_stock(product_id).await? else {
            return Err(RepositoryError::NotFound);
        };

        if let Some(variant_id) = variant_id
            && !products.variant_belongs_to(product_id, variant_id).await?
        {
            return Err(RepositoryError::NotFound);
        }

        Ok(StockLevel::from_quantity(stock))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::catalog::{ACTIVE_STATUS, Product};

    fn detail(id: ProductId) -> ProductDetail {
        ProductDetail {
            product: Product {
                id,
                name: "Ceramic Dripper".to_string(),
                slug: "ceramic-dripper".to_string(),
                description: None,
                price: Decimal::new(2400, 2),
                compare_at_price: None,
                stock_quantity: 3,
                featured: false,
                status: ACTIVE_STATUS.to_string(),
                created_at: Utc::now(),
            },
            images: Vec::new(),
            variants: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_cached_detail_is_served_without_database() {
        // Lazy pool: any query would fail, so a hit proves the cache answered.
        let pool = PgPool::connect_lazy("postgres://nobody@127.0.0.1:1/none").unwrap();
        let catalog = CatalogService::new(Duration::from_secs(60));
        let id = ProductId::new(5);
        catalog.details.insert(id, Arc::new(detail(id))).await;

        let cached = catalog.detail(&pool, id).await.unwrap().unwrap();
        assert_eq!(cached.product.slug, "ceramic-dripper");
    }
}
