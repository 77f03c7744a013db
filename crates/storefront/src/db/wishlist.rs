//! Wishlist repository.

use sqlx::PgPool;

use bazaar_core::{ProductId, UserId, WishlistItemId};

use super::RepositoryError;
use crate::models::wishlist::WishlistEntry;

/// Repository for wishlist database operations.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    /// Create a new wishlist repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's saved products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<WishlistEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, WishlistEntry>(
            r"
            SELECT w.id, w.product_id, p.name AS product_name, p.price, p.compare_at_price,
                   p.stock_quantity,
                   (SELECT i.url FROM product_images i
                     WHERE i.product_id = p.id
                     ORDER BY i.position ASC, i.id ASC
                     LIMIT 1) AS image_url,
                   w.created_at
            FROM wishlist_items w
            JOIN products p ON p.id = w.product_id
            WHERE w.user_id = $1
            ORDER BY w.created_at DESC, w.id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Save a product. Saving one that is already on the list is a no-op.
    ///
    /// # Returns
    ///
    /// Returns `true` if a new row was inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn add(&self, user_id: UserId, product_id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO wishlist_items (user_id, product_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, product_id) DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Product behind one of the user's wishlist rows.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product_for(
        &self,
        user_id: UserId,
        item_id: WishlistItemId,
    ) -> Result<Option<ProductId>, RepositoryError> {
        let product_id = sqlx::query_scalar::<_, ProductId>(
            "SELECT product_id FROM wishlist_items WHERE id = $1 AND user_id = $2",
        )
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(product_id)
    }

    /// Remove one of the user's wishlist rows.
    ///
    /// # Returns
    ///
    /// Returns `true` if the row was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(
        &self,
        user_id: UserId,
        item_id: WishlistItemId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM wishlist_items WHERE id = $1 AND user_id = $2")
            .bind(item_id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
