//! Cart repository.
//!
//! Every mutation is scoped to the owning user so one account can never touch
//! another's cart rows by guessing ids.

use sqlx::{PgConnection, PgPool};

use bazaar_core::{CartItemId, ProductId, UserId, VariantId};

use super::RepositoryError;
use crate::models::cart::CartLine;

/// Cart rows joined to product and variant name/price, oldest line first.
const CART_LINES_SELECT: &str = r"
    SELECT c.id, c.product_id, c.variant_id,
           p.name AS product_name, v.name AS variant_name,
           p.price AS product_price, v.price AS variant_price,
           c.quantity,
           (SELECT i.url FROM product_images i
             WHERE i.product_id = p.id
             ORDER BY i.position ASC, i.id ASC
             LIMIT 1) AS image_url
    FROM cart_items c
    JOIN products p ON p.id = c.product_id
    LEFT JOIN product_variants v ON v.id = c.variant_id
    WHERE c.user_id = $1
    ORDER BY c.created_at ASC, c.id ASC
";

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load the user's cart lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        load_lines(&mut *conn, user_id).await
    }

    /// Total units in the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn item_count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM cart_items WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// Add a new cart line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        variant_id: Option<VariantId>,
        quantity: u32,
    ) -> Result<CartItemId, RepositoryError> {
        let id = sqlx::query_scalar::<_, CartItemId>(
            r"
            INSERT INTO cart_items (user_id, product_id, variant_id, quantity)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(variant_id)
        .bind(to_db_quantity(quantity)?)
        .fetch_one(self.pool)
        .await?;
        Ok(id)
    }

    /// Set the quantity of one of the user's cart lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line doesn't belong to the user.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE cart_items
            SET quantity = $1
            WHERE id = $2 AND user_id = $3
            ",
        )
        .bind(to_db_quantity(quantity)?)
        .bind(item_id)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Remove one of the user's cart lines.
    ///
    /// # Returns
    ///
    /// Returns `true` if the line was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(&self, user_id: UserId, item_id: CartItemId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
            .bind(item_id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Load the user's cart lines on an existing connection or transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn load_lines(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Vec<CartLine>, RepositoryError> {
    let lines = sqlx::query_as::<_, CartLine>(CART_LINES_SELECT)
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(lines)
}

/// Delete the given cart rows owned by the user.
///
/// Rows added after the checkout snapshot are not in `item_ids` and stay in
/// the cart.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the delete fails.
pub async fn clear(
    conn: &mut PgConnection,
    user_id: UserId,
    item_ids: &[CartItemId],
) -> Result<u64, RepositoryError> {
    let ids: Vec<i32> = item_ids.iter().map(CartItemId::as_i32).collect();
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND id = ANY($2)")
        .bind(user_id)
        .bind(&ids)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

fn to_db_quantity(quantity: u32) -> Result<i32, RepositoryError> {
    i32::try_from(quantity)
        .map_err(|_| RepositoryError::DataCorruption(format!("quantity {quantity} out of range")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_to_db_quantity() {
        assert_eq!(to_db_quantity(3).unwrap(), 3);
        assert!(matches!(
            to_db_quantity(u32::MAX),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
