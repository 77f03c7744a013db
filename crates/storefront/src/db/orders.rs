//! Order repository.
//!
//! Headers and lines are written once at checkout and only read afterwards.
//! The write helpers take a `PgConnection` so checkout can run them inside a
//! single transaction together with clearing the cart.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use bazaar_core::{
    INITIAL_ORDER_STATUS, INITIAL_PAYMENT_STATUS, OrderId, OrderNumber, OrderTotals,
    PostalAddress, UserId,
};

use super::{RepositoryError, conflict_on_unique};
use crate::models::order::{NewOrderLine, Order, OrderDraft, OrderLine, OrderSummary};

/// Raw `orders` row.
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    order_number: String,
    subtotal: Decimal,
    tax_amount: Decimal,
    shipping_amount: Decimal,
    total_amount: Decimal,
    shipping_address: Json<PostalAddress>,
    billing_address: Json<PostalAddress>,
    status: String,
    payment_status: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let order_number = OrderNumber::parse(&row.order_number).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order number in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            order_number,
            totals: OrderTotals {
                subtotal: row.subtotal,
                tax: row.tax_amount,
                shipping: row.shipping_amount,
                total: row.total_amount,
            },
            shipping_address: row.shipping_address.0,
            billing_address: row.billing_address.0,
            status: row.status,
            payment_status: row.payment_status,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

/// Repository for reading placed orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's orders, newest first, with item counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderSummary>(
            r"
            SELECT o.id, o.order_number, o.status, o.payment_status, o.total_amount,
                   COALESCE(SUM(oi.quantity), 0)::BIGINT AS item_count,
                   o.created_at
            FROM orders o
            LEFT JOIN order_items oi ON oi.order_id = o.id
            WHERE o.user_id = $1
            GROUP BY o.id
            ORDER BY o.created_at DESC, o.id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// One of the user's orders with its lines. Other users' orders are
    /// reported as missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored order number is malformed.
    pub async fn get_for_user(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<Option<(Order, Vec<OrderLine>)>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, order_number, subtotal, tax_amount, shipping_amount,
                   total_amount, shipping_address, billing_address, status, payment_status,
                   notes, created_at
            FROM orders
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, OrderLine>(
            r"
            SELECT id, order_id, product_id, variant_id, product_name, variant_name,
                   quantity, unit_price, line_total
            FROM order_items
            WHERE order_id = $1
            ORDER BY id ASC
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some((Order::try_from(row)?, lines)))
    }
}

/// Insert an order header with status and payment status `pending`.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the order number is already taken.
/// Returns `RepositoryError::Database` for other database errors.
pub async fn insert_header(
    conn: &mut PgConnection,
    user_id: UserId,
    draft: &OrderDraft,
) -> Result<OrderId, RepositoryError> {
    let id = sqlx::query_scalar::<_, OrderId>(
        r"
        INSERT INTO orders (
            user_id, order_number, subtotal, tax_amount, shipping_amount, total_amount,
            shipping_address, billing_address, status, payment_status, notes
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING id
        ",
    )
    .bind(user_id)
    .bind(draft.order_number.as_str())
    .bind(draft.totals.subtotal)
    .bind(draft.totals.tax)
    .bind(draft.totals.shipping)
    .bind(draft.totals.total)
    .bind(Json(&draft.shipping_address))
    .bind(Json(&draft.billing_address))
    .bind(INITIAL_ORDER_STATUS)
    .bind(INITIAL_PAYMENT_STATUS)
    .bind(draft.notes.as_deref())
    .fetch_one(conn)
    .await
    .map_err(|e| conflict_on_unique(e, "order number"))?;

    Ok(id)
}

/// Insert the line items of an order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if any insert fails.
pub async fn insert_lines(
    conn: &mut PgConnection,
    order_id: OrderId,
    lines: &[NewOrderLine],
) -> Result<(), RepositoryError> {
    for line in lines {
        let quantity = i32::try_from(line.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!("quantity {} out of range", line.quantity))
        })?;

        sqlx::query(
            r"
            INSERT INTO order_items (
                order_id, product_id, variant_id, product_name, variant_name,
                quantity, unit_price, line_total
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(order_id)
        .bind(line.product_id)
        .bind(line.variant_id)
        .bind(&line.product_name)
        .bind(line.variant_name.as_deref())
        .bind(quantity)
        .bind(line.unit_price)
        .bind(line.line_total)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}
