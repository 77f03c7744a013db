//! Order types: drafts written at checkout and records read back for history.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use bazaar_core::pricing::PricedLine;
use bazaar_core::{
    CartItemId, OrderId, OrderItemId, OrderNumber, OrderTotals, PostalAddress, ProductId, StatusTone, UserId,
    VariantId, order_status_tone, payment_status_tone,
};

use super::cart::CartLine;

/// Everything needed to persist one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub order_number: OrderNumber,
    pub totals: OrderTotals,
    pub shipping_address: PostalAddress,
    pub billing_address: PostalAddress,
    pub notes: Option<String>,
    pub lines: Vec<NewOrderLine>,
    /// Cart rows the lines were taken from; only these are removed on commit.
    pub cart_item_ids: Vec<CartItemId>,
}

/// An order line captured from a cart line at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

impl From<&CartLine> for NewOrderLine {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id,
            variant_id: line.variant_id,
            product_name: line.product_name.clone(),
            variant_name: line.variant_name.clone(),
            quantity: line.quantity(),
            unit_price: line.unit_price(),
            line_total: line.line_total(),
        }
    }
}

/// Identity of a freshly placed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReceipt {
    pub order_id: OrderId,
    pub order_number: OrderNumber,
}

/// A persisted order header.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub order_number: OrderNumber,
    pub totals: OrderTotals,
    pub shipping_address: PostalAddress,
    pub billing_address: PostalAddress,
    pub status: String,
    pub payment_status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    #[must_use]
    pub fn status_tone(&self) -> StatusTone {
        order_status_tone(&self.status)
    }

    #[must_use]
    pub fn payment_status_tone(&self) -> StatusTone {
        payment_status_tone(&self.payment_status)
    }
}

/// A persisted order line.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderLine {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// Order history row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderSummary {
    pub id: OrderId,
    pub order_number: String,
    pub status: String,
    pub payment_status: String,
    pub total_amount: Decimal,
    /// Sum of line quantities.
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use bazaar_core::CartItemId;

    use super::*;

    #[test]
    fn test_new_order_line_captures_cart_line() {
        let cart_line = CartLine {
            id: CartItemId::new(1),
            product_id: ProductId::new(4),
            variant_id: Some(VariantId::new(40)),
            product_name: "Pour-over Kettle".to_string(),
            variant_name: Some("Matte Black".to_string()),
            product_price: Decimal::new(4500, 2),
            variant_price: Some(Decimal::new(4950, 2)),
            quantity: 2,
            image_url: None,
        };

        let line = NewOrderLine::from(&cart_line);
        assert_eq!(line.product_id, ProductId::new(4));
        assert_eq!(line.variant_name.as_deref(), Some("Matte Black"));
        assert_eq!(line.quantity, 2);
        assert_eq!(line.unit_price, Decimal::new(4950, 2));
        assert_eq!(line.line_total, Decimal::new(9900, 2));
    }
}
