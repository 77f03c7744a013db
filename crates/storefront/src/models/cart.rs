//! Cart line snapshot.

use rust_decimal::Decimal;

use bazaar_core::pricing::{PricedLine, effective_unit_price};
use bazaar_core::{CartItemId, ProductId, VariantId};

/// One cart row joined to its product and optional variant.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CartLine {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub product_price: Decimal,
    pub variant_price: Option<Decimal>,
    pub quantity: i32,
    pub image_url: Option<String>,
}

impl PricedLine for CartLine {
    fn unit_price(&self) -> Decimal {
        effective_unit_price(self.product_price, self.variant_price)
    }

    fn quantity(&self) -> u32 {
        u32::try_from(self.quantity).unwrap_or(0)
    }
}

/// Total number of units across cart lines.
#[must_use]
pub fn item_count(lines: &[CartLine]) -> u32 {
    lines.iter().map(PricedLine::quantity).sum()
}

#[cfg(test)]
mod tests {
    use bazaar_core::OrderTotals;

    use super::*;

    fn line(id: i32, price: i64, variant_price: Option<i64>, quantity: i32) -> CartLine {
        CartLine {
            id: CartItemId::new(id),
            product_id: ProductId::new(id),
            variant_id: variant_price.map(|_| VariantId::new(id * 10)),
            product_name: format!("Product {id}"),
            variant_name: variant_price.map(|_| "Large".to_string()),
            product_price: Decimal::new(price, 2),
            variant_price: variant_price.map(|p| Decimal::new(p, 2)),
            quantity,
            image_url: None,
        }
    }

    #[test]
    fn test_variant_price_overrides_product_price() {
        assert_eq!(line(1, 1000, Some(1200), 1).unit_price(), Decimal::new(1200, 2));
        assert_eq!(line(1, 1000, Some(0), 1).unit_price(), Decimal::new(1000, 2));
        assert_eq!(line(1, 1000, None, 1).unit_price(), Decimal::new(1000, 2));
    }

    #[test]
    fn test_cart_totals() {
        let lines = vec![line(1, 1000, None, 2), line(2, 500, None, 1)];
        let totals = OrderTotals::calculate(&lines);
        assert_eq!(totals.subtotal, Decimal::new(2500, 2));
        assert_eq!(totals.total, Decimal::new(2700, 2));
        assert_eq!(item_count(&lines), 3);
    }

    #[test]
    fn test_negative_quantity_counts_as_zero() {
        assert_eq!(line(1, 1000, None, -2).quantity(), 0);
    }
}
