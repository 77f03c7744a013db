//! Cart and order totals.
//!
//! ```text
//! subtotal = Σ unit_price × quantity
//! tax      = round(subtotal × 8%, cents)   midpoint away from zero
//! shipping = 0                             flat, unconditional
//! total    = subtotal + tax + shipping
//! ```
//!
//! # Example
//!
//! ```
//! use bazaar_core::pricing::{OrderTotals, PricedLine};
//! use rust_decimal::Decimal;
//!
//! struct Line(Decimal, u32);
//!
//! impl PricedLine for Line {
//!     fn unit_price(&self) -> Decimal { self.0 }
//!     fn quantity(&self) -> u32 { self.1 }
//! }
//!
//! let cart = [Line(Decimal::new(1000, 2), 2), Line(Decimal::new(500, 2), 1)];
//! let totals = OrderTotals::calculate(&cart);
//!
//! assert_eq!(totals.subtotal, Decimal::new(2500, 2));
//! assert_eq!(totals.tax, Decimal::new(200, 2));
//! assert_eq!(totals.total, Decimal::new(2700, 2));
//! ```

use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::types::price::round_to_cents;

/// Sales tax applied to every order (8%).
pub const SALES_TAX_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);

/// Shipping charged on every order.
pub const FLAT_SHIPPING: Decimal = Decimal::ZERO;

/// Anything with a unit price and a quantity: cart lines, order lines.
pub trait PricedLine {
    /// Effective price of one unit.
    fn unit_price(&self) -> Decimal;

    /// Number of units.
    fn quantity(&self) -> u32;

    /// `unit_price × quantity`.
    fn line_total(&self) -> Decimal {
        line_total(self.unit_price(), self.quantity())
    }
}

/// Price of a single cart or order line.
#[must_use]
pub fn line_total(unit_price: Decimal, quantity: u32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

/// Resolve the price charged for one unit.
///
/// A selected variant's own price wins when it is set; a missing or zero
/// variant price falls back to the product's base price.
#[must_use]
pub fn effective_unit_price(product_price: Decimal, variant_price: Option<Decimal>) -> Decimal {
    variant_price
        .filter(|price| !price.is_zero())
        .unwrap_or(product_price)
}

/// Sales tax owed on a subtotal, rounded to cents.
#[must_use]
pub fn sales_tax(subtotal: Decimal) -> Decimal {
    round_to_cents(subtotal * SALES_TAX_RATE)
}

/// Whole-number percentage saved against a compare-at price.
///
/// Returns `None` when there is no compare-at price or it is not higher
/// than the selling price.
#[must_use]
pub fn discount_percentage(price: Decimal, compare_at_price: Option<Decimal>) -> Option<u32> {
    let compare_at = compare_at_price?;
    if compare_at <= price || compare_at <= Decimal::ZERO {
        return None;
    }

    let saved = (compare_at - price) / compare_at * Decimal::ONE_HUNDRED;
    saved
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .filter(|pct| *pct > 0)
}

/// Computed money breakdown for a cart or order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// Compute totals for a set of priced lines. An empty set yields zeros.
    pub fn calculate<'a, L, I>(lines: I) -> Self
    where
        L: PricedLine + 'a,
        I: IntoIterator<Item = &'a L>,
    {
        let subtotal = lines
            .into_iter()
            .map(PricedLine::line_total)
            .sum::<Decimal>();
        Self::from_subtotal(subtotal)
    }

    /// Derive tax, shipping and total from a precomputed subtotal.
    #[must_use]
    pub fn from_subtotal(subtotal: Decimal) -> Self {
        let tax = sales_tax(subtotal);
        let shipping = FLAT_SHIPPING;
        Self {
            subtotal,
            tax,
            shipping,
            total: subtotal + tax + shipping,
        }
    }

    /// Whether shipping is free for this order.
    #[must_use]
    pub fn ships_free(&self) -> bool {
        self.shipping.is_zero()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct Line {
        price: Decimal,
        qty: u32,
    }

    impl PricedLine for Line {
        fn unit_price(&self) -> Decimal {
            self.price
        }

        fn quantity(&self) -> u32 {
            self.qty
        }
    }

    fn dollars(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn test_reference_cart() {
        let cart = vec![
            Line {
                price: dollars(1000),
                qty: 2,
            },
            Line {
                price: dollars(500),
                qty: 1,
            },
        ];

        let totals = OrderTotals::calculate(&cart);
        assert_eq!(totals.subtotal, dollars(2500));
        assert_eq!(totals.tax, dollars(200));
        assert_eq!(totals.shipping, Decimal::ZERO);
        assert_eq!(totals.total, dollars(2700));
        assert!(totals.ships_free());
    }

    #[test]
    fn test_empty_cart_is_all_zero() {
        let cart: Vec<Line> = Vec::new();
        assert_eq!(OrderTotals::calculate(&cart), OrderTotals::default());
    }

    #[test]
    fn test_tax_rounds_half_cent_up() {
        // 0.08 × 12.5625 = 1.005 -> 1.01
        assert_eq!(sales_tax(Decimal::new(125_625, 4)), dollars(101));
        // 0.08 × 19.99 = 1.5992 -> 1.60
        assert_eq!(sales_tax(dollars(1999)), dollars(160));
        // 0.08 × 0.06 = 0.0048 -> 0.00
        assert_eq!(sales_tax(dollars(6)), Decimal::ZERO);
    }

    #[test]
    fn test_total_is_subtotal_plus_rounded_tax() {
        let totals = OrderTotals::from_subtotal(dollars(3397));
        // 33.97 × 0.08 = 2.7176
        assert_eq!(totals.tax, dollars(272));
        assert_eq!(totals.total, dollars(3669));
        assert_eq!(totals.total, totals.subtotal + totals.tax + totals.shipping);
    }

    #[test]
    fn test_subtotal_sums_every_line() {
        let cart: Vec<Line> = (1..=5)
            .map(|i| Line {
                price: dollars(i * 199),
                qty: u32::try_from(i).unwrap(),
            })
            .collect();
        // Σ 1.99·i·i for i in 1..=5 = 1.99 × 55
        assert_eq!(OrderTotals::calculate(&cart).subtotal, dollars(10945));
    }

    #[test]
    fn test_effective_unit_price() {
        let base = dollars(2000);
        assert_eq!(effective_unit_price(base, None), base);
        assert_eq!(effective_unit_price(base, Some(dollars(2500))), dollars(2500));
        assert_eq!(effective_unit_price(base, Some(dollars(1500))), dollars(1500));
        assert_eq!(effective_unit_price(base, Some(Decimal::ZERO)), base);
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line_total(dollars(333), 3), dollars(999));
        assert_eq!(line_total(dollars(333), 0), Decimal::ZERO);
    }

    #[test]
    fn test_discount_percentage() {
        assert_eq!(discount_percentage(dollars(7500), Some(dollars(10000))), Some(25));
        // 1 - 19.99/29.99 = 33.34% -> 33
        assert_eq!(discount_percentage(dollars(1999), Some(dollars(2999))), Some(33));
        assert_eq!(discount_percentage(dollars(1000), Some(dollars(1000))), None);
        assert_eq!(discount_percentage(dollars(1000), Some(dollars(900))), None);
        assert_eq!(discount_percentage(dollars(1000), None), None);
    }
}
