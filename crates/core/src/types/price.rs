//! Type-safe price representation using decimal arithmetic.
//!
//! Money never touches floating point: catalog prices are stored as
//! `NUMERIC(10,2)` and decoded straight into [`Decimal`].

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in the store's default currency.
    #[must_use]
    pub const fn usd(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::USD)
    }

    /// The amount rounded to whole cents (midpoint away from zero).
    #[must_use]
    pub fn rounded(&self) -> Decimal {
        round_to_cents(self.amount)
    }

    /// Format for display (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency_code.symbol(), self.rounded())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Round a currency amount to two decimal places, midpoint away from zero.
#[must_use]
pub fn round_to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// ISO 4217 currency codes the store sells in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::USD => "$",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_pads_to_two_places() {
        assert_eq!(Price::usd(Decimal::new(25, 0)).display(), "$25.00");
        assert_eq!(Price::usd(Decimal::new(199, 1)).display(), "$19.90");
    }

    #[test]
    fn test_display_rounds_fractional_cents() {
        // 2.345 -> 2.35 (midpoint away from zero, not banker's rounding)
        assert_eq!(Price::usd(Decimal::new(2345, 3)).display(), "$2.35");
        assert_eq!(Price::usd(Decimal::new(2344, 3)).display(), "$2.34");
    }

    #[test]
    fn test_default_currency_is_usd() {
        let price = Price::new(Decimal::new(1999, 2), CurrencyCode::default());
        assert_eq!(price, Price::usd(Decimal::new(1999, 2)));
        assert_eq!(price.to_string(), "$19.99");
    }
}
