//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use rust_decimal::Decimal;

use bazaar_core::Price;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats an amount as US dollars with two decimals.
///
/// Usage in templates: `{{ totals.total|money }}` renders `$27.00`
#[askama::filter_fn]
pub fn money(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_money(&value.to_string()))
}

fn format_money(raw: &str) -> String {
    raw.parse::<Decimal>()
        .map_or_else(|_| raw.to_string(), |amount| Price::usd(amount).display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money("27"), "$27.00");
        assert_eq!(format_money("2.005"), "$2.01");
        assert_eq!(format_money("not a number"), "not a number");
    }
}
