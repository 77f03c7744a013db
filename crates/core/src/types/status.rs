//! Order and payment status labels.
//!
//! Statuses are free-form text owned by whoever updates the order after
//! checkout (fulfilment, payment provider, support staff). The storefront
//! never enforces transitions; it only writes the initial value and picks a
//! display tone when rendering.

use serde::{Deserialize, Serialize};

/// Status written to every new order header.
pub const INITIAL_ORDER_STATUS: &str = "pending";

/// Payment status written to every new order header.
pub const INITIAL_PAYMENT_STATUS: &str = "pending";

/// Visual tone for a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatusTone {
    Success,
    #[default]
    Neutral,
    Info,
    Danger,
}

impl StatusTone {
    /// CSS modifier used by the badge partial.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self {
            Self::Success => "badge--success",
            Self::Neutral => "badge--neutral",
            Self::Info => "badge--info",
            Self::Danger => "badge--danger",
        }
    }
}

/// Pick a badge tone for an order status. Unknown statuses are neutral.
#[must_use]
pub fn order_status_tone(status: &str) -> StatusTone {
    match status.trim().to_lowercase().as_str() {
        "completed" | "delivered" => StatusTone::Success,
        "shipped" => StatusTone::Info,
        "cancelled" => StatusTone::Danger,
        _ => StatusTone::Neutral,
    }
}

/// Pick a badge tone for a payment status. Unknown statuses are neutral.
#[must_use]
pub fn payment_status_tone(status: &str) -> StatusTone {
    match status.trim().to_lowercase().as_str() {
        "paid" => StatusTone::Success,
        "failed" => StatusTone::Danger,
        _ => StatusTone::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_tone() {
        assert_eq!(order_status_tone("completed"), StatusTone::Success);
        assert_eq!(order_status_tone("Delivered"), StatusTone::Success);
        assert_eq!(order_status_tone("pending"), StatusTone::Neutral);
        assert_eq!(order_status_tone("processing"), StatusTone::Neutral);
        assert_eq!(order_status_tone("shipped"), StatusTone::Info);
        assert_eq!(order_status_tone("CANCELLED"), StatusTone::Danger);
        assert_eq!(order_status_tone("on hold"), StatusTone::Neutral);
    }

    #[test]
    fn test_payment_status_tone() {
        assert_eq!(payment_status_tone("paid"), StatusTone::Success);
        assert_eq!(payment_status_tone("pending"), StatusTone::Neutral);
        assert_eq!(payment_status_tone("failed"), StatusTone::Danger);
        assert_eq!(payment_status_tone("refunded"), StatusTone::Neutral);
    }

    #[test]
    fn test_initial_statuses_are_pending() {
        assert_eq!(INITIAL_ORDER_STATUS, "pending");
        assert_eq!(INITIAL_PAYMENT_STATUS, "pending");
    }
}
