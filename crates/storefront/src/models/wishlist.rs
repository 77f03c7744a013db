//! Wishlist entries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use bazaar_core::pricing::discount_percentage;
use bazaar_core::{ProductId, WishlistItemId};

use super::catalog::StockLevel;

/// A saved product joined to its current price and first image.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WishlistEntry {
    pub id: WishlistItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub stock_quantity: i32,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl WishlistEntry {
    #[must_use]
    pub fn discount_percentage(&self) -> Option<u32> {
        discount_percentage(self.price, self.compare_at_price)
    }

    #[must_use]
    pub fn stock(&self) -> StockLevel {
        StockLevel::from_quantity(self.stock_quantity)
    }
}
