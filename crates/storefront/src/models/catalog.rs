//! Catalog types: products, variants, images and stock display rules.

use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use bazaar_core::pricing::{discount_percentage, effective_unit_price};
use bazaar_core::{ProductId, ProductImageId, VariantId};

/// Largest quantity a single cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 10;

/// Stock at or below this level shows an "only N left" notice.
pub const LOW_STOCK_THRESHOLD: u32 = 5;

/// Status of products that are visible in the storefront.
pub const ACTIVE_STATUS: &str = "active";

/// A catalog product.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub stock_quantity: i32,
    pub featured: bool,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Percentage saved against the compare-at price, if any.
    #[must_use]
    pub fn discount_percentage(&self) -> Option<u32> {
        discount_percentage(self.price, self.compare_at_price)
    }
}

/// A purchasable sub-selection of a product (size, scent, ...).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductVariant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub name: String,
    /// Price override; `None` or zero means "use the product price".
    pub price: Option<Decimal>,
    pub stock_quantity: i32,
    pub sku: Option<String>,
}

impl ProductVariant {
    /// Price charged for one unit of this variant of `product`.
    #[must_use]
    pub fn unit_price(&self, product: &Product) -> Decimal {
        effective_unit_price(product.price, self.price)
    }
}

/// A product image.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductImage {
    pub id: ProductImageId,
    pub product_id: ProductId,
    pub url: String,
    pub alt_text: Option<String>,
    pub position: i32,
}

/// Product row for listings, with its first image.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub stock_quantity: i32,
    pub featured: bool,
    pub image_url: Option<String>,
}

impl ProductSummary {
    #[must_use]
    pub fn discount_percentage(&self) -> Option<u32> {
        discount_percentage(self.price, self.compare_at_price)
    }
}

/// A product with its images (by position) and variants (by name).
#[derive(Debug, Clone)]
pub struct ProductDetail {
    pub product: Product,
    pub images: Vec<ProductImage>,
    pub variants: Vec<ProductVariant>,
}

impl ProductDetail {
    /// Unit price charged for one of this product's variants.
    #[must_use]
    pub fn variant_price(&self, variant: &ProductVariant) -> Decimal {
        variant.unit_price(&self.product)
    }
}

/// How much stock a product has, for display purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockLevel {
    OutOfStock,
    Low(u32),
    InStock(u32),
}

impl StockLevel {
    /// Classify a raw stock count. Negative counts are treated as zero.
    #[must_use]
    pub fn from_quantity(quantity: i32) -> Self {
        match u32::try_from(quantity).unwrap_or(0) {
            0 => Self::OutOfStock,
            n if n <= LOW_STOCK_THRESHOLD => Self::Low(n),
            n => Self::InStock(n),
        }
    }

    #[must_use]
    pub const fn is_available(&self) -> bool {
        !matches!(self, Self::OutOfStock)
    }

    /// Customer-facing stock notice, if one should be shown.
    #[must_use]
    pub fn notice(&self) -> Option<String> {
        match self {
            Self::OutOfStock => Some("Out of stock".to_string()),
            Self::Low(n) => Some(format!("Only {n} left in stock!")),
            Self::InStock(_) => None,
        }
    }

    /// Notice explaining why `quantity` units cannot be added, if they can't.
    #[must_use]
    pub fn shortfall(&self, quantity: u32) -> Option<String> {
        match self {
            Self::OutOfStock => Some("Sorry, that product is out of stock.".to_string()),
            Self::Low(n) | Self::InStock(n) if quantity > *n => {
                Some(format!("Only {n} left in stock."))
            }
            Self::Low(_) | Self::InStock(_) => None,
        }
    }

    /// Quantities offered by the add-to-cart selector.
    #[must_use]
    pub fn quantity_choices(&self) -> RangeInclusive<u32> {
        let stock = match self {
            Self::OutOfStock => 0,
            Self::Low(n) | Self::InStock(n) => *n,
        };
        1..=stock.clamp(1, MAX_LINE_QUANTITY)
    }
}

/// Whether `quantity` may be stored on a cart line.
#[must_use]
pub const fn is_valid_line_quantity(quantity: u32) -> bool {
    quantity >= 1 && quantity <= MAX_LINE_QUANTITY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_level_classification() {
        assert_eq!(StockLevel::from_quantity(0), StockLevel::OutOfStock);
        assert_eq!(StockLevel::from_quantity(-3), StockLevel::OutOfStock);
        assert_eq!(StockLevel::from_quantity(1), StockLevel::Low(1));
        assert_eq!(StockLevel::from_quantity(5), StockLevel::Low(5));
        assert_eq!(StockLevel::from_quantity(6), StockLevel::InStock(6));
    }

    #[test]
    fn test_stock_notice() {
        assert_eq!(
            StockLevel::OutOfStock.notice().as_deref(),
            Some("Out of stock")
        );
        assert_eq!(
            StockLevel::Low(3).notice().as_deref(),
            Some("Only 3 left in stock!")
        );
        assert_eq!(StockLevel::InStock(40).notice(), None);
        assert!(!StockLevel::OutOfStock.is_available());
    }

    #[test]
    fn test_stock_shortfall() {
        assert_eq!(
            StockLevel::OutOfStock.shortfall(1).as_deref(),
            Some("Sorry, that product is out of stock.")
        );
        assert_eq!(StockLevel::Low(3).shortfall(3), None);
        assert_eq!(
            StockLevel::Low(3).shortfall(4).as_deref(),
            Some("Only 3 left in stock.")
        );
        assert_eq!(StockLevel::InStock(40).shortfall(10), None);
    }

    #[test]
    fn test_quantity_choices_capped_at_ten() {
        assert_eq!(StockLevel::InStock(40).quantity_choices(), 1..=10);
        assert_eq!(StockLevel::Low(3).quantity_choices(), 1..=3);
        assert_eq!(StockLevel::OutOfStock.quantity_choices(), 1..=1);
    }

    #[test]
    fn test_line_quantity_bounds() {
        assert!(!is_valid_line_quantity(0));
        assert!(is_valid_line_quantity(1));
        assert!(is_valid_line_quantity(10));
        assert!(!is_valid_line_quantity(11));
    }

    #[test]
    fn test_variant_unit_price_falls_back_to_product() {
        let product = Product {
            id: ProductId::new(1),
            name: "Cold Brew Kit".to_string(),
            slug: "cold-brew-kit".to_string(),
            description: None,
            price: Decimal::new(3000, 2),
            compare_at_price: Some(Decimal::new(4000, 2)),
            stock_quantity: 12,
            featured: true,
            status: ACTIVE_STATUS.to_string(),
            created_at: Utc::now(),
        };
        let mut variant = ProductVariant {
            id: VariantId::new(9),
            product_id: product.id,
            name: "Large".to_string(),
            price: Some(Decimal::new(3500, 2)),
            stock_quantity: 4,
            sku: None,
        };

        assert_eq!(variant.unit_price(&product), Decimal::new(3500, 2));
        variant.price = Some(Decimal::ZERO);
        assert_eq!(variant.unit_price(&product), Decimal::new(3000, 2));
        variant.price = None;
        assert_eq!(variant.unit_price(&product), Decimal::new(3000, 2));
        assert_eq!(product.discount_percentage(), Some(25));
    }
}
