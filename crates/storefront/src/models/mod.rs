//! Domain models for the storefront.
//!
//! Catalog, cart, wishlist and order types are decoded straight from query
//! rows (`sqlx::FromRow`); the user type is validated from its row in
//! [`crate::db::users`].

pub mod cart;
pub mod catalog;
pub mod order;
pub mod session;
pub mod user;
pub mod wishlist;

pub use cart::CartLine;
pub use catalog::{Product, ProductDetail, ProductImage, ProductSummary, ProductVariant, StockLevel};
pub use order::{NewOrderLine, Order, OrderDraft, OrderLine, OrderReceipt, OrderSummary};
pub use session::{CurrentUser, Flash, FlashKind, keys as session_keys};
pub use user::User;
pub use wishlist::WishlistEntry;
