//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Password sign-up and login (argon2)
//! - `catalog` - Product reads with a short-lived detail cache
//! - `checkout` - Order totals and order placement

pub mod auth;
pub mod catalog;
pub mod checkout;

pub use auth::{AuthError, AuthService};
pub use catalog::CatalogService;
pub use checkout::{CheckoutError, CheckoutRequest, CheckoutService, CheckoutStore, PgCheckoutStore};
