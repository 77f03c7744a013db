//! Bazaar Core - Shared domain types and pricing rules.
//!
//! This crate provides the types used across the Bazaar workspace:
//! - `storefront` - Customer-facing web store
//! - `cli` - Command-line tools for migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Everything here can be unit tested without a runtime.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, addresses, order
//!   numbers and statuses
//! - [`pricing`] - Cart/order totals (subtotal, sales tax, shipping, total)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pricing;
pub mod types;

pub use pricing::{OrderTotals, PricedLine};
pub use types::*;
