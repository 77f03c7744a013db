//! Core types for Bazaar.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod email;
pub mod id;
pub mod order_number;
pub mod price;
pub mod status;

pub use address::{AddressError, PostalAddress};
pub use email::{Email, EmailError};
pub use id::*;
pub use order_number::{OrderNumber, OrderNumberError};
pub use price::{CurrencyCode, Price, round_to_cents};
pub use status::*;
