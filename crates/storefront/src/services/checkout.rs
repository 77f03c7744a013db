//! Checkout: cart snapshot, order totals and order placement.
//!
//! # Order placement
//!
//! ```text
//! load cart ──► empty? ──► EmptyCart
//!     │
//!     ▼
//! resolve addresses (billing = shipping when "same as shipping")
//!     │
//!     ▼
//! price lines, build OrderDraft with a fresh order number
//!     │
//!     ▼
//! commit: insert header ─► insert lines ─► remove snapshotted cart rows (one transaction)
//!     │
//!     └── order number taken? regenerate and retry (max 3 attempts)
//! ```
//!
//! Storage sits behind [`CheckoutStore`]; [`PgCheckoutStore`] is the
//! `PostgreSQL` implementation used by the web routes.

use std::future::Future;

use sqlx::PgPool;
use thiserror::Error;

use bazaar_core::{AddressError, OrderNumber, OrderTotals, PostalAddress, UserId};

use crate::db::{RepositoryError, cart, orders};
use crate::models::cart::CartLine;
use crate::models::order::{NewOrderLine, OrderDraft, OrderReceipt};

/// How many order numbers to try before giving up on collisions.
pub const MAX_ORDER_NUMBER_ATTEMPTS: u32 = 3;

/// Notice shown when an order cannot be placed for a server-side reason.
pub const ORDER_FAILED_MESSAGE: &str = "Failed to place order. Please try again.";

/// Errors that can occur while checking out.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The user's cart has no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// A required address field is blank.
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressError),

    /// The generated order number is already in use.
    #[error("order number already in use")]
    DuplicateOrderNumber,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Address fields as typed into the checkout form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressFields {
    pub full_name: String,
    pub address_line_1: String,
    pub address_line_2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub phone: String,
}

impl AddressFields {
    /// Validate into a [`PostalAddress`].
    ///
    /// # Errors
    ///
    /// Returns `AddressError::MissingField` naming the first blank required field.
    pub fn to_address(&self) -> Result<PostalAddress, AddressError> {
        PostalAddress::from_parts(
            &self.full_name,
            &self.address_line_1,
            Some(&self.address_line_2),
            &self.city,
            &self.state,
            &self.postal_code,
            &self.country,
            Some(&self.phone),
        )
    }
}

/// A submitted checkout form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub shipping: AddressFields,
    pub billing_same_as_shipping: bool,
    pub billing: AddressFields,
    pub notes: Option<String>,
}

impl Default for CheckoutRequest {
    fn default() -> Self {
        Self {
            shipping: AddressFields::default(),
            billing_same_as_shipping: true,
            billing: AddressFields::default(),
            notes: None,
        }
    }
}

impl CheckoutRequest {
    /// Shipping and billing addresses for the order.
    ///
    /// Billing is an exact copy of shipping when "same as shipping" is set;
    /// the billing fields are ignored in that case.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::MissingField` for the first blank required field.
    pub fn resolve_addresses(&self) -> Result<(PostalAddress, PostalAddress), AddressError> {
        let shipping = self.shipping.to_address()?;
        let billing = if self.billing_same_as_shipping {
            shipping.clone()
        } else {
            self.billing.to_address()?
        };
        Ok((shipping, billing))
    }

    fn normalized_notes(&self) -> Option<String> {
        self.notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_owned)
    }
}

/// Cart snapshot and totals for the checkout page.
#[derive(Debug, Clone)]
pub struct CheckoutSummary {
    pub lines: Vec<CartLine>,
    pub totals: OrderTotals,
}

/// Storage used by checkout.
///
/// `commit_order` must be all-or-nothing: the header, every line and the
/// removal of the snapshotted cart rows either all persist or none do.
pub trait CheckoutStore: Send + Sync {
    /// Snapshot the user's cart lines.
    fn load_cart(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<CartLine>, CheckoutError>> + Send;

    /// Persist the order header and lines, then remove the cart rows listed
    /// in `draft.cart_item_ids`.
    ///
    /// Returns `CheckoutError::DuplicateOrderNumber` when the draft's order
    /// number is already taken.
    fn commit_order(
        &self,
        user_id: UserId,
        draft: &OrderDraft,
    ) -> impl Future<Output = Result<OrderReceipt, CheckoutError>> + Send;
}

/// `PostgreSQL` checkout store.
pub struct PgCheckoutStore<'a> {
    pool: &'a PgPool,
}

impl<'a> PgCheckoutStore<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl CheckoutStore for PgCheckoutStore<'_> {
    async fn load_cart(&self, user_id: UserId) -> Result<Vec<CartLine>, CheckoutError> {
        let mut conn = self.pool.acquire().await.map_err(RepositoryError::from)?;
        Ok(cart::load_lines(&mut *conn, user_id).await?)
    }

    async fn commit_order(
        &self,
        user_id: UserId,
        draft: &OrderDraft,
    ) -> Result<OrderReceipt, CheckoutError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let order_id = orders::insert_header(&mut *tx, user_id, draft)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => CheckoutError::DuplicateOrderNumber,
                other => CheckoutError::Repository(other),
            })?;

        orders::insert_lines(&mut *tx, order_id, &draft.lines).await?;
        let cleared = cart::clear(&mut *tx, user_id, &draft.cart_item_ids).await?;

        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::debug!(order_id = %order_id, cleared, "Order committed");

        Ok(OrderReceipt {
            order_id,
            order_number: draft.order_number.clone(),
        })
    }
}

/// Checkout service over a [`CheckoutStore`].
pub struct CheckoutService<S> {
    store: S,
}

impl<S: CheckoutStore> CheckoutService<S> {
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Cart snapshot and totals for rendering the checkout page.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if the cart has no lines.
    /// Returns `CheckoutError::Repository` if the cart cannot be loaded.
    pub async fn summary(&self, user_id: UserId) -> Result<CheckoutSummary, CheckoutError> {
        let lines = self.store.load_cart(user_id).await?;
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let totals = OrderTotals::calculate(&lines);
        Ok(CheckoutSummary { lines, totals })
    }

    /// Turn the user's cart into an order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if the cart has no lines.
    /// Returns `CheckoutError::InvalidAddress` if a required address field is blank.
    /// Returns `CheckoutError::DuplicateOrderNumber` if every attempted order number collided.
    /// Returns `CheckoutError::Repository` if any store step fails.
    #[tracing::instrument(skip(self, request), fields(user_id = %user_id))]
    pub async fn place_order(
        &self,
        user_id: UserId,
        request: &CheckoutRequest,
    ) -> Result<OrderReceipt, CheckoutError> {
        let lines = self.store.load_cart(user_id).await?;
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let (shipping_address, billing_address) = request.resolve_addresses()?;

        let mut draft = OrderDraft {
            order_number: OrderNumber::generate(),
            totals: OrderTotals::calculate(&lines),
            shipping_address,
            billing_address,
            notes: request.normalized_notes(),
            lines: lines.iter().map(NewOrderLine::from).collect(),
            cart_item_ids: lines.iter().map(|line| line.id).collect(),
        };

        let mut attempt = 1;
        loop {
            match self.store.commit_order(user_id, &draft).await {
                Ok(receipt) => {
                    tracing::info!(
                        order_id = %receipt.order_id,
                        order_number = %receipt.order_number,
                        total = %draft.totals.total,
                        lines = draft.lines.len(),
                        "Order placed"
                    );
                    return Ok(receipt);
                }
                Err(CheckoutError::DuplicateOrderNumber) if attempt < MAX_ORDER_NUMBER_ATTEMPTS => {
                    tracing::warn!(
                        attempt,
                        order_number = %draft.order_number,
                        "Order number collision, regenerating"
                    );
                    draft.order_number = OrderNumber::generate();
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn portland() -> AddressFields {
        AddressFields {
            full_name: "Grace Hopper".to_string(),
            address_line_1: "1 Harbor Way".to_string(),
            address_line_2: String::new(),
            city: "Portland".to_string(),
            state: "OR".to_string(),
            postal_code: "97201".to_string(),
            country: "US".to_string(),
            phone: "503-555-0100".to_string(),
        }
    }

    #[test]
    fn test_billing_copies_shipping_when_same() {
        let request = CheckoutRequest {
            shipping: portland(),
            billing_same_as_shipping: true,
            billing: AddressFields {
                city: "Ignored".to_string(),
                ..AddressFields::default()
            },
            notes: None,
        };

        let (shipping, billing) = request.resolve_addresses().unwrap();
        assert_eq!(shipping, billing);
        assert_eq!(billing.city, "Portland");
    }

    #[test]
    fn test_separate_billing_is_validated() {
        let request = CheckoutRequest {
            shipping: portland(),
            billing_same_as_shipping: false,
            billing: AddressFields {
                full_name: "Accounts Payable".to_string(),
                ..AddressFields::default()
            },
            notes: None,
        };

        assert_eq!(
            request.resolve_addresses(),
            Err(AddressError::MissingField("address line 1"))
        );
    }

    #[test]
    fn test_blank_shipping_field_rejected() {
        let mut shipping = portland();
        shipping.postal_code = "  ".to_string();
        let request = CheckoutRequest {
            shipping,
            ..CheckoutRequest::default()
        };

        assert_eq!(
            request.resolve_addresses(),
            Err(AddressError::MissingField("postal code"))
        );
    }

    #[test]
    fn test_notes_are_trimmed_and_blank_dropped() {
        let mut request = CheckoutRequest {
            notes: Some("  leave at side door ".to_string()),
            ..CheckoutRequest::default()
        };
        assert_eq!(request.normalized_notes().as_deref(), Some("leave at side door"));

        request.notes = Some("   ".to_string());
        assert_eq!(request.normalized_notes(), None);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(CheckoutError::EmptyCart.to_string(), "cart is empty");
        assert_eq!(
            CheckoutError::from(AddressError::MissingField("city")).to_string(),
            "invalid address: city is required"
        );
    }
}
