//! Database operations for the storefront `PostgreSQL`.
//!
//! ## Tables
//!
//! - `users` / `user_passwords` - Site accounts and argon2 password hashes
//! - `tower_sessions.session` - Session storage (created by the session store)
//! - `products`, `product_variants`, `product_images` - Catalog
//! - `cart_items` - Pending purchase intent, one row per added line
//! - `wishlist_items` - Saved products, unique per (user, product)
//! - `orders`, `order_items` - Placed orders with denormalized line snapshots
//!
//! Queries are built at runtime with `sqlx::query_as` and `FromRow` rows so the
//! crate compiles without a live database.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p bazaar-cli -- migrate
//! ```

pub mod cart;
pub mod orders;
pub mod products;
pub mod users;
pub mod wishlist;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use cart::CartRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use users::UserRepository;
pub use wishlist::WishlistRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique violation to `RepositoryError::Conflict`, anything else to
/// `RepositoryError::Database`.
pub(crate) fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
