//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! bazaar-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `BAZAAR_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Storefront migrations live in `crates/storefront/migrations/`:
//! ```text
//! migrations/
//! ├── 20260301000001_create_users.sql
//! ├── 20260301000002_create_catalog.sql
//! ├── 20260301000003_create_cart_and_wishlist.sql
//! └── 20260301000004_create_orders.sql
//! ```
//!
//! The session table (`tower_sessions.session`) is owned by the session store
//! and created through its own `migrate()`.

use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

use bazaar_storefront::db;

/// Errors from migration and seeding commands.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run storefront database migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database URL is missing, the connection
/// fails, or a migration cannot be applied.
pub async fn storefront() -> Result<(), MigrationError> {
    let database_url = super::database_url()?;

    tracing::info!("Connecting to storefront database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Creating session store table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Storefront migrations complete!");
    Ok(())
}
