pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Storefront database URL from `BAZAAR_DATABASE_URL`, falling back to `DATABASE_URL`.
pub(crate) fn database_url() -> Result<SecretString, migrate::MigrationError> {
    dotenvy::dotenv().ok();

    std::env::var("BAZAAR_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| migrate::MigrationError::MissingEnvVar("BAZAAR_DATABASE_URL"))
}
