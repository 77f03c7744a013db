//! Seed the storefront catalog from a YAML file.
//!
//! ```yaml
//! products:
//!   - name: Ceramic Dripper
//!     slug: ceramic-dripper
//!     description: Hand-thrown pour-over cone.
//!     price: "24.00"
//!     compare_at_price: "30.00"
//!     stock_quantity: 12
//!     featured: true
//!     images:
//!       - url: /static/images/dripper.jpg
//!         alt_text: Ceramic dripper on a mug
//!     variants:
//!       - name: White
//!         stock_quantity: 8
//!       - name: Speckled
//!         price: "28.00"
//!         stock_quantity: 4
//!         sku: DRIP-SPK
//! ```
//!
//! Products are keyed by slug; a slug that already exists is skipped, so
//! re-running the same file is harmless.

use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{error, info};

use bazaar_core::{ProductId, round_to_cents};
use bazaar_storefront::db;
use bazaar_storefront::models::catalog::ACTIVE_STATUS;

/// Top-level catalog file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogFile {
    pub products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedProduct {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub compare_at_price: Option<Decimal>,
    #[serde(default)]
    pub stock_quantity: i32,
    #[serde(default)]
    pub featured: bool,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub images: Vec<SeedImage>,
    #[serde(default)]
    pub variants: Vec<SeedVariant>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedImage {
    pub url: String,
    #[serde(default)]
    pub alt_text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedVariant {
    pub name: String,
    /// Omit to sell at the product price.
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub stock_quantity: i32,
    #[serde(default)]
    pub sku: Option<String>,
}

fn default_status() -> String {
    ACTIVE_STATUS.to_string()
}

/// Outcome of a seeding run.
#[derive(Debug, Default)]
pub struct SeedResult {
    pub inserted: usize,
    pub skipped: usize,
    pub variants: usize,
    pub images: usize,
}

/// Check a catalog for problems the database would reject or silently accept.
///
/// Returns one message per problem; an empty list means the file is good.
#[must_use]
pub fn validate_catalog(catalog: &CatalogFile) -> Vec<String> {
    let mut errors = Vec::new();
    let mut slugs = HashSet::new();

    for (index, product) in catalog.products.iter().enumerate() {
        let label = if product.slug.trim().is_empty() {
            format!("product #{}", index + 1)
        } else {
            product.slug.clone()
        };

        if product.name.trim().is_empty() {
            errors.push(format!("{label}: name is required"));
        }
        if product.slug.trim().is_empty() {
            errors.push(format!("{label}: slug is required"));
        } else if !slugs.insert(product.slug.as_str()) {
            errors.push(format!("{label}: duplicate slug"));
        }
        if product.price.is_sign_negative() {
            errors.push(format!("{label}: price must not be negative"));
        }
        if let Some(compare_at) = product.compare_at_price
            && compare_at <= product.price
        {
            errors.push(format!("{label}: compare_at_price must be above price"));
        }
        if product.stock_quantity < 0 {
            errors.push(format!("{label}: stock_quantity must not be negative"));
        }

        let mut variant_names = HashSet::new();
        for variant in &product.variants {
            if variant.name.trim().is_empty() {
                errors.push(format!("{label}: variant name is required"));
            } else if !variant_names.insert(variant.name.as_str()) {
                errors.push(format!("{label}: duplicate variant '{}'", variant.name));
            }
            if variant.price.is_some_and(|p| p.is_sign_negative()) {
                errors.push(format!("{label}/{}: price must not be negative", variant.name));
            }
            if variant.stock_quantity < 0 {
                errors.push(format!(
                    "{label}/{}: stock_quantity must not be negative",
                    variant.name
                ));
            }
        }

        for image in &product.images {
            if image.url.trim().is_empty() {
                errors.push(format!("{label}: image url is required"));
            }
        }
    }

    errors
}

/// Seed catalog products from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// the database URL is missing, or an insert fails.
pub async fn catalog(file_path: &str, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let catalog: CatalogFile = serde_yaml::from_str(&content)?;

    info!(products = catalog.products.len(), "Parsed catalog");

    let errors = validate_catalog(&catalog);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    if dry_run {
        info!("Catalog is valid; dry run, nothing inserted");
        return Ok(());
    }

    let database_url = super::database_url()?;
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let result = insert_catalog(&pool, &catalog).await?;

    info!("Seeding complete!");
    info!("  Products inserted: {}", result.inserted);
    info!("  Products skipped (slug exists): {}", result.skipped);
    info!("  Variants inserted: {}", result.variants);
    info!("  Images inserted: {}", result.images);

    Ok(())
}

/// Insert every product not already present, one transaction per product.
async fn insert_catalog(pool: &PgPool, catalog: &CatalogFile) -> Result<SeedResult, sqlx::Error> {
    let mut result = SeedResult::default();

    for product in &catalog.products {
        let mut tx = pool.begin().await?;

        let id = sqlx::query_scalar::<_, ProductId>(
            r"
            INSERT INTO products (
                name, slug, description, price, compare_at_price,
                stock_quantity, featured, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (slug) DO NOTHING
            RETURNING id
            ",
        )
        .bind(product.name.trim())
        .bind(product.slug.trim())
        .bind(product.description.as_deref())
        .bind(round_to_cents(product.price))
        .bind(product.compare_at_price.map(round_to_cents))
        .bind(product.stock_quantity)
        .bind(product.featured)
        .bind(&product.status)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(id) = id else {
            info!(slug = %product.slug, "Product exists, skipping");
            result.skipped += 1;
            continue;
        };

        for variant in &product.variants {
            sqlx::query(
                r"
                INSERT INTO product_variants (product_id, name, price, stock_quantity, sku)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(id)
            .bind(variant.name.trim())
            .bind(variant.price.map(round_to_cents))
            .bind(variant.stock_quantity)
            .bind(variant.sku.as_deref())
            .execute(&mut *tx)
            .await?;
            result.variants += 1;
        }

        for (position, image) in (0_i32..).zip(&product.images) {
            sqlx::query(
                r"
                INSERT INTO product_images (product_id, url, alt_text, position)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(id)
            .bind(&image.url)
            .bind(image.alt_text.as_deref())
            .bind(position)
            .execute(&mut *tx)
            .await?;
            result.images += 1;
        }

        tx.commit().await?;
        info!(product_id = %id, slug = %product.slug, "Product inserted");
        result.inserted += 1;
    }

    Ok(result)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
products:
  - name: Ceramic Dripper
    slug: ceramic-dripper
    price: "24.00"
    compare_at_price: "30.00"
    stock_quantity: 12
    featured: true
    images:
      - url: /static/images/dripper.jpg
    variants:
      - name: White
        stock_quantity: 8
      - name: Speckled
        price: "28.00"
        stock_quantity: 4
  - name: Filter Papers
    slug: filter-papers
    price: "6.50"
"#;

    #[test]
    fn test_sample_parses_with_defaults() {
        let catalog: CatalogFile = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(catalog.products.len(), 2);

        let dripper = &catalog.products[0];
        assert_eq!(dripper.price, Decimal::new(2400, 2));
        assert_eq!(dripper.variants[0].price, None);
        assert_eq!(dripper.variants[1].price, Some(Decimal::new(2800, 2)));

        let papers = &catalog.products[1];
        assert_eq!(papers.status, ACTIVE_STATUS);
        assert!(!papers.featured);
        assert_eq!(papers.stock_quantity, 0);
        assert!(papers.variants.is_empty());

        assert!(validate_catalog(&catalog).is_empty());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "products:\n  - name: A\n    slug: a\n    price: \"1.00\"\n    colour: red\n";
        assert!(serde_yaml::from_str::<CatalogFile>(yaml).is_err());
    }

    #[test]
    fn test_validation_reports_each_problem() {
        let yaml = r#"
products:
  - name: ""
    slug: mug
    price: "10.00"
    compare_at_price: "9.00"
    variants:
      - name: Blue
      - name: Blue
  - name: Other Mug
    slug: mug
    price: "-1.00"
"#;
        let catalog: CatalogFile = serde_yaml::from_str(yaml).unwrap();
        let errors = validate_catalog(&catalog);

        assert!(errors.contains(&"mug: name is required".to_string()));
        assert!(errors.contains(&"mug: compare_at_price must be above price".to_string()));
        assert!(errors.contains(&"mug: duplicate variant 'Blue'".to_string()));
        assert!(errors.contains(&"mug: duplicate slug".to_string()));
        assert!(errors.contains(&"mug: price must not be negative".to_string()));
        assert_eq!(errors.len(), 5);
    }
}
