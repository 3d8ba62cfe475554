//! Seed the product catalog from a YAML file.
//!
//! ```yaml
//! products:
//!   - name: Camiseta Básica
//!     description: Algodão orgânico
//!     price: 49.90
//!   - name: Boné
//!     price: 35
//!     active: false
//! ```
//!
//! Products are matched by name; existing names are skipped, so the command
//! can be re-run safely.

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use vitrine_admin::db;

use super::{MissingDatabaseUrl, database_url};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    MissingEnvVar(#[from] MissingDatabaseUrl),

    #[error("Failed to read {0}: {1}")]
    Io(String, std::io::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid product #{index} ({name}): {reason}")]
    InvalidProduct {
        index: usize,
        name: String,
        reason: &'static str,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    products: Vec<SeedProduct>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct SeedProduct {
    name: String,
    #[serde(default)]
    description: Option<String>,
    price: Decimal,
    #[serde(default = "default_active")]
    active: bool,
}

const fn default_active() -> bool {
    true
}

/// Parse and validate a seed file's contents.
fn parse(content: &str) -> Result<Vec<SeedProduct>, SeedError> {
    let file: SeedFile = serde_yaml::from_str(content)?;

    for (index, product) in file.products.iter().enumerate() {
        let reason = if product.name.trim().is_empty() {
            Some("name is required")
        } else if product.price < Decimal::ZERO {
            Some("price cannot be negative")
        } else if product.price.normalize().scale() > 2 {
            Some("price has more than two decimal places")
        } else {
            None
        };

        if let Some(reason) = reason {
            return Err(SeedError::InvalidProduct {
                index: index + 1,
                name: product.name.clone(),
                reason,
            });
        }
    }

    Ok(file.products)
}

/// Insert the products listed in `file_path`.
///
/// # Errors
///
/// Returns `SeedError` if the file cannot be read or is invalid, or if a
/// database operation fails. The file is fully validated before connecting.
pub async fn products(file_path: &Path) -> Result<(), SeedError> {
    let content = tokio::fs::read_to_string(file_path)
        .await
        .map_err(|e| SeedError::Io(file_path.display().to_string(), e))?;
    let products = parse(&content)?;
    tracing::info!(path = %file_path.display(), products = products.len(), "Parsed seed file");

    let database_url = database_url("ADMIN_DATABASE_URL")?;
    let pool = db::create_pool(&database_url).await?;

    let mut inserted = 0_usize;
    let mut skipped = 0_usize;
    for product in &products {
        let result = sqlx::query(
            r"
            INSERT INTO shop.products (name, description, price, active)
            SELECT $1, $2, $3, $4
            WHERE NOT EXISTS (SELECT 1 FROM shop.products WHERE name = $1)
            ",
        )
        .bind(product.name.trim())
        .bind(product.description.as_deref())
        .bind(product.price)
        .bind(product.active)
        .execute(&pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(name = %product.name, "Product exists, skipped");
            skipped += 1;
        } else {
            inserted += 1;
        }
    }

    tracing::info!("Seeding complete!");
    tracing::info!("  Products inserted: {inserted}");
    tracing::info!("  Products skipped (already exist): {skipped}");
    Ok(())
}
