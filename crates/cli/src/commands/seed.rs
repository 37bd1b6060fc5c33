//! Seed the `products` collection from a YAML or JSON file.
//!
//! The file holds a list of product documents:
//!
//! ```yaml
//! - id: 1
//!   subject: Art
//!   location: Hendon
//!   price: 100
//!   Spaces: 5
//!   image: art.jpg
//! ```
//!
//! JSON arrays are accepted as well, since JSON is a subset of YAML.

use std::collections::HashSet;
use std::path::Path;

use mongodb::bson::{self, Document};
use serde_json::{Map, Value};
use tracing::{error, info};

/// One seed document as read from the file.
pub type SeedProduct = Map<String, Value>;

/// Check the products before anything is written.
///
/// Every product needs an integer `id`, unique across the file. `Spaces`,
/// when present, must be a non-negative integer.
#[must_use]
pub fn validate_products(products: &[SeedProduct]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (index, product) in products.iter().enumerate() {
        match product.get("id").and_then(Value::as_i64) {
            Some(id) => {
                if !seen.insert(id) {
                    errors.push(format!("product #{index}: duplicate id {id}"));
                }
            }
            None => errors.push(format!("product #{index}: missing integer id")),
        }

        if let Some(spaces) = product.get("Spaces")
            && !spaces.as_i64().is_some_and(|n| n >= 0)
        {
            errors.push(format!(
                "product #{index}: Spaces must be a non-negative integer, got {spaces}"
            ));
        }
    }

    errors
}

/// Convert validated products into BSON documents.
///
/// # Errors
///
/// Returns an error if a value cannot be represented in BSON.
pub fn to_documents(products: &[SeedProduct]) -> Result<Vec<Document>, bson::ser::Error> {
    products.iter().map(bson::to_document).collect()
}

/// Seed products from a file.
///
/// # Arguments
///
/// * `file_path` - Path to the YAML or JSON file
/// * `clear_existing` - If true, delete every existing product first
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, validation fails,
/// or database operations fail.
pub async fn products(file_path: &str, clear_existing: bool) -> Result<(), Box<dyn std::error::Error>> {
    // Verify file exists
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading products from file");

    // Read and validate before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let products: Vec<SeedProduct> = serde_yaml::from_str(&content)?;

    info!(products = products.len(), "Parsed seed file");

    let errors = validate_products(&products);
    if !errors.is_empty() {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let documents = to_documents(&products)?;
    let store = super::connect().await?;

    info!(clear_existing, "Starting seeding process");
    let inserted = store.seed_products(documents, clear_existing).await?;

    info!("Seeding complete!");
    info!("  Products inserted: {inserted}");

    Ok(())
}
