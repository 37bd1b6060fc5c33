//! Document counts for the catalog collections.

use tracing::info;

use activities_api::store::{ORDERS, PRODUCTS};

/// Show how many products and orders are stored.
///
/// # Errors
///
/// Returns an error if database connection fails.
pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let store = super::connect().await?;

    let products = store.count(PRODUCTS).await?;
    let orders = store.count(ORDERS).await?;

    info!("Catalog Statistics");
    info!("==================");
    info!("Products: {products}");
    info!("Orders: {orders}");

    Ok(())
}
