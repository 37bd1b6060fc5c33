//! CLI subcommand implementations.

pub mod seed;
pub mod stats;

use secrecy::SecretString;

use activities_api::store::MongoStore;

/// Connect to the database named by `MONGODB_URI` and `MONGODB_DATABASE`.
///
/// # Errors
///
/// Returns an error if `MONGODB_URI` is not set or the server cannot be
/// reached.
pub async fn connect() -> Result<MongoStore, Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let uri = std::env::var("MONGODB_URI")
        .map(SecretString::from)
        .map_err(|_| "MONGODB_URI not set")?;
    let database =
        std::env::var("MONGODB_DATABASE").unwrap_or_else(|_| "webstore".to_string());

    let store = MongoStore::connect(&uri, &database).await?;
    activities_api::store::DocumentStore::ping(&store).await?;
    tracing::info!(database = %database, "Connected to database");

    Ok(store)
}
