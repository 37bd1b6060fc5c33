//! Document storage behind the HTTP handlers.
//!
//! # Collections
//!
//! - `products` - Catalog entries, addressed by native `_id` or by the
//!   application-level integer `id`
//! - `orders` - Submitted orders, insert only
//!
//! Any other collection is only reachable through the generic gateway and
//! only when the configured allow-list names it.
//!
//! # Implementations
//!
//! - [`MongoStore`] - MongoDB (transactions require a replica set)
//! - [`MemoryStore`] - Process-local store for tests and local development
//!
//! # Readiness
//!
//! The store is connected by a background task spawned at startup. Until it
//! succeeds the [`StoreHandle`] stays empty and every data route answers 503.

pub mod convert;
pub mod memory;
pub mod mongo;

use std::sync::Arc;
use std::time::Duration;

use activities_core::{Cart, CollectionName, NewOrder, ProductId, SearchFilter};
use async_trait::async_trait;
use backon::{BackoffBuilder, ExponentialBuilder};
use mongodb::bson::Document;
use mongodb::bson::oid::ObjectId;
use thiserror::Error;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;

use crate::config::StoreBackend;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Collection holding the catalog.
pub const PRODUCTS: &str = "products";
/// Collection holding submitted orders.
pub const ORDERS: &str = "orders";

/// Errors raised by a [`DocumentStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Driver or server failure.
    #[error("{0}")]
    Driver(#[from] mongodb::error::Error),

    /// A value could not be converted to BSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] mongodb::bson::ser::Error),

    /// A conditional decrement found less capacity than requested.
    #[error("not enough spaces for product {id}: requested {requested}, available {available}")]
    InsufficientSpaces {
        id: ProductId,
        requested: i64,
        available: i64,
    },

    /// The store answered with something the API cannot interpret.
    #[error("unexpected store response: {0}")]
    Unexpected(String),
}

/// Result type alias for `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Match and modification counts of a single-document update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

impl UpdateOutcome {
    /// Exactly one document was addressed.
    #[must_use]
    pub const fn matched_one(&self) -> bool {
        self.matched == 1
    }
}

/// What an inventory adjustment did, line by line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpacesReport {
    /// Lines whose product was decremented.
    pub updated: usize,
    /// Lines whose product id matched nothing.
    pub skipped: Vec<ProductId>,
}

/// Result of a transactional checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutReceipt {
    pub order_id: ObjectId,
    pub spaces: SpacesReport,
}

/// Interface for document persistence.
///
/// Documents are schemaless: the store never validates their shape.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Round-trip to the server.
    async fn ping(&self) -> Result<()>;

    /// Every document in a collection, in natural order.
    async fn list(&self, collection: &CollectionName) -> Result<Vec<Document>>;

    /// One document by native identifier.
    async fn find_by_id(&self, collection: &CollectionName, id: ObjectId)
    -> Result<Option<Document>>;

    /// Merge `changes` into the document with the given native identifier.
    async fn update_by_id(
        &self,
        collection: &CollectionName,
        id: ObjectId,
        changes: Document,
    ) -> Result<UpdateOutcome>;

    /// Products matching any condition of the filter, in natural order.
    async fn search_products(&self, filter: &SearchFilter) -> Result<Vec<Document>>;

    /// Merge `changes` into the first product whose application `id` matches.
    async fn update_product(&self, id: ProductId, changes: Document) -> Result<UpdateOutcome>;

    /// Insert an order and return its native identifier.
    async fn insert_order(&self, order: &NewOrder) -> Result<ObjectId>;

    /// Decrement `Spaces` for every line, all or nothing.
    ///
    /// Lines whose product does not exist are skipped. A line asking for more
    /// than the remaining capacity aborts the whole adjustment with
    /// [`StoreError::InsufficientSpaces`].
    async fn decrement_spaces(&self, cart: &Cart) -> Result<SpacesReport>;

    /// Insert the order and apply every decrement in one unit.
    async fn checkout(&self, order: &NewOrder, cart: &Cart) -> Result<CheckoutReceipt>;
}

/// Shared slot for the store, empty until the connection succeeds.
#[derive(Clone, Default)]
pub struct StoreHandle {
    cell: Arc<OnceCell<Arc<dyn DocumentStore>>>,
}

impl StoreHandle {
    /// A handle with no store yet.
    #[must_use]
    pub fn pending() -> Self {
        Self::default()
    }

    /// Install the connected store. Returns `false` if one was already set.
    pub fn install(&self, store: Arc<dyn DocumentStore>) -> bool {
        self.cell.set(store).is_ok()
    }

    /// The store, if connected.
    #[must_use]
    pub fn get(&self) -> Option<&Arc<dyn DocumentStore>> {
        self.cell.get()
    }

    /// Whether the store is connected.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.cell.initialized()
    }
}

/// Open the configured backend and verify it answers.
///
/// # Errors
///
/// Returns `StoreError::Driver` if the connection string is invalid or the
/// server cannot be reached.
pub async fn connect(backend: &StoreBackend) -> Result<Arc<dyn DocumentStore>> {
    match backend {
        StoreBackend::MongoDb(config) => {
            let store = MongoStore::connect(&config.uri, &config.database).await?;
            store.ping().await?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}

/// Connect in the background, retrying with exponential backoff, and install
/// the store into `handle` once it answers.
pub fn spawn_connect(handle: StoreHandle, backend: StoreBackend) -> JoinHandle<()> {
    tokio::spawn(async move {
        let backoff_builder = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(250))
            .with_max_delay(Duration::from_secs(30))
            .without_max_times()
            .with_jitter();
        let mut backoff_iter = backoff_builder.build();

        loop {
            match connect(&backend).await {
                Ok(store) => {
                    handle.install(store);
                    tracing::info!(backend = backend.name(), "Document store connected");
                    return;
                }
                Err(e) => {
                    let delay = backoff_iter.next().unwrap_or(Duration::from_secs(30));
                    tracing::error!(
                        error = %e,
                        backend = backend.name(),
                        backoff_ms = %delay.as_millis(),
                        "Document store connection failed, retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    })
}
