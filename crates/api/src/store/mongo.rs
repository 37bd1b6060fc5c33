//! MongoDB implementation of [`DocumentStore`].

use activities_core::{Cart, CollectionName, Condition, NewOrder, ProductId, SearchFilter};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Document, doc};
use mongodb::{Client, ClientSession, Collection, Database};
use secrecy::{ExposeSecret, SecretString};

use super::convert::{order_document, product_filter, spaces};
use super::{
    CheckoutReceipt, DocumentStore, ORDERS, PRODUCTS, Result, SpacesReport, StoreError,
    UpdateOutcome,
};

/// MongoDB-backed document store.
///
/// Cheap to clone; the driver pools connections internally.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    database: Database,
}

impl MongoStore {
    /// Create a client for `database`.
    ///
    /// The driver connects lazily; call [`DocumentStore::ping`] to verify
    /// the server is reachable.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Driver` if the connection string is invalid.
    pub async fn connect(uri: &SecretString, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri.expose_secret()).await?;
        let database = client.database(database);
        Ok(Self { client, database })
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection(name)
    }

    /// Insert seed products, optionally clearing the collection first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Driver` if the delete or insert fails.
    pub async fn seed_products(
        &self,
        products: Vec<Document>,
        clear_existing: bool,
    ) -> Result<usize> {
        let collection = self.collection(PRODUCTS);

        if clear_existing {
            let deleted = collection.delete_many(doc! {}).await?;
            tracing::info!(deleted = deleted.deleted_count, "Cleared products");
        }

        if products.is_empty() {
            return Ok(0);
        }

        let inserted = collection.insert_many(products).await?;
        Ok(inserted.inserted_ids.len())
    }

    /// Count the documents in a collection.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Driver` if the count fails.
    pub async fn count(&self, collection: &str) -> Result<u64> {
        Ok(self.collection(collection).count_documents(doc! {}).await?)
    }

    /// Apply every decrement of `cart` inside the session's transaction.
    async fn apply_decrements(
        &self,
        session: &mut ClientSession,
        cart: &Cart,
    ) -> Result<SpacesReport> {
        let products = self.collection(PRODUCTS);
        let mut report = SpacesReport::default();

        for line in cart.lines() {
            let filter = doc! {
                "id": line.id.as_i64(),
                "Spaces": { "$gte": line.quantity },
            };
            let update = doc! { "$inc": { "Spaces": -line.quantity } };

            let result = products
                .update_one(filter, update)
                .session(&mut *session)
                .await?;

            if result.matched_count == 1 {
                report.updated += 1;
                continue;
            }

            // Either the product is unknown or it lacks capacity
            match products
                .find_one(product_filter(line.id))
                .session(&mut *session)
                .await?
            {
                None => {
                    tracing::warn!(product_id = %line.id, "Cart line references unknown product");
                    report.skipped.push(line.id);
                }
                Some(product) => {
                    return Err(StoreError::InsufficientSpaces {
                        id: line.id,
                        requested: line.quantity,
                        available: spaces(&product),
                    });
                }
            }
        }

        Ok(report)
    }

    /// Commit on success, abort on failure, and return the step's result.
    async fn finish_transaction<T>(session: &mut ClientSession, outcome: Result<T>) -> Result<T> {
        match outcome {
            Ok(value) => {
                session.commit_transaction().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(abort_err) = session.abort_transaction().await {
                    tracing::warn!(error = %abort_err, "Failed to abort transaction");
                }
                Err(e)
            }
        }
    }
}

/// Translate a search filter into a MongoDB `$or` query.
fn search_query(filter: &SearchFilter) -> Document {
    let conditions: Vec<Document> = filter
        .conditions
        .iter()
        .map(|condition| {
            let mut clause = Document::new();
            match condition {
                Condition::Contains { field, needle } => {
                    clause.insert(*field, doc! { "$regex": regex::escape(needle), "$options": "i" });
                }
                Condition::Equals { field, value } => {
                    clause.insert(*field, *value);
                }
            }
            clause
        })
        .collect();

    doc! { "$or": conditions }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn ping(&self) -> Result<()> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn list(&self, collection: &CollectionName) -> Result<Vec<Document>> {
        let cursor = self.collection(collection.as_str()).find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_by_id(
        &self,
        collection: &CollectionName,
        id: ObjectId,
    ) -> Result<Option<Document>> {
        Ok(self
            .collection(collection.as_str())
            .find_one(doc! { "_id": id })
            .await?)
    }

    async fn update_by_id(
        &self,
        collection: &CollectionName,
        id: ObjectId,
        changes: Document,
    ) -> Result<UpdateOutcome> {
        let result = self
            .collection(collection.as_str())
            .update_one(doc! { "_id": id }, doc! { "$set": changes })
            .await?;

        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn search_products(&self, filter: &SearchFilter) -> Result<Vec<Document>> {
        let cursor = self
            .collection(PRODUCTS)
            .find(search_query(filter))
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn update_product(&self, id: ProductId, changes: Document) -> Result<UpdateOutcome> {
        let result = self
            .collection(PRODUCTS)
            .update_one(product_filter(id), doc! { "$set": changes })
            .await?;

        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn insert_order(&self, order: &NewOrder) -> Result<ObjectId> {
        let result = self
            .collection(ORDERS)
            .insert_one(order_document(order)?)
            .await?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| StoreError::Unexpected(format!("inserted id {}", result.inserted_id)))
    }

    async fn decrement_spaces(&self, cart: &Cart) -> Result<SpacesReport> {
        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;

        let outcome = self.apply_decrements(&mut session, cart).await;
        Self::finish_transaction(&mut session, outcome).await
    }

    async fn checkout(&self, order: &NewOrder, cart: &Cart) -> Result<CheckoutReceipt> {
        let document = order_document(order)?;

        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;

        let outcome = async {
            let inserted = self
                .collection(ORDERS)
                .insert_one(document)
                .session(&mut session)
                .await?;
            let order_id = inserted.inserted_id.as_object_id().ok_or_else(|| {
                StoreError::Unexpected(format!("inserted id {}", inserted.inserted_id))
            })?;
            let spaces = self.apply_decrements(&mut session, cart).await?;
            Ok::<_, StoreError>(CheckoutReceipt { order_id, spaces })
        }
        .await;

        Self::finish_transaction(&mut session, outcome).await
    }
}
