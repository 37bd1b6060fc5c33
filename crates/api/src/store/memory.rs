//! In-memory implementation of [`DocumentStore`].
//!
//! Mirrors the MongoDB semantics the handlers rely on: natural insertion
//! order, `$set` merging, numeric id matching across integer and double
//! storage, and all-or-nothing inventory adjustments.

use std::collections::HashMap;

use activities_core::search::SPACES_FIELD;
use activities_core::{Cart, CollectionName, NewOrder, ProductId, SearchFilter};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};
use tokio::sync::RwLock;

use super::convert::{number, order_document, spaces};
use super::{
    CheckoutReceipt, DocumentStore, ORDERS, PRODUCTS, Result, SpacesReport, StoreError,
    UpdateOutcome,
};

/// Process-local document store.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add documents to a collection, assigning `_id` where missing.
    #[must_use]
    pub fn with_documents(mut self, collection: &str, documents: Vec<Document>) -> Self {
        self.collections
            .get_mut()
            .entry(collection.to_string())
            .or_default()
            .extend(documents.into_iter().map(with_object_id));
        self
    }

    /// Snapshot of a collection, for assertions.
    pub async fn documents(&self, collection: &str) -> Vec<Document> {
        self.collections
            .read()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }
}

/// Prepend a fresh `_id` unless the document already carries one.
fn with_object_id(document: Document) -> Document {
    if document.contains_key("_id") {
        return document;
    }
    prepend_id(ObjectId::new(), document)
}

/// Copy of `document` with `_id` as its first field.
fn prepend_id(id: ObjectId, document: Document) -> Document {
    let mut stored = Document::new();
    stored.insert("_id", id);
    for (key, value) in document {
        stored.insert(key, value);
    }
    stored
}

/// Whether a product's application `id` equals `id`.
#[allow(clippy::cast_precision_loss, clippy::float_cmp)]
fn has_product_id(document: &Document, id: ProductId) -> bool {
    document
        .get("id")
        .and_then(number)
        .is_some_and(|value| value == id.as_i64() as f64)
}

/// Whether a document satisfies any condition of the filter.
fn matches_filter(document: &Document, filter: &SearchFilter) -> bool {
    filter
        .conditions
        .iter()
        .any(|condition| match document.get(condition.field()) {
            Some(Bson::String(text)) => condition.matches_text(text),
            Some(value) => number(value).is_some_and(|n| condition.matches_number(n)),
            None => false,
        })
}

/// Top-level `$set`, reporting whether anything changed.
fn apply_set(document: &mut Document, changes: Document) -> bool {
    let mut modified = false;
    for (key, value) in changes {
        if document.get(&key) != Some(&value) {
            document.insert(key, value);
            modified = true;
        }
    }
    modified
}

/// Apply the cart's decrements to `products`, stopping at the first line
/// that lacks capacity.
fn apply_decrements(products: &mut [Document], cart: &Cart) -> Result<SpacesReport> {
    let mut report = SpacesReport::default();

    for line in cart.lines() {
        let Some(product) = products
            .iter_mut()
            .find(|product| has_product_id(product, line.id))
        else {
            tracing::warn!(product_id = %line.id, "Cart line references unknown product");
            report.skipped.push(line.id);
            continue;
        };

        let available = spaces(product);
        if available < line.quantity {
            return Err(StoreError::InsufficientSpaces {
                id: line.id,
                requested: line.quantity,
                available,
            });
        }

        product.insert(SPACES_FIELD, available - line.quantity);
        report.updated += 1;
    }

    Ok(report)
}

fn update_first<F>(documents: &mut [Document], predicate: F, changes: Document) -> UpdateOutcome
where
    F: Fn(&Document) -> bool,
{
    documents
        .iter_mut()
        .find(|document| predicate(document))
        .map_or_else(UpdateOutcome::default, |document| UpdateOutcome {
            matched: 1,
            modified: u64::from(apply_set(document, changes)),
        })
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn list(&self, collection: &CollectionName) -> Result<Vec<Document>> {
        Ok(self.documents(collection.as_str()).await)
    }

    async fn find_by_id(
        &self,
        collection: &CollectionName,
        id: ObjectId,
    ) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection.as_str()).and_then(|documents| {
            documents
                .iter()
                .find(|document| document.get_object_id("_id").is_ok_and(|found| found == id))
                .cloned()
        }))
    }

    async fn update_by_id(
        &self,
        collection: &CollectionName,
        id: ObjectId,
        changes: Document,
    ) -> Result<UpdateOutcome> {
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(collection.as_str()) else {
            return Ok(UpdateOutcome::default());
        };

        Ok(update_first(
            documents,
            |document| document.get_object_id("_id").is_ok_and(|found| found == id),
            changes,
        ))
    }

    async fn search_products(&self, filter: &SearchFilter) -> Result<Vec<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(PRODUCTS)
            .map(|products| {
                products
                    .iter()
                    .filter(|product| matches_filter(product, filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn update_product(&self, id: ProductId, changes: Document) -> Result<UpdateOutcome> {
        let mut collections = self.collections.write().await;
        let Some(products) = collections.get_mut(PRODUCTS) else {
            return Ok(UpdateOutcome::default());
        };

        Ok(update_first(
            products,
            |product| has_product_id(product, id),
            changes,
        ))
    }

    async fn insert_order(&self, order: &NewOrder) -> Result<ObjectId> {
        let id = ObjectId::new();
        let stored = prepend_id(id, order_document(order)?);

        self.collections
            .write()
            .await
            .entry(ORDERS.to_string())
            .or_default()
            .push(stored);

        Ok(id)
    }

    async fn decrement_spaces(&self, cart: &Cart) -> Result<SpacesReport> {
        let mut collections = self.collections.write().await;
        let mut products = collections.get(PRODUCTS).cloned().unwrap_or_default();

        let report = apply_decrements(&mut products, cart)?;
        collections.insert(PRODUCTS.to_string(), products);

        Ok(report)
    }

    async fn checkout(&self, order: &NewOrder, cart: &Cart) -> Result<CheckoutReceipt> {
        let order_id = ObjectId::new();
        let stored = prepend_id(order_id, order_document(order)?);

        let mut collections = self.collections.write().await;
        let mut products = collections.get(PRODUCTS).cloned().unwrap_or_default();

        let spaces = apply_decrements(&mut products, cart)?;
        collections.insert(PRODUCTS.to_string(), products);
        collections
            .entry(ORDERS.to_string())
            .or_default()
            .push(stored);

        Ok(CheckoutReceipt { order_id, spaces })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use activities_core::{CartLine, SearchTerm};
    use chrono::Utc;
    use mongodb::bson::doc;
    use serde_json::json;

    use super::*;

    fn catalog() -> MemoryStore {
        MemoryStore::new().with_documents(
            PRODUCTS,
            vec![
                doc! { "id": 1, "subject": "Art", "location": "Hendon", "price": 100, "Spaces": 5 },
                doc! { "id": 2, "subject": "Music", "location": "Colindale", "price": 80.0, "Spaces": 2 },
            ],
        )
    }

    fn products() -> CollectionName {
        CollectionName::parse(PRODUCTS).unwrap()
    }

    fn cart(lines: &[(i64, i64)]) -> Cart {
        Cart::parse(
            lines
                .iter()
                .map(|&(id, qty)| CartLine::new(ProductId::new(id), qty))
                .collect(),
        )
        .unwrap()
    }

    fn order() -> NewOrder {
        NewOrder {
            name: json!("A"),
            phone: json!("1"),
            cart: vec![json!({"id": 1, "quantity": 1})],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_with_documents_assigns_object_ids() {
        let store = catalog();
        let documents = store.list(&products()).await.unwrap();

        assert_eq!(documents.len(), 2);
        assert!(documents.iter().all(|d| d.get_object_id("_id").is_ok()));
        assert_eq!(documents[0].keys().next().map(String::as_str), Some("_id"));
    }

    #[tokio::test]
    async fn test_search_text_and_number() {
        let store = catalog();

        let filter = SearchTerm::parse("hEnD").unwrap().to_filter();
        let found = store.search_products(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get_str("subject").unwrap(), "Art");

        let filter = SearchTerm::parse("80").unwrap().to_filter();
        let found = store.search_products(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get_str("subject").unwrap(), "Music");
    }

    #[tokio::test]
    async fn test_decrement_spaces_applies_all_lines() {
        let store = catalog();

        let report = store.decrement_spaces(&cart(&[(1, 2), (2, 1)])).await.unwrap();
        assert_eq!(report.updated, 2);
        assert!(report.skipped.is_empty());

        let documents = store.documents(PRODUCTS).await;
        assert_eq!(spaces(&documents[0]), 3);
        assert_eq!(spaces(&documents[1]), 1);
    }

    #[tokio::test]
    async fn test_decrement_spaces_skips_unknown_product() {
        let store = catalog();

        let report = store.decrement_spaces(&cart(&[(9, 1)])).await.unwrap();
        assert_eq!(report.updated, 0);
        assert_eq!(report.skipped, vec![ProductId::new(9)]);
    }

    #[tokio::test]
    async fn test_decrement_spaces_is_all_or_nothing() {
        let store = catalog();

        let err = store
            .decrement_spaces(&cart(&[(1, 1), (2, 3)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::InsufficientSpaces { requested: 3, available: 2, .. }
        ));

        let documents = store.documents(PRODUCTS).await;
        assert_eq!(spaces(&documents[0]), 5);
        assert_eq!(spaces(&documents[1]), 2);
    }

    #[tokio::test]
    async fn test_update_product_counts_modifications() {
        let store = catalog();

        let changed = store
            .update_product(ProductId::new(1), doc! { "location": "Barnet" })
            .await
            .unwrap();
        assert_eq!(changed, UpdateOutcome { matched: 1, modified: 1 });

        let unchanged = store
            .update_product(ProductId::new(1), doc! { "location": "Barnet" })
            .await
            .unwrap();
        assert_eq!(unchanged, UpdateOutcome { matched: 1, modified: 0 });

        let missing = store
            .update_product(ProductId::new(42), doc! { "location": "Barnet" })
            .await
            .unwrap();
        assert!(!missing.matched_one());
    }

    #[tokio::test]
    async fn test_checkout_rolls_back_order_on_failure() {
        let store = catalog();

        let err = store.checkout(&order(), &cart(&[(2, 10)])).await.unwrap_err();
        assert!(matches!(err, StoreError::InsufficientSpaces { .. }));
        assert!(store.documents(ORDERS).await.is_empty());

        let receipt = store.checkout(&order(), &cart(&[(1, 1)])).await.unwrap();
        let orders = store.documents(ORDERS).await;
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].get_object_id("_id").unwrap(), receipt.order_id);
        assert_eq!(receipt.spaces.updated, 1);
    }

    #[tokio::test]
    async fn test_update_by_id_on_missing_collection() {
        let store = MemoryStore::new();
        let name = CollectionName::parse("orders").unwrap();

        let outcome = store
            .update_by_id(&name, ObjectId::new(), doc! { "a": 1 })
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::default());
    }
}
