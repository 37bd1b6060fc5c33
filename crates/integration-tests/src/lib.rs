//! HTTP-level tests for the After School Activities API.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot` over the
//! in-memory store, so no MongoDB server is needed. The `mongo_store` tests
//! are ignored by default and run against the server named by `MONGODB_URI`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p activities-integration-tests
//!
//! # Against a replica set
//! MONGODB_URI=mongodb://localhost:27017/?replicaSet=rs0 \
//!     cargo test -p activities-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `catalog` - Info, search, collection gateway, lesson updates, images, CORS
//! - `orders` - Order intake, inventory adjustment, checkout
//! - `mongo_store` - Transactions and conditional decrements on a live server

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::sync::Arc;

use activities_api::config::ApiConfig;
use activities_api::state::AppState;
use activities_api::store::{DocumentStore, MemoryStore, PRODUCTS, StoreHandle};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use mongodb::bson::{Document, doc};
use serde_json::Value;
use tower::ServiceExt;

/// The catalog every test starts from.
#[must_use]
pub fn sample_products() -> Vec<Document> {
    vec![
        doc! { "id": 1, "subject": "Art", "location": "Hendon", "price": 100, "Spaces": 5, "image": "art.jpg" },
        doc! { "id": 2, "subject": "Music", "location": "Colindale", "price": 80, "Spaces": 2, "image": "music.jpg" },
        doc! { "id": 3, "subject": "Maths", "location": "Hendon", "price": 95.0, "Spaces": 100, "image": "maths.jpg" },
        doc! { "id": 4, "subject": "C++ Club", "location": "Barnet", "price": 70, "Spaces": 10, "image": "code.jpg" },
    ]
}

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Router plus the store behind it.
pub struct TestApp {
    router: Router,
    handle: StoreHandle,
    store: Arc<MemoryStore>,
}

impl TestApp {
    /// Connected app over the sample catalog with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ApiConfig::for_memory_store())
    }

    /// Connected app over the sample catalog.
    #[must_use]
    pub fn with_config(config: ApiConfig) -> Self {
        let app = Self::pending(config);
        app.connect();
        app
    }

    /// App whose store has not connected yet.
    #[must_use]
    pub fn pending(config: ApiConfig) -> Self {
        let store = Arc::new(MemoryStore::new().with_documents(PRODUCTS, sample_products()));
        let handle = StoreHandle::pending();
        let router = activities_api::app(AppState::new(config, handle.clone()));

        Self {
            router,
            handle,
            store,
        }
    }

    /// Complete the store connection.
    pub fn connect(&self) {
        let store: Arc<dyn DocumentStore> = self.store.clone();
        self.handle.install(store);
    }

    /// The backing store, for assertions.
    #[must_use]
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Send a request with an optional JSON body.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<&Value>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        send(&self.router, method, uri, body, headers).await
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None, &[]).await
    }

    pub async fn post(&self, uri: &str, body: &Value) -> TestResponse {
        self.send(Method::POST, uri, Some(body), &[]).await
    }

    pub async fn put(&self, uri: &str, body: &Value) -> TestResponse {
        self.send(Method::PUT, uri, Some(body), &[]).await
    }

    /// Current `Spaces` of a product, by application id.
    pub async fn spaces_of(&self, id: i64) -> i64 {
        self.store()
            .documents(PRODUCTS)
            .await
            .iter()
            .find(|product| product.get_i32("id").map(i64::from).ok() == Some(id))
            .map(activities_api::store::convert::spaces)
            .unwrap()
    }

    /// Native `_id` of a product, by application id.
    pub async fn object_id_of(&self, id: i64) -> String {
        self.store()
            .documents(PRODUCTS)
            .await
            .iter()
            .find(|product| product.get_i32("id").map(i64::from).ok() == Some(id))
            .map(|product| product.get_object_id("_id").unwrap().to_hex())
            .unwrap()
    }
}

/// Send a request to any router with an optional JSON body.
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<&Value>,
    headers: &[(&str, &str)],
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A browser origin allowed by the default configuration.
pub const ALLOWED_ORIGIN: &str = "http://localhost:5173";
