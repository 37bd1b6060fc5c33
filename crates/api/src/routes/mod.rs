//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Service descriptor
//! GET  /health                    - Liveness with uptime and store status
//! GET  /health/ready              - Readiness (store connected and answering)
//!
//! # Catalog
//! GET  /search?query=<term>       - Search products
//! PUT  /update-lesson/{id}        - Merge fields into a product by application id
//!
//! # Orders
//! POST /placeorder                - Store an order
//! PUT  /update-spaces             - Decrement Spaces for a cart (alias /update-Spaces)
//! POST /checkout                  - Store an order and decrement in one transaction
//!
//! # Collections (allow-listed)
//! GET  /collection/{name}         - List documents
//! GET  /collection/{name}/{id}    - One document by ObjectId
//! PUT  /collection/{name}/{id}    - Merge fields into one document
//!
//! # Static
//! GET  /images/{file}             - Activity images
//! ```

pub mod collections;
pub mod images;
pub mod info;
pub mod inventory;
pub mod lessons;
pub mod orders;
pub mod search;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the collection gateway router.
pub fn collection_routes() -> Router<AppState> {
    Router::new()
        .route("/{name}", get(collections::list))
        .route(
            "/{name}/{id}",
            get(collections::get).put(collections::update),
        )
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(info::index))
        .route("/health", get(info::health))
        .route("/health/ready", get(info::readiness))
        .route("/search", get(search::search))
        .route("/placeorder", post(orders::place_order))
        .route("/checkout", post(orders::checkout))
        .route("/update-lesson/{id}", put(lessons::update_lesson))
        .route("/update-spaces", put(inventory::update_spaces))
        .route("/update-Spaces", put(inventory::update_spaces))
        .nest("/collection", collection_routes())
}
