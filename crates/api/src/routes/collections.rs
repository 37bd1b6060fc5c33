//! Generic collection gateway.
//!
//! Exposes list, get and merge-update on any collection the allow-list
//! names. Readiness is checked before the name so that every request fails
//! with 503 until the store connects.

use std::str::FromStr;

use activities_core::CollectionName;
use axum::{
    Json,
    extract::{Path, State},
};
use mongodb::bson::oid::ObjectId;
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::{AppError, JsonBody, Result};
use crate::state::AppState;
use crate::store::DocumentStore;
use crate::store::convert::{changes_document, document_to_json, documents_to_json};

/// Resolve the store and the collection, in that order.
fn resolve<'a>(
    state: &'a AppState,
    name: &str,
) -> Result<(&'a dyn DocumentStore, CollectionName)> {
    let store = state.store()?;
    let collection = state.config().collections.resolve(name)?;
    Ok((&**store, collection))
}

fn record_id(id: &str) -> Result<ObjectId> {
    ObjectId::from_str(id).map_err(|_| AppError::InvalidInput("Invalid record id".to_string()))
}

/// `GET /collection/{name}` - every document in the collection.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>, Path(name): Path<String>) -> Result<Json<Value>> {
    let (store, collection) = resolve(&state, &name)?;

    let documents = store.list(&collection).await?;
    Ok(Json(documents_to_json(documents)))
}

/// `GET /collection/{name}/{id}` - one document, or `null` when absent.
#[instrument(skip(state))]
pub async fn get(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
) -> Result<Json<Value>> {
    let (store, collection) = resolve(&state, &name)?;
    let id = record_id(&id)?;

    let document = store.find_by_id(&collection, id).await?;
    Ok(Json(document.map_or(Value::Null, document_to_json)))
}

/// `PUT /collection/{name}/{id}` - merge the body into one document.
///
/// Answers `success` when exactly one document matched, whether or not any
/// value changed, and `error` otherwise.
#[instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<Value>> {
    let (store, collection) = resolve(&state, &name)?;
    let id = record_id(&id)?;
    let Value::Object(fields) = body else {
        return Err(AppError::InvalidInput(
            "Update body must be a JSON object".to_string(),
        ));
    };
    let changes = changes_document(&fields)
        .map_err(|_| AppError::InvalidInput("Invalid update data".to_string()))?;

    let outcome = store.update_by_id(&collection, id, changes).await?;

    let msg = if outcome.matched_one() {
        "success"
    } else {
        "error"
    };
    tracing::debug!(collection = %collection, %id, matched = outcome.matched, "Record update");
    Ok(Json(json!({ "msg": msg })))
}
