//! Product edits addressed by application id.

use activities_core::ProductId;
use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::{AppError, JsonBody, Result};
use crate::state::AppState;
use crate::store::convert::changes_document;

const INVALID_UPDATE: &str = "Invalid ID or update data";

/// `PUT /update-lesson/{id}` - merge the body into the product whose `id`
/// equals the path segment.
#[instrument(skip(state, body))]
pub async fn update_lesson(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<Value>> {
    let id: ProductId = raw_id
        .parse()
        .map_err(|_| AppError::InvalidInput(INVALID_UPDATE.to_string()))?;
    let fields = match &body {
        Value::Object(fields) if !fields.is_empty() => fields,
        _ => return Err(AppError::InvalidInput(INVALID_UPDATE.to_string())),
    };
    let changes = changes_document(fields)
        .map_err(|_| AppError::InvalidInput(INVALID_UPDATE.to_string()))?;
    let store = state.store()?;

    let outcome = store
        .update_product(id, changes)
        .await
        .map_err(AppError::storage("Failed to update lesson"))?;

    if outcome.matched == 0 {
        return Err(AppError::NotFound("Lesson not found".to_string()));
    }

    if outcome.modified == 0 {
        return Ok(Json(json!({ "msg": "No changes made", "id": raw_id })));
    }

    tracing::info!(product_id = %id, fields = fields.len(), "Lesson updated");
    Ok(Json(json!({
        "msg": "Lesson updated successfully",
        "updatedFields": body,
        "modifiedCount": outcome.modified,
    })))
}
