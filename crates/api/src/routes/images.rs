//! Static activity images.
//!
//! Files are served by `tower_http::services::ServeDir` mounted at `/images`;
//! this module provides its not-found fallback.

use axum::{
    Json,
    http::{StatusCode, Uri},
    response::IntoResponse,
};
use serde_json::json;

/// Fallback for a missing image.
///
/// Inside the nested `/images` service the URI is relative to the mount.
pub async fn image_not_found(uri: Uri) -> impl IntoResponse {
    tracing::debug!(path = uri.path(), "Image not found");
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "msg": "Image not found",
            "requestedFile": uri.path(),
        })),
    )
}
