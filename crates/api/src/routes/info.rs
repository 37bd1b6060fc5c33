//! Service descriptor and health probes.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use serde_json::{Value, json};

use crate::state::AppState;

/// `GET /` - what this service is and where its endpoints live.
pub async fn index() -> Json<Value> {
    Json(json!({
        "message": "After School Activities API",
        "status": "Running",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "products": "/collection/products",
            "orders": "/collection/orders",
            "search": "/search?query=",
            "placeOrder": "POST /placeorder",
            "checkout": "POST /checkout",
            "updateSpaces": "PUT /update-spaces",
            "updateLesson": "PUT /update-lesson/:id",
            "images": "/images/:file",
            "health": "/health",
        },
    }))
}

/// `GET /health` - liveness, always 200.
///
/// Reports whether the store has connected without touching it.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let database = if state.store_handle().is_ready() {
        "connected"
    } else {
        "disconnected"
    };

    Json(json!({
        "uptime": state.uptime().as_secs_f64(),
        "message": "OK",
        "timestamp": Utc::now().timestamp_millis(),
        "database": database,
    }))
}

/// `GET /health/ready` - readiness.
///
/// Returns 503 Service Unavailable until the store is connected and answers
/// a ping.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Some(store) = state.store_handle().get() else {
        return StatusCode::SERVICE_UNAVAILABLE;
    };

    match store.ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness ping failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
