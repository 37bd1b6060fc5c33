//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Server errors are captured to
//! Sentry and logged before the JSON body is produced.

use std::any::Any;

use activities_core::{CollectionNameError, ProductId};
use axum::{
    Json,
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

use crate::store::StoreError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request from client.
    #[error("Bad request: {0}")]
    InvalidInput(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Collection is not exposed by this deployment.
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    /// A cart line asked for more than the remaining capacity.
    #[error("Not enough spaces for product {id}: requested {requested}, available {available}")]
    InsufficientSpaces {
        id: ProductId,
        requested: i64,
        available: i64,
    },

    /// The document store has not connected yet.
    #[error("Database not connected")]
    StorageUnavailable,

    /// Store operation failed.
    #[error("Storage error: {source}")]
    Storage {
        /// Client-facing summary, if the route defines one
        context: Option<&'static str>,
        #[source]
        source: StoreError,
    },

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Map a store error, labelling failures with a route-specific message.
    ///
    /// Capacity conflicts keep their own variant.
    pub fn storage(context: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| match source {
            StoreError::InsufficientSpaces { .. } => Self::from(source),
            source => Self::Storage {
                context: Some(context),
                source,
            },
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) | Self::UnknownCollection(_) => StatusCode::NOT_FOUND,
            Self::InsufficientSpaces { .. } => StatusCode::CONFLICT,
            Self::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Storage { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> Value {
        match self {
            Self::InvalidInput(msg) | Self::NotFound(msg) => json!({ "msg": msg }),
            Self::UnknownCollection(name) => {
                json!({ "msg": "Unknown collection", "collection": name })
            }
            Self::InsufficientSpaces {
                id,
                requested,
                available,
            } => json!({
                "msg": "Not enough spaces",
                "id": id,
                "requested": requested,
                "available": available,
            }),
            Self::StorageUnavailable => json!({ "msg": "Database not connected" }),
            Self::Storage {
                context: Some(context),
                source,
            } => json!({ "msg": context, "error": source.to_string() }),
            Self::Storage {
                context: None,
                source,
            } => json!({ "error": source.to_string() }),
            Self::Internal(msg) => json!({ "error": msg }),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InsufficientSpaces {
                id,
                requested,
                available,
            } => Self::InsufficientSpaces {
                id,
                requested,
                available,
            },
            source => Self::Storage {
                context: None,
                source,
            },
        }
    }
}

impl From<CollectionNameError> for AppError {
    fn from(err: CollectionNameError) -> Self {
        match err {
            CollectionNameError::NotAllowed(name) => Self::UnknownCollection(name),
            other => Self::InvalidInput(format!("Invalid collection name: {other}")),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() && !matches!(self, Self::StorageUnavailable) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else if matches!(self, Self::InsufficientSpaces { .. }) {
            tracing::warn!(error = %self, "Inventory adjustment rejected");
        }

        (status, Json(self.body())).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// JSON body extractor that reports malformed input as [`AppError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Response for a handler that panicked.
///
/// Used with `tower_http::catch_panic::CatchPanicLayer::custom`.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = payload
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| payload.downcast_ref::<&str>().map(ToString::to_string))
        .unwrap_or_else(|| "Unknown panic".to_string());

    AppError::Internal(message).into_response()
}
