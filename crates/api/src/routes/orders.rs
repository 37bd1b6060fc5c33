//! Order intake.
//!
//! `POST /placeorder` stores the order and leaves inventory alone; clients
//! follow it with `PUT /update-spaces`. `POST /checkout` does both in one
//! transaction.

use activities_core::{CartError, OrderError, OrderSubmission};
use axum::{Json, extract::State};
use chrono::Utc;
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::{AppError, JsonBody, Result};
use crate::state::AppState;

const INVALID_ORDER: &str = "Invalid order data";

impl From<OrderError> for AppError {
    fn from(_: OrderError) -> Self {
        Self::InvalidInput(INVALID_ORDER.to_string())
    }
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::Empty => Self::InvalidInput("Cart is empty".to_string()),
            CartError::MalformedLine { .. } => Self::InvalidInput(INVALID_ORDER.to_string()),
            CartError::NonPositiveQuantity { .. } => {
                Self::InvalidInput("Invalid cart quantity".to_string())
            }
        }
    }
}

/// Read an order body, reporting any shape mismatch as invalid order data.
fn submission(body: Value) -> Result<OrderSubmission> {
    serde_json::from_value(body).map_err(|e| {
        tracing::debug!(error = %e, "Rejected order body");
        AppError::InvalidInput(INVALID_ORDER.to_string())
    })
}

/// `POST /placeorder` - store an order.
///
/// Only `name`, `phone` and a non-empty `cart` are required. The cart is
/// stored as sent; product ids, quantities and capacity are not checked.
#[instrument(skip(state, body))]
pub async fn place_order(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<Value>> {
    let order = submission(body)?.validate(Utc::now())?;
    let store = state.store()?;

    let order_id = store
        .insert_order(&order)
        .await
        .map_err(AppError::storage("Error placing order"))?;

    tracing::info!(order_id = %order_id, lines = order.cart.len(), "Order placed");
    Ok(Json(json!({
        "msg": "Order placed successfully",
        "orderId": order_id.to_hex(),
    })))
}

/// `POST /checkout` - store an order and take its spaces, all or nothing.
#[instrument(skip(state, body))]
pub async fn checkout(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<Value>> {
    let order = submission(body)?.validate(Utc::now())?;
    let cart = order.checkout_cart()?;
    let store = state.store()?;

    let receipt = store
        .checkout(&order, &cart)
        .await
        .map_err(AppError::storage("Error placing order"))?;

    tracing::info!(
        order_id = %receipt.order_id,
        updated = receipt.spaces.updated,
        skipped = receipt.spaces.skipped.len(),
        "Checkout completed"
    );
    Ok(Json(json!({
        "msg": "Order placed successfully",
        "orderId": receipt.order_id.to_hex(),
        "updated": receipt.spaces.updated,
    })))
}
