//! Inventory adjustment after an order.

use activities_core::{Cart, CartLine};
use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::{AppError, JsonBody, Result};
use crate::state::AppState;

/// `PUT /update-spaces` body.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSpacesRequest {
    #[serde(default)]
    pub cart: Option<Vec<CartLine>>,
}

/// Read the cart out of the body; anything that is not a list of lines is
/// treated as an empty cart.
fn requested_cart(body: Value) -> Result<Cart> {
    let request: UpdateSpacesRequest = serde_json::from_value(body).map_err(|e| {
        tracing::debug!(error = %e, "Rejected cart body");
        AppError::InvalidInput("Cart is empty".to_string())
    })?;

    Ok(Cart::parse(request.cart.unwrap_or_default())?)
}

/// `PUT /update-spaces` - decrement `Spaces` for every cart line.
///
/// Unknown products are skipped. If any line asks for more than remains,
/// nothing is decremented and the conflict is reported.
#[instrument(skip(state, body))]
pub async fn update_spaces(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Value>,
) -> Result<Json<Value>> {
    let cart = requested_cart(body)?;
    let store = state.store()?;

    let report = store
        .decrement_spaces(&cart)
        .await
        .map_err(AppError::storage("Failed to update Spaces"))?;

    tracing::info!(
        updated = report.updated,
        skipped = report.skipped.len(),
        requested = cart.total_quantity(),
        "Spaces updated"
    );
    Ok(Json(json!({
        "msg": "Spaces updated successfully",
        "updated": report.updated,
    })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_requested_cart_missing_or_malformed() {
        for body in [json!({}), json!({"cart": null}), json!({"cart": []}), json!({"cart": "x"})] {
            let err = requested_cart(body).unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(ref msg) if msg == "Cart is empty"));
        }
    }

    #[test]
    fn test_requested_cart_rejects_zero_quantity() {
        let err = requested_cart(json!({"cart": [{"id": 1, "quantity": 0}]})).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(ref msg) if msg == "Invalid cart quantity"));
    }

    #[test]
    fn test_requested_cart_keeps_line_order() {
        let cart = requested_cart(json!({
            "cart": [{"id": 2, "quantity": 1, "subject": "Music"}, {"id": 1, "quantity": 3}]
        }))
        .unwrap();

        let ids: Vec<i64> = cart.lines().iter().map(|line| line.id.as_i64()).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(cart.total_quantity(), 4);
    }
}
