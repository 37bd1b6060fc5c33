//! Order submissions and the validated order ready to persist.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::cart::{Cart, CartError};

/// Errors that can occur when validating an [`OrderSubmission`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// `name` is absent or blank.
    #[error("order name is required")]
    MissingName,
    /// `phone` is absent or blank.
    #[error("order phone is required")]
    MissingPhone,
    /// `cart` is absent or has no lines.
    #[error("order cart cannot be empty")]
    EmptyCart,
}

/// Raw order body as posted by the client.
///
/// Fields are kept as JSON so the stored order reproduces the submission,
/// and a missing field is reported as an invalid order rather than a body
/// parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderSubmission {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub phone: Option<Value>,
    #[serde(default)]
    pub cart: Option<Vec<Value>>,
}

/// Whether a submitted field counts as provided.
///
/// `null`, `false`, `0` and the empty string do not.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

impl OrderSubmission {
    /// Validate the submission and stamp it with its creation time.
    ///
    /// Only presence is checked. Cart lines are stored as sent; product
    /// ids, quantities and capacity are not looked at here.
    ///
    /// # Errors
    ///
    /// Returns the first missing or empty field.
    pub fn validate(self, created_at: DateTime<Utc>) -> Result<NewOrder, OrderError> {
        let name = self
            .name
            .filter(is_present)
            .ok_or(OrderError::MissingName)?;
        let phone = self
            .phone
            .filter(is_present)
            .ok_or(OrderError::MissingPhone)?;
        let cart = self
            .cart
            .filter(|cart| !cart.is_empty())
            .ok_or(OrderError::EmptyCart)?;

        Ok(NewOrder {
            name,
            phone,
            cart,
            created_at,
        })
    }
}

/// An order that passed validation and is ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub name: Value,
    pub phone: Value,
    pub cart: Vec<Value>,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    /// The order's cart, validated for inventory adjustment.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::MalformedLine`] when a line lacks an integer
    /// `id` or `quantity`, and [`CartError::NonPositiveQuantity`] when a
    /// line cannot be decremented.
    pub fn checkout_cart(&self) -> Result<Cart, CartError> {
        Cart::from_json(&self.cart)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ProductId;

    fn submission(json: &str) -> OrderSubmission {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_validate_complete_order() {
        let now = Utc::now();
        let order = submission(r#"{"name":"A","phone":"123","cart":[{"id":1,"quantity":2}]}"#)
            .validate(now)
            .unwrap();

        assert_eq!(order.name, json!("A"));
        assert_eq!(order.phone, json!("123"));
        assert_eq!(order.cart, vec![json!({"id": 1, "quantity": 2})]);
        assert_eq!(order.created_at, now);
    }

    #[test]
    fn test_validate_missing_fields() {
        let now = Utc::now();
        assert_eq!(
            submission(r#"{"phone":"1","cart":[{"id":1,"quantity":1}]}"#).validate(now),
            Err(OrderError::MissingName)
        );
        assert_eq!(
            submission(r#"{"name":"","phone":"1","cart":[{"id":1,"quantity":1}]}"#).validate(now),
            Err(OrderError::MissingName)
        );
        assert_eq!(
            submission(r#"{"name":"A","phone":null,"cart":[{"id":1,"quantity":1}]}"#)
                .validate(now),
            Err(OrderError::MissingPhone)
        );
        assert_eq!(
            submission(r#"{"name":"A","cart":[{"id":1,"quantity":1}]}"#).validate(now),
            Err(OrderError::MissingPhone)
        );
        assert_eq!(
            submission(r#"{"name":"A","phone":"1"}"#).validate(now),
            Err(OrderError::EmptyCart)
        );
        assert_eq!(
            submission(r#"{"name":"A","phone":"1","cart":[]}"#).validate(now),
            Err(OrderError::EmptyCart)
        );
    }

    #[test]
    fn test_validate_accepts_loose_shapes() {
        let order = submission(
            r#"{"name":"A","phone":123,"cart":[{"id":"1"},{"quantity":1.5},{"id":99,"quantity":-4}]}"#,
        )
        .validate(Utc::now())
        .unwrap();

        assert_eq!(order.phone, json!(123));
        assert_eq!(order.cart.len(), 3);
        assert_eq!(order.cart[0], json!({"id": "1"}));
        assert!(order.checkout_cart().is_err());
    }

    #[test]
    fn test_checkout_cart_reads_typed_lines() {
        let order = submission(
            r#"{"name":"A","phone":"1","cart":[{"id":3,"quantity":2,"subject":"Maths"}]}"#,
        )
        .validate(Utc::now())
        .unwrap();

        let cart = order.checkout_cart().unwrap();
        assert_eq!(cart.lines()[0].id, ProductId::new(3));
        assert_eq!(cart.total_quantity(), 2);
    }

    #[test]
    fn test_checkout_cart_rejects_non_positive_quantity() {
        let order = submission(r#"{"name":"A","phone":"1","cart":[{"id":99,"quantity":-4}]}"#)
            .validate(Utc::now())
            .unwrap();
        assert_eq!(
            order.checkout_cart(),
            Err(CartError::NonPositiveQuantity {
                id: ProductId::new(99),
                quantity: -4
            })
        );
    }
}
