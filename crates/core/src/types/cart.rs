//! Cart line items submitted at checkout.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::ProductId;

/// Errors raised when a cart cannot be used to adjust inventory.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// The cart has no line items.
    #[error("cart is empty")]
    Empty,
    /// A line is missing an integer `id` or `quantity`.
    #[error("cart line {index} needs an integer id and quantity")]
    MalformedLine {
        /// Position of the line in the cart.
        index: usize,
    },
    /// A line asks for zero or fewer spaces.
    #[error("quantity for product {id} must be positive (got {quantity})")]
    NonPositiveQuantity {
        /// Product on the offending line.
        id: ProductId,
        /// The quantity that was submitted.
        quantity: i64,
    },
}

/// One `{id, quantity}` entry of a cart.
///
/// Any other attributes the client sends on a line (title, price, image...)
/// are kept in `extra` so that stored orders reproduce the submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: ProductId,
    pub quantity: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CartLine {
    /// Create a line with no extra attributes.
    #[must_use]
    pub fn new(id: ProductId, quantity: i64) -> Self {
        Self {
            id,
            quantity,
            extra: Map::new(),
        }
    }
}

/// An ordered, non-empty list of line items with positive quantities.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Cart(Vec<CartLine>);

impl Cart {
    /// Validate lines for inventory adjustment.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Empty`] for an empty list, or
    /// [`CartError::NonPositiveQuantity`] for the first line whose quantity
    /// is zero or negative.
    pub fn parse(lines: Vec<CartLine>) -> Result<Self, CartError> {
        if lines.is_empty() {
            return Err(CartError::Empty);
        }

        if let Some(line) = lines.iter().find(|line| line.quantity <= 0) {
            return Err(CartError::NonPositiveQuantity {
                id: line.id,
                quantity: line.quantity,
            });
        }

        Ok(Self(lines))
    }

    /// Read lines from submitted JSON, then validate them with [`Cart::parse`].
    ///
    /// # Errors
    ///
    /// Returns [`CartError::MalformedLine`] for the first line that is not an
    /// `{id, quantity}` object, or any error of [`Cart::parse`].
    pub fn from_json(lines: &[Value]) -> Result<Self, CartError> {
        let lines = lines
            .iter()
            .enumerate()
            .map(|(index, line)| {
                CartLine::deserialize(line).map_err(|_| CartError::MalformedLine { index })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::parse(lines)
    }

    /// The line items in submission order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.0
    }

    /// Total number of spaces requested across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> i64 {
        self.0.iter().map(|line| line.quantity).sum()
    }
}
