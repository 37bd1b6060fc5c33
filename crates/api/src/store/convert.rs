//! Conversions between request JSON, BSON documents and response JSON.
//!
//! Responses render ObjectIds as hex strings and datetimes as RFC 3339, the
//! way browser clients of the catalog expect them.

use activities_core::{NewOrder, ProductId};
use mongodb::bson::{self, Bson, DateTime, Document, doc};
use serde_json::{Map, Value};

use super::Result;

/// Build the stored form of an order.
///
/// # Errors
///
/// Returns `StoreError::Serialization` if a field holds a number BSON
/// cannot represent.
pub fn order_document(order: &NewOrder) -> Result<Document> {
    Ok(doc! {
        "name": bson::to_bson(&order.name)?,
        "phone": bson::to_bson(&order.phone)?,
        "cart": bson::to_bson(&order.cart)?,
        "createdAt": DateTime::from_millis(order.created_at.timestamp_millis()),
    })
}

/// Convert a JSON object body into a `$set` document.
///
/// # Errors
///
/// Returns `StoreError::Serialization` for numbers BSON cannot hold.
pub fn changes_document(changes: &Map<String, Value>) -> Result<Document> {
    Ok(bson::to_document(changes)?)
}

/// Filter addressing a product by its application-level id.
#[must_use]
pub fn product_filter(id: ProductId) -> Document {
    doc! { "id": id.as_i64() }
}

/// Numeric value of a BSON scalar, across integer and double storage.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

/// Remaining capacity recorded on a product, with a missing field read as 0.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn spaces(product: &Document) -> i64 {
    match product.get(activities_core::search::SPACES_FIELD) {
        Some(Bson::Int32(n)) => i64::from(*n),
        Some(Bson::Int64(n)) => *n,
        Some(Bson::Double(n)) => n.floor() as i64,
        _ => 0,
    }
}

/// Render a document for a JSON response.
#[must_use]
pub fn document_to_json(document: Document) -> Value {
    Value::Object(
        document
            .into_iter()
            .map(|(key, value)| (key, bson_to_json(value)))
            .collect(),
    )
}

/// Render documents for a JSON response, keeping their order.
#[must_use]
pub fn documents_to_json(documents: Vec<Document>) -> Value {
    Value::Array(documents.into_iter().map(document_to_json).collect())
}

/// Render one BSON value for a JSON response.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(id) => Value::String(id.to_hex()),
        Bson::DateTime(dt) => dt
            .try_to_rfc3339_string()
            .map_or_else(|_| Value::from(dt.timestamp_millis()), Value::String),
        Bson::Document(document) => document_to_json(document),
        Bson::Array(values) => Value::Array(values.into_iter().map(bson_to_json).collect()),
        Bson::Int32(n) => Value::from(n),
        Bson::Int64(n) => Value::from(n),
        // Integral doubles print without a fraction, as JavaScript clients do
        Bson::Double(n) if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 => {
            Value::from(n as i64)
        }
        Bson::Double(n) => serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number),
        Bson::String(s) => Value::String(s),
        Bson::Boolean(b) => Value::Bool(b),
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::Decimal128(d) => Value::String(d.to_string()),
        other => other.into_relaxed_extjson(),
    }
}
