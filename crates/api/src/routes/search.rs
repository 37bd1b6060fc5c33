//! Catalog search.

use activities_core::{SearchError, SearchTerm};
use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::store::convert::documents_to_json;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::EmptyQuery => Self::InvalidInput("Search query required".to_string()),
        }
    }
}

/// `GET /search?query=<term>` - products whose subject or location contains
/// the term, or whose price or capacity equals it when it is numeric.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Value>> {
    let term = SearchTerm::parse(&params.query)?;
    let store = state.store()?;

    let products = store
        .search_products(&term.to_filter())
        .await
        .map_err(AppError::storage("Search failed"))?;

    tracing::debug!(term = term.as_str(), results = products.len(), "Search completed");
    Ok(Json(documents_to_json(products)))
}
