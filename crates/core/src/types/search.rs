//! Search term parsing and translation into a product filter.
//!
//! A term always produces case-insensitive substring conditions on the text
//! fields. When the whole trimmed term parses as a number it additionally
//! produces exact-match conditions on the numeric fields. The conditions are
//! combined with logical OR.

use core::fmt;

/// Text field holding the activity name.
pub const SUBJECT_FIELD: &str = "subject";
/// Text field holding where the activity takes place.
pub const LOCATION_FIELD: &str = "location";
/// Numeric field holding the price.
pub const PRICE_FIELD: &str = "price";
/// Numeric field holding the remaining capacity.
pub const SPACES_FIELD: &str = "Spaces";

/// Errors that can occur when parsing a [`SearchTerm`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// The term is empty or whitespace only.
    #[error("search query cannot be empty")]
    EmptyQuery,
}

/// A non-blank search term, stored trimmed.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchTerm {
    text: String,
    number: Option<f64>,
}

impl SearchTerm {
    /// Parse a raw query string.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::EmptyQuery`] when the input is empty or
    /// whitespace only.
    pub fn parse(raw: &str) -> Result<Self, SearchError> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let number = text.parse::<f64>().ok().filter(|n| n.is_finite());

        Ok(Self {
            text: text.to_owned(),
            number,
        })
    }

    /// The trimmed term.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The parsed value when the term is numeric.
    #[must_use]
    pub const fn number(&self) -> Option<f64> {
        self.number
    }

    /// Translate the term into a disjunctive product filter.
    #[must_use]
    pub fn to_filter(&self) -> SearchFilter {
        let mut conditions = vec![
            Condition::Contains {
                field: SUBJECT_FIELD,
                needle: self.text.clone(),
            },
            Condition::Contains {
                field: LOCATION_FIELD,
                needle: self.text.clone(),
            },
        ];

        if let Some(value) = self.number {
            conditions.push(Condition::Equals {
                field: PRICE_FIELD,
                value,
            });
            conditions.push(Condition::Equals {
                field: SPACES_FIELD,
                value,
            });
        }

        SearchFilter { conditions }
    }
}

impl fmt::Display for SearchTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// One field condition inside a [`SearchFilter`].
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Case-insensitive literal substring match on a text field.
    Contains {
        field: &'static str,
        needle: String,
    },
    /// Exact numeric match, regardless of integer or double storage.
    Equals { field: &'static str, value: f64 },
}

impl Condition {
    /// The document field this condition inspects.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Contains { field, .. } | Self::Equals { field, .. } => field,
        }
    }

    /// Whether a text value satisfies this condition.
    ///
    /// Always `false` for numeric conditions.
    #[must_use]
    pub fn matches_text(&self, value: &str) -> bool {
        match self {
            Self::Contains { needle, .. } => value.to_lowercase().contains(&needle.to_lowercase()),
            Self::Equals { .. } => false,
        }
    }

    /// Whether a numeric value satisfies this condition.
    ///
    /// Always `false` for text conditions.
    #[must_use]
    #[allow(clippy::float_cmp)] // exact equality is the contract
    pub fn matches_number(&self, value: f64) -> bool {
        match self {
            Self::Equals { value: expected, .. } => value == *expected,
            Self::Contains { .. } => false,
        }
    }
}

/// Logical OR of field conditions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchFilter {
    pub conditions: Vec<Condition>,
}
