//! Collection names and the allow-list that gates the generic gateway.

use core::fmt;
use std::collections::BTreeSet;

use serde::Serialize;

/// Errors that can occur when resolving a [`CollectionName`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CollectionNameError {
    /// The input string is empty.
    #[error("collection name cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("collection name must be at most {max} bytes")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character the store does not accept.
    #[error("collection name cannot contain {0:?}")]
    InvalidCharacter(char),
    /// The input names a store-internal collection.
    #[error("collection name cannot start with \"system.\"")]
    Reserved,
    /// The name is well formed but not on the allow-list.
    #[error("collection {0} is not exposed")]
    NotAllowed(String),
}

/// A syntactically valid collection name.
///
/// ## Constraints
///
/// - Length: 1-120 bytes
/// - No `$` and no NUL characters
/// - Must not start with `system.`
///
/// ## Examples
///
/// ```
/// use activities_core::CollectionName;
///
/// assert!(CollectionName::parse("products").is_ok());
/// assert!(CollectionName::parse("").is_err());
/// assert!(CollectionName::parse("a$b").is_err());
/// assert!(CollectionName::parse("system.users").is_err());
/// ```
#[derive(Debug, Clone, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct CollectionName(String);

impl CollectionName {
    /// Maximum length of a collection name in bytes.
    pub const MAX_LENGTH: usize = 120;

    /// Parse a `CollectionName` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, contains `$` or NUL,
    /// or names a `system.` collection.
    pub fn parse(s: &str) -> Result<Self, CollectionNameError> {
        if s.is_empty() {
            return Err(CollectionNameError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(CollectionNameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if let Some(c) = s.chars().find(|c| matches!(c, '$' | '\0')) {
            return Err(CollectionNameError::InvalidCharacter(c));
        }

        if s.starts_with("system.") {
            return Err(CollectionNameError::Reserved);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CollectionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Which collection names the generic gateway may resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionAllowlist {
    /// Any syntactically valid name resolves, including collections that do
    /// not exist yet.
    Any,
    /// Only the listed names resolve.
    Only(BTreeSet<CollectionName>),
}

impl CollectionAllowlist {
    /// Parse a comma separated list, or `*` for [`CollectionAllowlist::Any`].
    ///
    /// Blank entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns the first entry that is not a valid collection name.
    pub fn parse(s: &str) -> Result<Self, CollectionNameError> {
        if s.trim() == "*" {
            return Ok(Self::Any);
        }

        let names = s
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(CollectionName::parse)
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(Self::Only(names))
    }

    /// Resolve a path-supplied name against this allow-list.
    ///
    /// # Errors
    ///
    /// Returns a syntax error from [`CollectionName::parse`], or
    /// [`CollectionNameError::NotAllowed`] for a well-formed name that is not
    /// listed.
    pub fn resolve(&self, name: &str) -> Result<CollectionName, CollectionNameError> {
        let name = CollectionName::parse(name)?;
        match self {
            Self::Any => Ok(name),
            Self::Only(names) if names.contains(&name) => Ok(name),
            Self::Only(_) => Err(CollectionNameError::NotAllowed(name.0)),
        }
    }
}

impl Default for CollectionAllowlist {
    fn default() -> Self {
        Self::Only(
            ["products", "orders"]
                .into_iter()
                .map(|name| CollectionName(name.to_owned()))
                .collect(),
        )
    }
}
