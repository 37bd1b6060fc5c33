//! Core types for the activities catalog.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod collection;
pub mod id;
pub mod order;
pub mod search;

pub use cart::{Cart, CartError, CartLine};
pub use collection::{CollectionAllowlist, CollectionName, CollectionNameError};
pub use id::*;
pub use order::{NewOrder, OrderError, OrderSubmission};
pub use search::{Condition, SearchError, SearchFilter, SearchTerm};
