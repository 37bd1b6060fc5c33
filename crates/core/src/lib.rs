//! Activities Core - Shared domain types.
//!
//! This crate provides the types used by the API server and the CLI:
//! - `api` - HTTP backend for the activities catalog
//! - `cli` - Seeding and inspection tools
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP. Everything here is pure and unit-testable.
//!
//! # Modules
//!
//! - [`types`] - Product ids, collection names, search filters, carts and orders

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
