//! Shopping List Core - Domain types and the item validation engine.
//!
//! This crate is shared by:
//! - `server` - JSON API for items plus the Shopify install flow
//! - `cli` - Command-line tools for migrations and maintenance
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Every mutation of a shopping item passes through
//! [`validation`] before it reaches a repository.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for item IDs, shop domains, and item records
//! - [`validation`] - Create/update/id validation and the canonical item limits

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;
pub mod validation;

pub use types::*;
pub use validation::{
    ItemLimits, ItemUpdate, LimitsError, NewItem, ValidationError, validate_create,
    validate_id, validate_update,
};
