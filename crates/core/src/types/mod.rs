//! Core types for the shopping list service.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod item;
pub mod shop;

pub use id::{ItemId, ItemIdError};
pub use item::ShoppingItem;
pub use shop::{ShopDomain, ShopDomainError};
