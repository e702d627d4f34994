//! Shopping item record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ItemId;

/// A persisted shopping list entry.
///
/// Serialized with the field names the frontend expects (`_id`, `createdAt`,
/// `updatedAt`). `name` and `quantity` always satisfy
/// [`ItemLimits::SCHEMA`](crate::ItemLimits::SCHEMA) once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingItem {
    #[serde(rename = "_id")]
    pub id: ItemId,
    pub name: String,
    pub quantity: i32,
    pub bought: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
