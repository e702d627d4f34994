//! Item validation engine.
//!
//! Every create or update request for a shopping item passes through these
//! functions before it reaches a repository. They are pure: the output is
//! exactly the argument the repository receives.
//!
//! Payloads arrive as untyped JSON so that a missing field, a `null` field and
//! a field of the wrong type can each be told apart.

mod limits;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use limits::{ItemLimits, LimitsError};

use crate::types::ItemId;

/// Reasons a create/update/id input is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// `name` is missing, not a string, or blank after trimming.
    #[error("Name is required and must be a non-empty string")]
    MissingName,

    /// `name` is longer than the configured maximum.
    #[error("Name cannot exceed {max} characters")]
    NameTooLong { max: usize },

    /// `quantity` is not an integer within the configured range.
    #[error("Quantity must be an integer between {min} and {max}")]
    InvalidQuantity { min: i32, max: i32 },

    /// `bought` is present but not a boolean.
    #[error("Bought must be a boolean value")]
    InvalidBought,

    /// An update carried neither `bought` nor `quantity`.
    #[error("At least one field (bought or quantity) is required")]
    EmptyUpdate,

    /// The path id is not a well-formed item id.
    #[error("Invalid ID format")]
    InvalidId,
}

impl ValidationError {
    /// Stable machine-readable code for API responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingName | Self::NameTooLong { .. } => "INVALID_NAME",
            Self::InvalidQuantity { .. } => "INVALID_QUANTITY",
            Self::InvalidBought => "INVALID_BOUGHT",
            Self::EmptyUpdate => "EMPTY_UPDATE",
            Self::InvalidId => "INVALID_ID",
        }
    }
}

/// A validated create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    /// Trimmed name.
    pub name: String,
    pub quantity: i32,
}

/// A validated partial update.
///
/// Only fields the caller supplied are `Some`; storage leaves the others
/// untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bought: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i32>,
}

/// Validate the body of a create request.
///
/// # Errors
///
/// - [`ValidationError::MissingName`] / [`ValidationError::NameTooLong`] for a bad `name`
/// - [`ValidationError::InvalidQuantity`] for a present but invalid `quantity`
pub fn validate_create(payload: &Value, limits: &ItemLimits) -> Result<NewItem, ValidationError> {
    let name = payload
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or(ValidationError::MissingName)?;

    if !limits.allows_name(name) {
        return Err(ValidationError::NameTooLong {
            max: limits.name_max_length(),
        });
    }

    let quantity = match payload.get("quantity") {
        None => ItemLimits::DEFAULT_QUANTITY,
        Some(value) => parse_quantity(value, limits)?,
    };

    Ok(NewItem {
        name: name.to_owned(),
        quantity,
    })
}

/// Validate the body of an update request.
///
/// # Errors
///
/// - [`ValidationError::EmptyUpdate`] if neither field is present
/// - [`ValidationError::InvalidBought`] if `bought` is not a boolean
/// - [`ValidationError::InvalidQuantity`] if `quantity` is out of range
pub fn validate_update(payload: &Value, limits: &ItemLimits) -> Result<ItemUpdate, ValidationError> {
    let bought = payload.get("bought");
    let quantity = payload.get("quantity");

    if bought.is_none() && quantity.is_none() {
        return Err(ValidationError::EmptyUpdate);
    }

    let bought = bought
        .map(|value| value.as_bool().ok_or(ValidationError::InvalidBought))
        .transpose()?;
    let quantity = quantity
        .map(|value| parse_quantity(value, limits))
        .transpose()?;

    Ok(ItemUpdate { bought, quantity })
}

/// Validate a raw path id.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidId`] if `raw` is not 24 hex characters.
pub fn validate_id(raw: &str) -> Result<ItemId, ValidationError> {
    ItemId::parse(raw).map_err(|_| ValidationError::InvalidId)
}

/// Accept JSON integers, and floats with no fractional part (`3.0`).
fn parse_quantity(value: &Value, limits: &ItemLimits) -> Result<i32, ValidationError> {
    let invalid = || ValidationError::InvalidQuantity {
        min: limits.quantity_min(),
        max: limits.quantity_max(),
    };

    let Value::Number(number) = value else {
        return Err(invalid());
    };

    #[allow(clippy::float_cmp, clippy::cast_possible_truncation)]
    let quantity = number.as_i64().or_else(|| {
        number
            .as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    });

    match quantity {
        Some(q) if limits.allows_quantity(q) => i32::try_from(q).map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}
