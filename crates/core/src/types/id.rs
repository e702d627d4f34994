//! Shopping item identifier.
//!
//! Items are keyed by a 24-character hexadecimal ID with the same shape as a
//! document-store object id: a 4-byte big-endian creation timestamp (seconds),
//! 5 random bytes, and a 3-byte counter.

use core::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

/// Per-process counter for the trailing 3 bytes of generated IDs.
static COUNTER: AtomicU32 = AtomicU32::new(0);

const COUNTER_MASK: u32 = 0x00FF_FFFF;
const RANDOM_MASK: u64 = 0xFF_FFFF_FFFF;

/// Errors that can occur when parsing an [`ItemId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ItemIdError {
    /// The input does not have exactly [`ItemId::LENGTH`] characters.
    #[error("item id must be {expected} characters (got {actual})")]
    WrongLength {
        /// Required length.
        expected: usize,
        /// Length of the rejected input.
        actual: usize,
    },
    /// The input contains a non-hexadecimal character.
    #[error("item id must only contain hexadecimal characters")]
    NotHex,
}

/// A shopping item ID.
///
/// ## Constraints
///
/// - Exactly 24 characters
/// - Only `0-9`, `a-f` (uppercase input is accepted and lowercased)
///
/// ## Examples
///
/// ```
/// use shopping_list_core::ItemId;
///
/// assert!(ItemId::parse("65f1c2a9b3e4d5f6a7b8c9d0").is_ok());
/// assert!(ItemId::parse("65F1C2A9B3E4D5F6A7B8C9D0").is_ok());
///
/// assert!(ItemId::parse("").is_err());
/// assert!(ItemId::parse("not-an-id").is_err());
/// assert!(ItemId::parse("65f1c2a9b3e4d5f6a7b8c9dz").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Length of an item ID in characters.
    pub const LENGTH: usize = 24;

    /// Parse an `ItemId` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly 24 hexadecimal characters.
    pub fn parse(s: &str) -> Result<Self, ItemIdError> {
        if s.len() != Self::LENGTH {
            return Err(ItemIdError::WrongLength {
                expected: Self::LENGTH,
                actual: s.len(),
            });
        }

        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ItemIdError::NotHex);
        }

        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Generate a fresh ID for a newly created item.
    #[must_use]
    pub fn generate() -> Self {
        let seconds = u32::try_from(chrono::Utc::now().timestamp()).unwrap_or(u32::MAX);
        let random = rand::random::<u64>() & RANDOM_MASK;
        let count = COUNTER.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;

        Self(format!("{seconds:08x}{random:010x}{count:06x}"))
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `ItemId` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ItemId {
    type Err = ItemIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for ItemId {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ItemId {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for ItemId {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_parse_valid_ids() {
        assert!(ItemId::parse("65f1c2a9b3e4d5f6a7b8c9d0").is_ok());
        assert!(ItemId::parse("000000000000000000000000").is_ok());
        assert!(ItemId::parse("ffffffffffffffffffffffff").is_ok());
    }

    #[test]
    fn test_parse_lowercases() {
        let id = ItemId::parse("65F1C2A9B3E4D5F6A7B8C9D0").unwrap();
        assert_eq!(id.as_str(), "65f1c2a9b3e4d5f6a7b8c9d0");
    }

    #[test]
    fn test_parse_wrong_length() {
        assert_eq!(
            ItemId::parse("65f1c2a9"),
            Err(ItemIdError::WrongLength {
                expected: 24,
                actual: 8
            })
        );
        assert!(ItemId::parse("65f1c2a9b3e4d5f6a7b8c9d0a").is_err());
        assert!(ItemId::parse("").is_err());
    }

    #[test]
    fn test_parse_not_hex() {
        assert_eq!(
            ItemId::parse("65f1c2a9b3e4d5f6a7b8c9dg"),
            Err(ItemIdError::NotHex)
        );
        // 24 bytes but multibyte characters must not slip through
        assert!(ItemId::parse("65f1c2a9b3e4d5f6a7b8c9é").is_err());
    }

    #[test]
    fn test_generate_has_valid_shape() {
        let id = ItemId::generate();
        assert_eq!(id.as_str().len(), ItemId::LENGTH);
        assert_eq!(ItemId::parse(id.as_str()).unwrap(), id);
    }

    #[test]
    fn test_generate_is_unique() {
        let ids: HashSet<ItemId> = (0..1_000).map(|_| ItemId::generate()).collect();
        assert_eq!(ids.len(), 1_000);
    }

    #[test]
    fn test_serde_transparent() {
        let id = ItemId::parse("65f1c2a9b3e4d5f6a7b8c9d0").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"65f1c2a9b3e4d5f6a7b8c9d0\"");
    }
}
