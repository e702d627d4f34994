//! Bounds for item names and quantities.
//!
//! [`ItemLimits::SCHEMA`] is the single source of truth: the storage schema's
//! CHECK constraints use the same numbers, and runtime configuration can only
//! narrow them.

use thiserror::Error;

/// Errors produced when configured limits would exceed the schema bounds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimitsError {
    #[error("name max length must be between 1 and {max} (got {value})")]
    NameMaxLength { value: usize, max: usize },
    #[error("quantity max must be between {min} and {max} (got {value})")]
    QuantityMax { value: i32, min: i32, max: i32 },
}

/// Accepted ranges for item fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemLimits {
    name_max_length: usize,
    quantity_min: i32,
    quantity_max: i32,
}

impl ItemLimits {
    /// Bounds enforced by the storage schema.
    pub const SCHEMA: Self = Self {
        name_max_length: 100,
        quantity_min: 1,
        quantity_max: 999,
    };

    /// Quantity assigned when a create request omits it.
    pub const DEFAULT_QUANTITY: i32 = 1;

    /// Build limits that are at most as wide as [`Self::SCHEMA`].
    ///
    /// The minimum quantity is fixed at [`Self::DEFAULT_QUANTITY`] so that a
    /// defaulted quantity is always valid.
    ///
    /// # Errors
    ///
    /// Returns `LimitsError` if either bound is zero/negative or wider than
    /// the schema allows.
    pub const fn new(name_max_length: usize, quantity_max: i32) -> Result<Self, LimitsError> {
        if name_max_length == 0 || name_max_length > Self::SCHEMA.name_max_length {
            return Err(LimitsError::NameMaxLength {
                value: name_max_length,
                max: Self::SCHEMA.name_max_length,
            });
        }

        if quantity_max < Self::SCHEMA.quantity_min || quantity_max > Self::SCHEMA.quantity_max {
            return Err(LimitsError::QuantityMax {
                value: quantity_max,
                min: Self::SCHEMA.quantity_min,
                max: Self::SCHEMA.quantity_max,
            });
        }

        Ok(Self {
            name_max_length,
            quantity_min: Self::SCHEMA.quantity_min,
            quantity_max,
        })
    }

    #[must_use]
    pub const fn name_max_length(&self) -> usize {
        self.name_max_length
    }

    #[must_use]
    pub const fn quantity_min(&self) -> i32 {
        self.quantity_min
    }

    #[must_use]
    pub const fn quantity_max(&self) -> i32 {
        self.quantity_max
    }

    /// Whether `quantity` lies within `[quantity_min, quantity_max]`.
    #[must_use]
    pub const fn allows_quantity(&self, quantity: i64) -> bool {
        quantity >= self.quantity_min as i64 && quantity <= self.quantity_max as i64
    }

    /// Whether an already-trimmed name is non-empty and short enough.
    #[must_use]
    pub fn allows_name(&self, name: &str) -> bool {
        !name.is_empty() && name.chars().count() <= self.name_max_length
    }
}

impl Default for ItemLimits {
    fn default() -> Self {
        Self::SCHEMA
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_bounds() {
        let limits = ItemLimits::SCHEMA;
        assert_eq!(limits.name_max_length(), 100);
        assert_eq!(limits.quantity_min(), 1);
        assert_eq!(limits.quantity_max(), 999);
        assert_eq!(ItemLimits::default(), ItemLimits::SCHEMA);
    }

    #[test]
    fn test_new_can_tighten() {
        let limits = ItemLimits::new(50, 99).unwrap();
        assert_eq!(limits.name_max_length(), 50);
        assert_eq!(limits.quantity_max(), 99);
        assert!(limits.allows_quantity(99));
        assert!(!limits.allows_quantity(100));
    }

    #[test]
    fn test_new_cannot_widen() {
        assert!(matches!(
            ItemLimits::new(101, 999),
            Err(LimitsError::NameMaxLength { value: 101, .. })
        ));
        assert!(matches!(
            ItemLimits::new(100, 1000),
            Err(LimitsError::QuantityMax { value: 1000, .. })
        ));
        assert!(ItemLimits::new(0, 999).is_err());
        assert!(ItemLimits::new(100, 0).is_err());
    }

    #[test]
    fn test_allows_quantity_edges() {
        let limits = ItemLimits::SCHEMA;
        assert!(!limits.allows_quantity(0));
        assert!(limits.allows_quantity(1));
        assert!(limits.allows_quantity(999));
        assert!(!limits.allows_quantity(1000));
        assert!(!limits.allows_quantity(-1));
    }

    #[test]
    fn test_allows_name_counts_characters() {
        let limits = ItemLimits::SCHEMA;
        assert!(!limits.allows_name(""));
        assert!(limits.allows_name(&"ä".repeat(100)));
        assert!(!limits.allows_name(&"a".repeat(101)));
    }
}
