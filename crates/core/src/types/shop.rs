//! Shopify shop domain type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when normalizing a [`ShopDomain`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShopDomainError {
    /// The input is empty after trimming.
    #[error("shop cannot be empty")]
    Empty,
    /// The shop handle contains characters Shopify never issues.
    #[error("shop handle must start with a letter or digit and contain only letters, digits and '-'")]
    InvalidHandle,
}

/// A normalized shop domain, always of the form `<handle>.myshopify.com`.
///
/// The handle is restricted to `[a-z0-9][a-z0-9-]*`; anything else could
/// point the token exchange at a host other than Shopify.
///
/// ## Examples
///
/// ```
/// use shopping_list_core::ShopDomain;
///
/// let shop = ShopDomain::normalize("  My-Shop ").unwrap();
/// assert_eq!(shop.as_str(), "my-shop.myshopify.com");
///
/// let shop = ShopDomain::normalize("my-shop.myshopify.com").unwrap();
/// assert_eq!(shop.handle(), "my-shop");
///
/// assert!(ShopDomain::normalize("").is_err());
/// assert!(ShopDomain::normalize("evil.com/").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShopDomain(String);

impl ShopDomain {
    /// Domain suffix of every Shopify shop.
    pub const SUFFIX: &'static str = ".myshopify.com";

    /// Normalize a shop handle or domain: trim, lowercase, and append
    /// [`Self::SUFFIX`] when it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is blank or the handle is malformed.
    pub fn normalize(raw: &str) -> Result<Self, ShopDomainError> {
        let lowered = raw.trim().to_lowercase();
        if lowered.is_empty() {
            return Err(ShopDomainError::Empty);
        }

        let handle = lowered.strip_suffix(Self::SUFFIX).unwrap_or(&lowered);
        if !is_valid_handle(handle) {
            return Err(ShopDomainError::InvalidHandle);
        }

        Ok(Self(format!("{handle}{}", Self::SUFFIX)))
    }

    /// Returns the domain as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the shop handle (the domain without [`Self::SUFFIX`]).
    #[must_use]
    pub fn handle(&self) -> &str {
        self.0.strip_suffix(Self::SUFFIX).unwrap_or(&self.0)
    }

    /// Consumes the `ShopDomain` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

fn is_valid_handle(handle: &str) -> bool {
    let mut chars = handle.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ShopDomain {
    type Err = ShopDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s)
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for ShopDomain {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ShopDomain {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for ShopDomain {
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
    use super::*;

    #[test]
    fn test_normalize_appends_suffix() {
        let shop = ShopDomain::normalize("testshop24").unwrap();
        assert_eq!(shop.as_str(), "testshop24.myshopify.com");
    }

    #[test]
    fn test_normalize_keeps_existing_suffix() {
        let shop = ShopDomain::normalize("testshop24.myshopify.com").unwrap();
        assert_eq!(shop.as_str(), "testshop24.myshopify.com");
    }

    #[test]
    fn test_normalize_trims_and_lowercases() {
        let shop = ShopDomain::normalize("  TestShop24.MyShopify.com\n").unwrap();
        assert_eq!(shop.as_str(), "testshop24.myshopify.com");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = ShopDomain::normalize("Dev-Store").unwrap();
        let twice = ShopDomain::normalize(once.as_str()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(ShopDomain::normalize(""), Err(ShopDomainError::Empty));
        assert_eq!(ShopDomain::normalize("   "), Err(ShopDomainError::Empty));
    }

    #[test]
    fn test_normalize_rejects_foreign_hosts() {
        for raw in [
            "evil.com",
            "evil.com/",
            "evil.com#",
            "user@evil.com",
            "shop.evil.com.myshopify.com",
            "-leading-dash",
            ".myshopify.com",
            "shop name",
        ] {
            assert_eq!(
                ShopDomain::normalize(raw),
                Err(ShopDomainError::InvalidHandle),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_handle() {
        let shop = ShopDomain::normalize("my-shop").unwrap();
        assert_eq!(shop.handle(), "my-shop");
    }
}
