//! `PostgreSQL` storage for Shopify access tokens.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use shopping_list_core::ShopDomain;
use sqlx::PgPool;

use super::{RepositoryError, ShopSessionRepository};

// =============================================================================
// Types
// =============================================================================

/// An installed shop and its Admin API access token.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct ShopSession {
    /// Normalized shop domain (e.g., my-shop.myshopify.com).
    pub shop: ShopDomain,
    /// OAuth access token (redacted in debug output).
    pub access_token: SecretString,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for ShopSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopSession")
            .field("shop", &self.shop)
            .field("access_token", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Internal row type for `PostgreSQL` queries.
#[derive(sqlx::FromRow)]
struct ShopSessionRow {
    shop: String,
    access_token: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ShopSessionRow> for ShopSession {
    type Error = RepositoryError;

    fn try_from(row: ShopSessionRow) -> Result<Self, Self::Error> {
        let shop = ShopDomain::normalize(&row.shop).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid shop '{}': {e}", row.shop))
        })?;

        Ok(Self {
            shop,
            access_token: SecretString::from(row.access_token),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for Shopify session database operations.
#[derive(Clone)]
pub struct PgShopSessionRepository {
    pool: PgPool,
}

impl PgShopSessionRepository {
    /// Create a new shop session repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShopSessionRepository for PgShopSessionRepository {
    async fn get(&self, shop: &ShopDomain) -> Result<Option<ShopSession>, RepositoryError> {
        let row = sqlx::query_as::<_, ShopSessionRow>(
            r"
            SELECT shop, access_token, created_at, updated_at
            FROM shop_sessions
            WHERE shop = $1
            ",
        )
        .bind(shop)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ShopSession::try_from).transpose()
    }

    async fn upsert(
        &self,
        shop: &ShopDomain,
        access_token: &SecretString,
    ) -> Result<ShopSession, RepositoryError> {
        let row = sqlx::query_as::<_, ShopSessionRow>(
            r"
            INSERT INTO shop_sessions (shop, access_token)
            VALUES ($1, $2)
            ON CONFLICT (shop) DO UPDATE SET
                access_token = EXCLUDED.access_token,
                updated_at = NOW()
            RETURNING shop, access_token, created_at, updated_at
            ",
        )
        .bind(shop)
        .bind(access_token.expose_secret())
        .fetch_one(&self.pool)
        .await?;

        ShopSession::try_from(row)
    }

    async fn list(&self) -> Result<Vec<ShopSession>, RepositoryError> {
        let rows = sqlx::query_as::<_, ShopSessionRow>(
            r"
            SELECT shop, access_token, created_at, updated_at
            FROM shop_sessions
            ORDER BY shop
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ShopSession::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shop_session_debug_redacts_token() {
        let session = ShopSession {
            shop: ShopDomain::normalize("debug-shop").expect("valid shop"),
            access_token: SecretString::from("shpat_super_secret_token"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let debug_output = format!("{session:?}");

        assert!(debug_output.contains("debug-shop.myshopify.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("shpat_super_secret_token"));
    }
}
