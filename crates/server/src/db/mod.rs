//! Persistence for shopping items and Shopify sessions.
//!
//! # Tables
//!
//! - `shopping_items` - The shared shopping list
//! - `shop_sessions` - One Shopify access token per installed shop
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p shopping-list-cli -- migrate
//! ```
//!
//! Handlers only see the [`ItemRepository`] and [`ShopSessionRepository`]
//! traits. The `Pg*` implementations back the running server; the
//! `InMemory*` ones back tests and local experiments.

pub mod items;
pub mod memory;
pub mod shop_sessions;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use shopping_list_core::{ItemId, ItemUpdate, NewItem, ShopDomain, ShoppingItem};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use items::PgItemRepository;
pub use memory::{InMemoryItemRepository, InMemoryShopSessionRepository};
pub use shop_sessions::{PgShopSessionRepository, ShopSession};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., a quantity outside the schema bounds).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Storage for shopping items.
///
/// `update` and `delete` return `Ok(None)` when no item has the given id.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// All items, newest first.
    async fn list(&self) -> Result<Vec<ShoppingItem>, RepositoryError>;

    /// Insert a validated item with a fresh id and `bought = false`.
    async fn create(&self, item: &NewItem) -> Result<ShoppingItem, RepositoryError>;

    /// Apply the supplied fields and bump `updated_at`.
    async fn update(
        &self,
        id: &ItemId,
        update: &ItemUpdate,
    ) -> Result<Option<ShoppingItem>, RepositoryError>;

    /// Remove one item, returning it.
    async fn delete(&self, id: &ItemId) -> Result<Option<ShoppingItem>, RepositoryError>;

    /// Remove every item, returning how many were removed.
    async fn delete_all(&self) -> Result<u64, RepositoryError>;
}

/// Storage for Shopify access tokens, keyed by shop domain.
#[async_trait]
pub trait ShopSessionRepository: Send + Sync {
    async fn get(&self, shop: &ShopDomain) -> Result<Option<ShopSession>, RepositoryError>;

    /// Insert or replace the token for `shop`.
    async fn upsert(
        &self,
        shop: &ShopDomain,
        access_token: &SecretString,
    ) -> Result<ShopSession, RepositoryError>;

    /// All sessions ordered by shop domain.
    async fn list(&self) -> Result<Vec<ShopSession>, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Apply pending migrations from `crates/server/migrations/`.
///
/// # Errors
///
/// Returns `sqlx::migrate::MigrateError` if a migration fails to apply.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Map CHECK constraint violations to [`RepositoryError::Conflict`].
fn map_constraint(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.is_check_violation()
    {
        return RepositoryError::Conflict(db_err.message().to_string());
    }
    RepositoryError::Database(err)
}

#[cfg(test)]
mod tests {
    use shopping_list_core::ItemLimits;

    const ITEMS_MIGRATION: &str = include_str!("../../migrations/20260301000001_create_shopping_items.sql");

    #[test]
    fn test_migration_bounds_match_item_limits() {
        let limits = ItemLimits::SCHEMA;
        let name_check = format!("BETWEEN 1 AND {}", limits.name_max_length());
        let quantity_check = format!(
            "BETWEEN {} AND {}",
            limits.quantity_min(),
            limits.quantity_max()
        );

        assert!(ITEMS_MIGRATION.contains(&name_check), "missing `{name_check}`");
        assert!(
            ITEMS_MIGRATION.contains(&quantity_check),
            "missing `{quantity_check}`"
        );
        assert!(ITEMS_MIGRATION.contains(&format!("VARCHAR({})", limits.name_max_length())));
    }
}
