//! `PostgreSQL` storage for shopping items.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shopping_list_core::{ItemId, ItemUpdate, NewItem, ShoppingItem};
use sqlx::PgPool;

use super::{ItemRepository, RepositoryError, map_constraint};

// =============================================================================
// Types
// =============================================================================

/// Internal row type for `PostgreSQL` queries.
#[derive(Debug, sqlx::FromRow)]
struct ShoppingItemRow {
    id: String,
    name: String,
    quantity: i32,
    bought: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ShoppingItemRow> for ShoppingItem {
    type Error = RepositoryError;

    fn try_from(row: ShoppingItemRow) -> Result<Self, Self::Error> {
        let id = ItemId::parse(&row.id).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid item id '{}': {e}", row.id))
        })?;

        Ok(Self {
            id,
            name: row.name,
            quantity: row.quantity,
            bought: row.bought,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const ITEM_COLUMNS: &str = "id, name, quantity, bought, created_at, updated_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for shopping item database operations.
#[derive(Clone)]
pub struct PgItemRepository {
    pool: PgPool,
}

impl PgItemRepository {
    /// Create a new item repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemRepository for PgItemRepository {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ShoppingItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, ShoppingItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM shopping_items ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ShoppingItem::try_from).collect()
    }

    async fn create(&self, item: &NewItem) -> Result<ShoppingItem, RepositoryError> {
        let id = ItemId::generate();

        let row = sqlx::query_as::<_, ShoppingItemRow>(&format!(
            "INSERT INTO shopping_items (id, name, quantity, bought)
             VALUES ($1, $2, $3, FALSE)
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(&id)
        .bind(&item.name)
        .bind(item.quantity)
        .fetch_one(&self.pool)
        .await
        .map_err(map_constraint)?;

        ShoppingItem::try_from(row)
    }

    async fn update(
        &self,
        id: &ItemId,
        update: &ItemUpdate,
    ) -> Result<Option<ShoppingItem>, RepositoryError> {
        let row = sqlx::query_as::<_, ShoppingItemRow>(&format!(
            "UPDATE shopping_items
             SET bought = COALESCE($2, bought),
                 quantity = COALESCE($3, quantity),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(id)
        .bind(update.bought)
        .bind(update.quantity)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_constraint)?;

        row.map(ShoppingItem::try_from).transpose()
    }

    async fn delete(&self, id: &ItemId) -> Result<Option<ShoppingItem>, RepositoryError> {
        let row = sqlx::query_as::<_, ShoppingItemRow>(&format!(
            "DELETE FROM shopping_items WHERE id = $1 RETURNING {ITEM_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ShoppingItem::try_from).transpose()
    }

    async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM shopping_items")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
