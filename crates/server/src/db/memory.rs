//! In-memory repositories.
//!
//! Used by tests and by anyone running the API without `PostgreSQL`. They
//! enforce the same bounds as the schema's CHECK constraints.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use secrecy::SecretString;
use shopping_list_core::{ItemId, ItemLimits, ItemUpdate, NewItem, ShopDomain, ShoppingItem};
use tokio::sync::RwLock;

use super::{ItemRepository, RepositoryError, ShopSession, ShopSessionRepository};

// =============================================================================
// Items
// =============================================================================

/// Item storage backed by a `Vec`, oldest first.
#[derive(Debug, Default)]
pub struct InMemoryItemRepository {
    items: RwLock<Vec<ShoppingItem>>,
}

impl InMemoryItemRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_schema(name: &str, quantity: i32) -> Result<(), RepositoryError> {
    let schema = ItemLimits::SCHEMA;
    if !schema.allows_name(name.trim()) {
        return Err(RepositoryError::Conflict(format!(
            "name length outside 1..={}",
            schema.name_max_length()
        )));
    }
    if !schema.allows_quantity(i64::from(quantity)) {
        return Err(RepositoryError::Conflict(format!(
            "quantity {quantity} outside {}..={}",
            schema.quantity_min(),
            schema.quantity_max()
        )));
    }
    Ok(())
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ShoppingItem>, RepositoryError> {
        let items = self.items.read().await;
        Ok(items.iter().rev().cloned().collect())
    }

    async fn create(&self, item: &NewItem) -> Result<ShoppingItem, RepositoryError> {
        check_schema(&item.name, item.quantity)?;

        let now = Utc::now();
        let created = ShoppingItem {
            id: ItemId::generate(),
            name: item.name.clone(),
            quantity: item.quantity,
            bought: false,
            created_at: now,
            updated_at: now,
        };

        self.items.write().await.push(created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        id: &ItemId,
        update: &ItemUpdate,
    ) -> Result<Option<ShoppingItem>, RepositoryError> {
        let mut items = self.items.write().await;
        let Some(item) = items.iter_mut().find(|item| &item.id == id) else {
            return Ok(None);
        };

        let quantity = update.quantity.unwrap_or(item.quantity);
        check_schema(&item.name, quantity)?;

        item.quantity = quantity;
        if let Some(bought) = update.bought {
            item.bought = bought;
        }
        item.updated_at = Utc::now();

        Ok(Some(item.clone()))
    }

    async fn delete(&self, id: &ItemId) -> Result<Option<ShoppingItem>, RepositoryError> {
        let mut items = self.items.write().await;
        let position = items.iter().position(|item| &item.id == id);
        Ok(position.map(|index| items.remove(index)))
    }

    async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let mut items = self.items.write().await;
        let count = items.len() as u64;
        items.clear();
        Ok(count)
    }
}

// =============================================================================
// Shop sessions
// =============================================================================

/// Shop session storage backed by a `BTreeMap`.
#[derive(Debug, Default)]
pub struct InMemoryShopSessionRepository {
    sessions: RwLock<BTreeMap<ShopDomain, ShopSession>>,
}

impl InMemoryShopSessionRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ShopSessionRepository for InMemoryShopSessionRepository {
    async fn get(&self, shop: &ShopDomain) -> Result<Option<ShopSession>, RepositoryError> {
        Ok(self.sessions.read().await.get(shop).cloned())
    }

    async fn upsert(
        &self,
        shop: &ShopDomain,
        access_token: &SecretString,
    ) -> Result<ShopSession, RepositoryError> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;

        let session = sessions
            .entry(shop.clone())
            .and_modify(|session| {
                session.access_token = access_token.clone();
                session.updated_at = now;
            })
            .or_insert_with(|| ShopSession {
                shop: shop.clone(),
                access_token: access_token.clone(),
                created_at: now,
                updated_at: now,
            });

        Ok(session.clone())
    }

    async fn list(&self) -> Result<Vec<ShopSession>, RepositoryError> {
        Ok(self.sessions.read().await.values().cloned().collect())
    }
}
