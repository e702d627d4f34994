//! Shopping item maintenance commands.

use shopping_list_server::db::{ItemRepository, PgItemRepository};

use super::CommandError;

/// Delete every shopping item.
pub async fn clear() -> Result<(), CommandError> {
    let pool = super::connect().await?;
    let deleted = PgItemRepository::new(pool).delete_all().await?;

    tracing::info!(deleted, "All items deleted");
    Ok(())
}
