//! Shopify shop commands.

use shopping_list_server::db::{PgShopSessionRepository, ShopSessionRepository};

use super::CommandError;

/// Print every installed shop with its install and last update time.
///
/// Access tokens are never printed.
pub async fn list() -> Result<(), CommandError> {
    let pool = super::connect().await?;
    let sessions = PgShopSessionRepository::new(pool).list().await?;

    if sessions.is_empty() {
        tracing::info!("No shops installed");
        return Ok(());
    }

    #[allow(clippy::print_stdout)]
    for session in &sessions {
        println!(
            "{}\tinstalled {}\tupdated {}",
            session.shop,
            session.created_at.to_rfc3339(),
            session.updated_at.to_rfc3339()
        );
    }

    Ok(())
}
