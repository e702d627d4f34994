//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! sl-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPPING_LIST_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Migrations live in `crates/server/migrations/`:
//! ```text
//! migrations/
//! ├── 20260301000001_create_shopping_items.sql
//! └── 20260301000002_create_shop_sessions.sql
//! ```

use super::CommandError;

/// Run all pending migrations.
pub async fn run() -> Result<(), CommandError> {
    let pool = super::connect().await?;

    tracing::info!("Running migrations...");
    shopping_list_server::db::run_migrations(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
