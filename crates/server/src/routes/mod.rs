//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health               - Liveness check
//! GET    /health/ready         - Readiness check (storage reachable)
//!
//! # Items
//! GET    /items                - List items, newest first
//! POST   /items                - Create item
//! DELETE /items/clear          - Delete all items
//! PUT    /items/{id}           - Update bought and/or quantity
//! DELETE /items/{id}           - Delete item
//!
//! # Shopify (only when SHOPIFY_API_KEY and SHOPIFY_API_SECRET are set)
//! GET    /shopify/auth         - Redirect to Shopify to install the app
//! GET    /shopify/callback     - OAuth callback, stores the access token
//! GET    /shopify/products     - First page of products for an installed shop
//! ```

pub mod health;
pub mod items;
pub mod shopify;

use axum::Router;

use crate::state::AppState;

/// Build the application router.
///
/// The `/shopify` routes are only mounted when `shopify_enabled` is true.
pub fn routes(shopify_enabled: bool) -> Router<AppState> {
    let router = Router::new()
        .merge(health::router())
        .merge(items::router());

    if shopify_enabled {
        router.merge(shopify::router())
    } else {
        router
    }
}
