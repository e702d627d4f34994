//! Application state shared across handlers.

use std::sync::Arc;

use shopping_list_core::ItemLimits;

use crate::config::ServerConfig;
use crate::db::{ItemRepository, ShopSessionRepository};
use crate::shopify::{InstallFlow, ShopifyClient, ShopifyError};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Repositories are injected as
/// trait objects so tests can swap in the in-memory implementations.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    items: Arc<dyn ItemRepository>,
    sessions: Arc<dyn ShopSessionRepository>,
    shopify: Option<ShopifyClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `items` - Shopping item storage
    /// * `sessions` - Shopify session storage
    ///
    /// # Errors
    ///
    /// Returns an error if the Shopify HTTP client cannot be built.
    pub fn new(
        config: ServerConfig,
        items: Arc<dyn ItemRepository>,
        sessions: Arc<dyn ShopSessionRepository>,
    ) -> Result<Self, ShopifyError> {
        let shopify = config.shopify.as_ref().map(ShopifyClient::new).transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                items,
                sessions,
                shopify,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Bounds for item validation.
    #[must_use]
    pub fn item_limits(&self) -> &ItemLimits {
        &self.inner.config.item_limits
    }

    /// Get the shopping item repository.
    #[must_use]
    pub fn items(&self) -> &dyn ItemRepository {
        self.inner.items.as_ref()
    }

    /// Get the Shopify session repository.
    #[must_use]
    pub fn sessions(&self) -> &dyn ShopSessionRepository {
        self.inner.sessions.as_ref()
    }

    /// The install flow, if Shopify is configured.
    #[must_use]
    pub fn install_flow(&self) -> Option<InstallFlow<'_>> {
        let client = self.inner.shopify.as_ref()?;
        let frontend_url = self
            .inner
            .config
            .shopify
            .as_ref()
            .and_then(|shopify| shopify.frontend_url.as_deref());

        Some(InstallFlow::new(client, self.sessions(), frontend_url))
    }
}
