//! The Shopify install flow: authorize, callback, and product lookup.
//!
//! A shop moves through [`InstallState`]: `Uninstalled`, then `Pending` once
//! the merchant is sent to Shopify, then `Installed` once the callback has
//! stored an access token. Only `Installed` is persisted.

use std::collections::BTreeMap;

use rand::RngCore;
use secrecy::ExposeSecret;
use serde_json::Value;
use shopping_list_core::{ShopDomain, ShopDomainError};
use thiserror::Error;

use super::{ShopifyClient, ShopifyError, hmac};
use crate::db::{RepositoryError, ShopSessionRepository};

/// Number of random bytes in an OAuth state token.
const STATE_TOKEN_BYTES: usize = 16;

/// Install progress for one shop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallState {
    /// No access token is stored for the shop.
    Uninstalled,
    /// The merchant was sent to Shopify with `state_token`.
    ///
    /// The token is not stored, so the callback cannot check it.
    Pending { state_token: String },
    /// An access token is stored for `shop`.
    Installed { shop: ShopDomain },
}

/// Result of [`InstallFlow::authorize`].
#[derive(Debug, Clone)]
pub struct Authorization {
    pub shop: ShopDomain,
    pub state: InstallState,
    /// Shopify authorization URL to redirect the merchant to.
    pub url: String,
}

/// Errors produced by the install flow.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("Query parameter \"shop\" is required (e.g. your-shop.myshopify.com)")]
    MissingShop,

    #[error("Invalid shop: {0}")]
    InvalidShop(#[from] ShopDomainError),

    #[error("Invalid HMAC")]
    InvalidHmac,

    #[error("Missing code or shop")]
    MissingParams,

    #[error("Token exchange failed")]
    TokenExchange(#[source] ShopifyError),

    #[error("Shop not installed. Call /shopify/auth?shop={0} first.")]
    NotInstalled(ShopDomain),

    #[error("Shopify API request failed")]
    Upstream(#[source] ShopifyError),

    #[error("Session storage failed: {0}")]
    Repository(#[from] RepositoryError),
}

impl InstallError {
    /// Stable machine-readable code for API responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingShop => "MISSING_SHOP",
            Self::InvalidShop(_) => "INVALID_SHOP",
            Self::InvalidHmac => "INVALID_HMAC",
            Self::MissingParams => "MISSING_PARAMS",
            Self::TokenExchange(_) => "TOKEN_EXCHANGE_FAILED",
            Self::NotInstalled(_) => "NOT_INSTALLED",
            Self::Upstream(_) => "UPSTREAM_ERROR",
            Self::Repository(_) => "INTERNAL_ERROR",
        }
    }
}

/// The install flow for one request.
pub struct InstallFlow<'a> {
    client: &'a ShopifyClient,
    sessions: &'a dyn ShopSessionRepository,
    frontend_url: Option<&'a str>,
}

impl<'a> InstallFlow<'a> {
    #[must_use]
    pub const fn new(
        client: &'a ShopifyClient,
        sessions: &'a dyn ShopSessionRepository,
        frontend_url: Option<&'a str>,
    ) -> Self {
        Self {
            client,
            sessions,
            frontend_url,
        }
    }

    /// Start an install: pick a state token and build the authorization URL.
    ///
    /// # Errors
    ///
    /// Returns `MissingShop` or `InvalidShop` for a bad `shop` parameter.
    pub fn authorize(&self, shop: Option<&str>) -> Result<Authorization, InstallError> {
        let shop = parse_shop(shop)?;

        let mut bytes = [0u8; STATE_TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        let state_token = hex::encode(bytes);

        let url = self.client.authorization_url(&shop, &state_token);
        tracing::info!(shop = %shop, "Redirecting to Shopify authorization");

        Ok(Authorization {
            shop,
            state: InstallState::Pending { state_token },
            url,
        })
    }

    /// Finish an install from the callback query parameters.
    ///
    /// Verifies the signature, exchanges the code, and stores the token,
    /// moving the shop to [`InstallState::Installed`]. Nothing is stored
    /// unless every step succeeds.
    ///
    /// # Errors
    ///
    /// - `InvalidHmac` if the signature is missing or wrong
    /// - `MissingParams` if `code` or `shop` is missing
    /// - `TokenExchange` if Shopify rejects the code or cannot be reached
    /// - `Repository` if the session cannot be stored
    pub async fn complete(
        &self,
        params: &BTreeMap<String, String>,
    ) -> Result<ShopDomain, InstallError> {
        if !hmac::verify_query(params, self.client.client_secret().expose_secret()) {
            tracing::warn!("Rejected Shopify callback with invalid HMAC");
            return Err(InstallError::InvalidHmac);
        }

        let code = non_empty(params.get("code"));
        let shop = non_empty(params.get("shop"));
        let (Some(code), Some(shop)) = (code, shop) else {
            return Err(InstallError::MissingParams);
        };
        let shop = ShopDomain::normalize(shop)?;

        if params.contains_key("state") {
            tracing::debug!(shop = %shop, "OAuth state parameter is not verified");
        }

        let access_token = self
            .client
            .exchange_code(&shop, code)
            .await
            .map_err(|e| {
                tracing::error!(shop = %shop, status = ?e.status(), error = %e, "Shopify token exchange failed");
                InstallError::TokenExchange(e)
            })?;

        self.sessions.upsert(&shop, &access_token).await?;
        tracing::info!(shop = %shop, "Shopify app installed");

        Ok(shop)
    }

    /// Where to send the merchant after a successful install.
    #[must_use]
    pub fn post_install_redirect(&self, shop: &ShopDomain) -> String {
        let query = format!("shop={}&installed=1", urlencoding::encode(shop.as_str()));
        match self.frontend_url.map(str::trim).filter(|url| !url.is_empty()) {
            Some(frontend) => format!("{}/app?{query}", frontend.trim_end_matches('/')),
            None => format!("/?{query}"),
        }
    }

    /// Current install state of a shop.
    ///
    /// # Errors
    ///
    /// Returns `MissingShop`, `InvalidShop` or `Repository`.
    pub async fn status(&self, shop: Option<&str>) -> Result<InstallState, InstallError> {
        let shop = parse_shop(shop)?;
        Ok(match self.sessions.get(&shop).await? {
            Some(session) => InstallState::Installed { shop: session.shop },
            None => InstallState::Uninstalled,
        })
    }

    /// First page of products for an installed shop.
    ///
    /// # Errors
    ///
    /// - `MissingShop` / `InvalidShop` for a bad `shop` parameter
    /// - `NotInstalled` if no token is stored (Shopify is not contacted)
    /// - `Upstream` if the Admin API call fails
    pub async fn products(&self, shop: Option<&str>) -> Result<Vec<Value>, InstallError> {
        let shop = parse_shop(shop)?;

        let Some(session) = self.sessions.get(&shop).await? else {
            return Err(InstallError::NotInstalled(shop));
        };

        self.client
            .get_products(&session.shop, &session.access_token)
            .await
            .map_err(|e| {
                tracing::error!(shop = %shop, status = ?e.status(), error = %e, "Shopify API error");
                InstallError::Upstream(e)
            })
    }
}

/// The raw value, if it is present and not blank.
fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.trim().is_empty())
}

fn parse_shop(shop: Option<&str>) -> Result<ShopDomain, InstallError> {
    let shop = shop
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(InstallError::MissingShop)?;
    Ok(ShopDomain::normalize(shop)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;

    use super::*;
    use crate::config::ShopifyAppConfig;
    use crate::db::InMemoryShopSessionRepository;

    const SECRET: &str = "9f86d081884c7d659a2feaa0c55ad015";

    fn client() -> ShopifyClient {
        ShopifyClient::new(&ShopifyAppConfig {
            client_id: "test-client-id".to_string(),
            client_secret: SecretString::from(SECRET),
            scopes: "read_products,read_orders".to_string(),
            callback_url: "http://localhost:3001/shopify/callback".to_string(),
            frontend_url: None,
            api_version: "2025-01".to_string(),
            // Nothing listens here; tests below never reach the network
            api_origin: Some("http://127.0.0.1:9".to_string()),
            http_timeout: Duration::from_secs(1),
        })
        .unwrap()
    }

    #[test]
    fn test_authorize_returns_pending_state() {
        let client = client();
        let sessions = InMemoryShopSessionRepository::new();
        let flow = InstallFlow::new(&client, &sessions, None);

        let auth = flow.authorize(Some(" Test-Shop ")).unwrap();

        assert_eq!(auth.shop.as_str(), "test-shop.myshopify.com");
        let InstallState::Pending { state_token } = &auth.state else {
            panic!("expected pending state, got {:?}", auth.state);
        };
        assert_eq!(state_token.len(), STATE_TOKEN_BYTES * 2);
        assert!(state_token.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(
            auth.url
                .starts_with("https://test-shop.myshopify.com/admin/oauth/authorize?")
        );
        assert!(auth.url.ends_with(&format!("&state={state_token}")));
    }

    #[test]
    fn test_authorize_state_tokens_differ() {
        let client = client();
        let sessions = InMemoryShopSessionRepository::new();
        let flow = InstallFlow::new(&client, &sessions, None);

        let first = flow.authorize(Some("shop")).unwrap();
        let second = flow.authorize(Some("shop")).unwrap();
        assert_ne!(first.state, second.state);
    }

    #[test]
    fn test_authorize_rejects_bad_shop() {
        let client = client();
        let sessions = InMemoryShopSessionRepository::new();
        let flow = InstallFlow::new(&client, &sessions, None);

        assert!(matches!(flow.authorize(None), Err(InstallError::MissingShop)));
        assert!(matches!(
            flow.authorize(Some("  ")),
            Err(InstallError::MissingShop)
        ));
        let err = flow.authorize(Some("evil.com/")).unwrap_err();
        assert_eq!(err.code(), "INVALID_SHOP");
    }

    #[tokio::test]
    async fn test_complete_rejects_bad_hmac_before_anything_else() {
        let client = client();
        let sessions = InMemoryShopSessionRepository::new();
        let flow = InstallFlow::new(&client, &sessions, None);

        let params = BTreeMap::from([
            ("code".to_string(), "abc".to_string()),
            ("shop".to_string(), "test-shop.myshopify.com".to_string()),
            ("hmac".to_string(), "00".repeat(32)),
        ]);

        let err = flow.complete(&params).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_HMAC");
        assert!(sessions.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_complete_requires_code_and_shop() {
        let client = client();
        let sessions = InMemoryShopSessionRepository::new();
        let flow = InstallFlow::new(&client, &sessions, None);

        let mut params = BTreeMap::from([("shop".to_string(), "test-shop".to_string())]);
        params.insert("hmac".to_string(), hmac::sign_query(&params, SECRET).unwrap());

        let err = flow.complete(&params).await.unwrap_err();
        assert_eq!(err.code(), "MISSING_PARAMS");
        assert!(sessions.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_products_without_session_is_not_installed() {
        let client = client();
        let sessions = InMemoryShopSessionRepository::new();
        let flow = InstallFlow::new(&client, &sessions, None);

        let err = flow.products(Some("never-installed")).await.unwrap_err();
        assert_eq!(err.code(), "NOT_INSTALLED");
        assert_eq!(
            err.to_string(),
            "Shop not installed. Call /shopify/auth?shop=never-installed.myshopify.com first."
        );
    }

    #[tokio::test]
    async fn test_status() {
        let client = client();
        let sessions = InMemoryShopSessionRepository::new();
        let flow = InstallFlow::new(&client, &sessions, None);

        assert_eq!(
            flow.status(Some("test-shop")).await.unwrap(),
            InstallState::Uninstalled
        );

        let shop = ShopDomain::normalize("test-shop").unwrap();
        sessions
            .upsert(&shop, &SecretString::from("shpat_token"))
            .await
            .unwrap();

        assert_eq!(
            flow.status(Some("TEST-SHOP.myshopify.com")).await.unwrap(),
            InstallState::Installed { shop }
        );
    }

    #[test]
    fn test_post_install_redirect() {
        let client = client();
        let sessions = InMemoryShopSessionRepository::new();
        let shop = ShopDomain::normalize("test-shop").unwrap();

        let flow = InstallFlow::new(&client, &sessions, Some("https://app.example.com/"));
        assert_eq!(
            flow.post_install_redirect(&shop),
            "https://app.example.com/app?shop=test-shop.myshopify.com&installed=1"
        );

        let flow = InstallFlow::new(&client, &sessions, None);
        assert_eq!(
            flow.post_install_redirect(&shop),
            "/?shop=test-shop.myshopify.com&installed=1"
        );

        let flow = InstallFlow::new(&client, &sessions, Some("   "));
        assert_eq!(
            flow.post_install_redirect(&shop),
            "/?shop=test-shop.myshopify.com&installed=1"
        );
    }
}
