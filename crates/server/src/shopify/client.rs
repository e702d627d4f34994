//! HTTP client for a shop's OAuth and Admin REST endpoints.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use shopping_list_core::ShopDomain;

use super::{ShopifyError, truncate_body};
use crate::config::ShopifyAppConfig;

/// Header carrying the Admin API access token.
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Number of products returned by [`ShopifyClient::get_products`].
const PRODUCTS_LIMIT: u32 = 10;

/// Shopify OAuth and Admin REST API client.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct ShopifyClient {
    inner: Arc<ShopifyClientInner>,
}

struct ShopifyClientInner {
    client: reqwest::Client,
    client_id: String,
    client_secret: SecretString,
    scopes: String,
    callback_url: String,
    api_version: String,
    api_origin: Option<String>,
}

/// OAuth token response from Shopify.
#[derive(Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
}

/// Body of `GET /admin/api/<version>/products.json`.
#[derive(Deserialize)]
struct ProductsResponse {
    #[serde(default)]
    products: Vec<Value>,
}

impl ShopifyClient {
    /// Create a new client from the app configuration.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ShopifyAppConfig) -> Result<Self, ShopifyError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ShopifyClientInner {
                client,
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
                scopes: config.scopes.clone(),
                callback_url: config.callback_url.clone(),
                api_version: config.api_version.clone(),
                api_origin: config.api_origin.clone(),
            }),
        })
    }

    /// Get the client secret (for HMAC verification).
    #[must_use]
    pub fn client_secret(&self) -> &SecretString {
        &self.inner.client_secret
    }

    /// Base URL for requests to `shop`.
    fn shop_origin(&self, shop: &ShopDomain) -> String {
        self.inner
            .api_origin
            .clone()
            .unwrap_or_else(|| format!("https://{shop}"))
    }

    // =========================================================================
    // OAuth Flow
    // =========================================================================

    /// Generate the OAuth authorization URL.
    ///
    /// The merchant is redirected here to approve the install. The URL always
    /// points at the shop itself, never at `SHOPIFY_API_ORIGIN`.
    #[must_use]
    pub fn authorization_url(&self, shop: &ShopDomain, state: &str) -> String {
        format!(
            "https://{}/admin/oauth/authorize?client_id={}&scope={}&redirect_uri={}&state={}",
            shop,
            urlencoding::encode(&self.inner.client_id),
            urlencoding::encode(&self.inner.scopes),
            urlencoding::encode(&self.inner.callback_url),
            urlencoding::encode(state)
        )
    }

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::TokenExchange` if Shopify rejects the code.
    /// Returns `ShopifyError::Http` if the HTTP request fails or times out.
    pub async fn exchange_code(
        &self,
        shop: &ShopDomain,
        code: &str,
    ) -> Result<SecretString, ShopifyError> {
        let url = format!("{}/admin/oauth/access_token", self.shop_origin(shop));

        let params = [
            ("client_id", self.inner.client_id.as_str()),
            ("client_secret", self.inner.client_secret.expose_secret()),
            ("code", code),
        ];

        let response = self.inner.client.post(&url).form(&params).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ShopifyError::TokenExchange {
                status: status.as_u16(),
            });
        }

        let token: OAuthTokenResponse = response.json().await?;
        Ok(SecretString::from(token.access_token))
    }

    // =========================================================================
    // Admin REST API
    // =========================================================================

    /// Fetch the first page of products for an installed shop.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Upstream` with the status and the first
    /// [`UPSTREAM_BODY_LIMIT`](super::UPSTREAM_BODY_LIMIT) characters of the
    /// body if Shopify answers with a non-success status.
    /// Returns `ShopifyError::Http` if the HTTP request fails or times out.
    pub async fn get_products(
        &self,
        shop: &ShopDomain,
        access_token: &SecretString,
    ) -> Result<Vec<Value>, ShopifyError> {
        let url = format!(
            "{}/admin/api/{}/products.json?limit={PRODUCTS_LIMIT}",
            self.shop_origin(shop),
            self.inner.api_version
        );

        let response = self
            .inner
            .client
            .get(&url)
            .header(ACCESS_TOKEN_HEADER, access_token.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ShopifyError::Upstream {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let body: ProductsResponse = response.json().await?;
        Ok(body.products)
    }
}
