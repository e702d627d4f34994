//! Integration tests for the shopping list server.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopping-list-integration-tests
//! ```
//!
//! The full router is driven in-process with `tower::ServiceExt::oneshot`,
//! backed by the in-memory repositories. Shopify is replaced by a
//! `wiremock` server through `SHOPIFY_API_ORIGIN`, so no database or network
//! access is needed.
//!
//! # Test Categories
//!
//! - `items_api` - Shopping item CRUD and validation
//! - `shopify_oauth` - Install flow, callback verification, product lookup

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::Value;
use shopping_list_server::db::{InMemoryItemRepository, InMemoryShopSessionRepository};
use shopping_list_server::shopify::hmac::sign_query;
use shopping_list_server::{AppState, ServerConfig, build_app};
use tower::ServiceExt;

/// Shopify app secret used by every test app.
pub const TEST_API_SECRET: &str = "9f86d081884c7d659a2feaa0c55ad015";

/// Shopify app client id used by every test app.
pub const TEST_API_KEY: &str = "test-client-id";

/// A router plus direct handles on its storage.
pub struct TestApp {
    router: Router,
    pub items: Arc<InMemoryItemRepository>,
    pub sessions: Arc<InMemoryShopSessionRepository>,
}

/// A buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    /// Parsed JSON body, `Value::Null` when the body is empty.
    pub body: Value,
}

impl TestApp {
    /// An app without Shopify credentials.
    #[must_use]
    pub fn new() -> Self {
        Self::from_vars(&[])
    }

    /// An app whose Shopify calls go to `api_origin`.
    #[must_use]
    pub fn with_shopify(api_origin: &str, frontend_url: Option<&str>) -> Self {
        let mut vars = vec![
            ("SHOPIFY_API_KEY", TEST_API_KEY),
            ("SHOPIFY_API_SECRET", TEST_API_SECRET),
            ("SHOPIFY_API_ORIGIN", api_origin),
            ("SHOPIFY_HTTP_TIMEOUT_SECS", "2"),
        ];
        if let Some(frontend_url) = frontend_url {
            vars.push(("FRONTEND_URL", frontend_url));
        }
        Self::from_vars(&vars)
    }

    /// An app configured from `vars` (a database URL is always supplied).
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid.
    #[must_use]
    pub fn from_vars(vars: &[(&str, &str)]) -> Self {
        let mut env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        env.insert(
            "DATABASE_URL".to_string(),
            "postgres://localhost/unused".to_string(),
        );

        let config = ServerConfig::from_lookup(&|key| env.get(key).cloned())
            .expect("test configuration is valid");

        let items = Arc::new(InMemoryItemRepository::new());
        let sessions = Arc::new(InMemoryShopSessionRepository::new());
        let state = AppState::new(config, items.clone(), sessions.clone())
            .expect("application state builds");

        Self {
            router: build_app(state),
            items,
            sessions,
        }
    }

    /// Send a request, with `body` encoded as JSON when present.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn request(&self, method: Method, uri: &str, body: Option<&Value>) -> TestResponse {
        let request = match body {
            Some(body) => Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => Request::builder().method(method).uri(uri).body(Body::empty()),
        }
        .expect("request builds");

        self.send(request).await
    }

    /// Send a request with a raw JSON-typed body (for malformed payloads).
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn request_raw(&self, method: Method, uri: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds");

        self.send(request).await
    }

    /// Convenience for `GET`.
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body is readable");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body is JSON")
        };

        TestResponse {
            status,
            location,
            body,
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a callback query string signed the way Shopify signs it.
///
/// # Panics
///
/// Panics if signing fails.
#[must_use]
pub fn signed_callback_query(params: &[(&str, &str)]) -> String {
    let params: BTreeMap<String, String> = params
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    let hmac = sign_query(&params, TEST_API_SECRET).expect("HMAC signs");

    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in &params {
        query.append_pair(key, value);
    }
    query.append_pair("hmac", &hmac);
    query.finish()
}
