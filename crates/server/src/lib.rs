//! Shopping list JSON API with a Shopify app install flow.
//!
//! The binary in `main.rs` wires configuration, logging and `PostgreSQL`
//! together; everything else lives here so the CLI and the integration
//! tests can build the same router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod shopify;
pub mod state;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

pub use config::{ConfigError, ServerConfig, ShopifyAppConfig};
pub use error::AppError;
pub use state::AppState;

/// Build the full application: routes, tracing, CORS and Sentry layers.
pub fn build_app(state: AppState) -> Router {
    let shopify_enabled = state.config().shopify.is_some();
    let cors = cors_layer(state.config().cors_origin.as_deref());

    routes::routes(shopify_enabled)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri().path(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record("latency_ms", latency.as_millis() as u64);
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Allow any origin unless one is configured.
fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let allow_origin = match origin {
        None => AllowOrigin::any(),
        Some(origin) => match HeaderValue::from_str(origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(e) => {
                tracing::warn!(origin, error = %e, "Ignoring invalid CORS origin; cross-origin requests will be refused");
                AllowOrigin::list(Vec::<HeaderValue>::new())
            }
        },
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}
