//! Shopify app install flow.
//!
//! - [`hmac`] signs and verifies OAuth callback query strings
//! - [`client`] talks to a shop's OAuth and Admin REST endpoints
//! - [`install`] ties both to the session store

pub mod client;
pub mod hmac;
pub mod install;

use thiserror::Error;

pub use client::ShopifyClient;
pub use install::{Authorization, InstallError, InstallFlow, InstallState};

/// Maximum number of characters of an upstream error body kept for callers.
pub const UPSTREAM_BODY_LIMIT: usize = 500;

/// Errors that can occur when talking to Shopify.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed (connect error, timeout, undecodable body).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The access token endpoint answered with a non-success status.
    #[error("Token exchange rejected with status {status}")]
    TokenExchange { status: u16 },

    /// An Admin API call answered with a non-success status.
    #[error("Shopify API returned status {status}")]
    Upstream { status: u16, body: String },
}

impl ShopifyError {
    /// HTTP status reported by Shopify, when a response was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(err) => err.status().map(|status| status.as_u16()),
            Self::TokenExchange { status } | Self::Upstream { status, .. } => Some(*status),
        }
    }

    /// Truncated upstream body, for Admin API failures.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Upstream { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Keep at most [`UPSTREAM_BODY_LIMIT`] characters of `body`.
pub(crate) fn truncate_body(body: &str) -> String {
    body.chars().take(UPSTREAM_BODY_LIMIT).collect()
}
