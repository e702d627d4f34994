//! Unified error handling for the shopping list API.
//!
//! Every error renders as `{ "error": <message>, "code": <CODE> }`. Shopify
//! failures add `shopifyStatus` (and `shopifyBody` for Admin API calls).

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};
use shopping_list_core::ValidationError;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::shopify::InstallError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request body or path failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Request body is not valid JSON.
    #[error("Invalid JSON body: {0}")]
    InvalidBody(String),

    /// Item does not exist.
    #[error("Item not found")]
    ItemNotFound,

    /// Shopify install flow failed.
    #[error(transparent)]
    Install(#[from] InstallError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::ItemNotFound => StatusCode::NOT_FOUND,
            Self::Install(err) => match err {
                InstallError::MissingShop
                | InstallError::InvalidShop(_)
                | InstallError::InvalidHmac
                | InstallError::MissingParams => StatusCode::BAD_REQUEST,
                InstallError::NotInstalled(_) => StatusCode::NOT_FOUND,
                InstallError::TokenExchange(_) | InstallError::Upstream(_) => {
                    StatusCode::BAD_GATEWAY
                }
                InstallError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(err) => err.code(),
            Self::InvalidBody(_) => "INVALID_BODY",
            Self::ItemNotFound => "NOT_FOUND",
            Self::Install(err) => err.code(),
            Self::Database(_) | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Failures on our side or Shopify's, reported to Sentry.
    const fn is_server_error(&self) -> bool {
        self.is_internal()
            || matches!(
                self,
                Self::Install(InstallError::TokenExchange(_) | InstallError::Upstream(_))
            )
    }

    /// Failures whose details never leave the process.
    const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Internal(_) | Self::Install(InstallError::Repository(_))
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let message = if self.is_internal() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let mut body = Map::new();
        body.insert("error".to_string(), Value::String(message));
        body.insert("code".to_string(), json!(self.code()));

        if let Self::Install(InstallError::TokenExchange(err) | InstallError::Upstream(err)) =
            &self
        {
            if let Some(shopify_status) = err.status() {
                body.insert("shopifyStatus".to_string(), json!(shopify_status));
            }
            if let Some(shopify_body) = err.body() {
                body.insert("shopifyBody".to_string(), json!(shopify_body));
            }
        }

        (status, Json(Value::Object(body))).into_response()
    }
}
