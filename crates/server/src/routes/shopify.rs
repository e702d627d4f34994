//! Shopify app install routes.

use std::collections::BTreeMap;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::AppError;
use crate::shopify::{InstallFlow, InstallState};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/shopify/auth", get(auth))
        .route("/shopify/callback", get(callback))
        .route("/shopify/products", get(products))
}

#[derive(Debug, Deserialize)]
pub struct ShopQuery {
    pub shop: Option<String>,
}

/// `302 Found` to `location`.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

fn install_flow(state: &AppState) -> Result<InstallFlow<'_>, AppError> {
    state
        .install_flow()
        .ok_or_else(|| AppError::Internal("Shopify is not configured".to_string()))
}

/// GET /shopify/auth?shop= - Send the merchant to Shopify's install page.
#[instrument(skip(state))]
async fn auth(
    State(state): State<AppState>,
    Query(query): Query<ShopQuery>,
) -> Result<Response, AppError> {
    let flow = install_flow(&state)?;
    let authorization = flow.authorize(query.shop.as_deref())?;

    match flow.status(Some(authorization.shop.as_str())).await {
        Ok(InstallState::Installed { shop }) => {
            tracing::info!(shop = %shop, "Shop already installed, reinstalling");
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(shop = %authorization.shop, error = %e, "Could not read install state"),
    }
    if let InstallState::Pending { state_token } = &authorization.state {
        tracing::debug!(shop = %authorization.shop, state = %state_token, "Install pending");
    }

    Ok(found(&authorization.url))
}

/// GET /shopify/callback - Verify, exchange the code, store the token.
#[instrument(skip_all)]
async fn callback(
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Response, AppError> {
    let flow = install_flow(&state)?;

    let shop = flow.complete(&params).await?;
    Ok(found(&flow.post_install_redirect(&shop)))
}

/// GET /shopify/products?shop= - First page of products for an installed shop.
#[instrument(skip(state))]
async fn products(
    State(state): State<AppState>,
    Query(query): Query<ShopQuery>,
) -> Result<Json<Value>, AppError> {
    let products = install_flow(&state)?
        .products(query.shop.as_deref())
        .await?;

    Ok(Json(json!({ "products": products })))
}
