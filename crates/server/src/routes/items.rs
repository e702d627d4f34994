//! Shopping item CRUD routes.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{delete, get, put},
};
use serde_json::{Value, json};
use shopping_list_core::{ShoppingItem, validate_create, validate_id, validate_update};
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/clear", delete(clear_items))
        .route("/items/{id}", put(update_item).delete(delete_item))
}

/// Unwrap a JSON body, mapping malformed input to `INVALID_BODY`.
fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::InvalidBody(rejection.body_text()))
}

/// GET /items - All items, newest first.
#[instrument(skip(state))]
async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<ShoppingItem>>, AppError> {
    let items = state.items().list().await?;
    Ok(Json(items))
}

/// POST /items - Create an item from `{name, quantity?}`.
#[instrument(skip(state, payload))]
async fn create_item(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<ShoppingItem>), AppError> {
    let payload = json_body(payload)?;
    let new_item = validate_create(&payload, state.item_limits())?;

    let item = state.items().create(&new_item).await?;
    tracing::info!(item_id = %item.id, "Item created");

    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /items/{id} - Update `bought` and/or `quantity`.
#[instrument(skip(state, payload))]
async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ShoppingItem>, AppError> {
    let id = validate_id(&id)?;
    let payload = json_body(payload)?;
    let update = validate_update(&payload, state.item_limits())?;

    let item = state
        .items()
        .update(&id, &update)
        .await?
        .ok_or(AppError::ItemNotFound)?;

    Ok(Json(item))
}

/// DELETE /items/{id} - Delete one item.
#[instrument(skip(state))]
async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = validate_id(&id)?;

    let item = state
        .items()
        .delete(&id)
        .await?
        .ok_or(AppError::ItemNotFound)?;
    tracing::info!(item_id = %item.id, "Item deleted");

    Ok(Json(json!({
        "message": "Item deleted successfully",
        "item": item,
    })))
}

/// DELETE /items/clear - Delete every item.
#[instrument(skip(state))]
async fn clear_items(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let deleted_count = state.items().delete_all().await?;
    tracing::info!(deleted_count, "All items deleted");

    Ok(Json(json!({
        "message": "All items deleted successfully",
        "deletedCount": deleted_count,
    })))
}
