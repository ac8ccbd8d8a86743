use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use crate::auth::Caller;
use crate::error::ApiError;
use crate::models::{AttributeId, ListQuery, Product, ProductInput};
use crate::state::AppState;

/// POST /product - create a product (admin)
pub async fn create(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<ProductInput>,
) -> Result<Json<Product>, ApiError> {
    let product = state.products.create(&caller, input).await?;
    Ok(Json(product))
}

/// PUT /product/:product_id - overwrite name, description and picture (admin)
pub async fn update(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    Extension(caller): Extension<Caller>,
    Json(input): Json<ProductInput>,
) -> Result<Json<Product>, ApiError> {
    let product = state.products.update(&caller, &product_id, input).await?;
    Ok(Json(product))
}

/// DELETE /product/:product_id (admin)
pub async fn delete(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    Extension(caller): Extension<Caller>,
) -> Result<StatusCode, ApiError> {
    state.products.delete(&caller, &product_id).await?;
    Ok(StatusCode::OK)
}

/// GET /product/:product_id
pub async fn get(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Product>, ApiError> {
    let product = state.products.get(&caller, &product_id).await?;
    Ok(Json(product))
}

/// GET /product?limit=&offset=&f=&so=
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.products.list(&caller, &query).await?;
    Ok(Json(products))
}

/// PUT /product/:product_id/attribute/:attribute_id - body is the raw new value (admin)
pub async fn attribute_put(
    State(state): State<AppState>,
    Path((product_id, attribute_id)): Path<(String, AttributeId)>,
    Extension(caller): Extension<Caller>,
    new_value: String,
) -> Result<StatusCode, ApiError> {
    state
        .products
        .set_attribute_value(&caller, &product_id, attribute_id, &new_value)
        .await?;
    Ok(StatusCode::OK)
}

/// DELETE /product/:product_id/attribute/:attribute_id - clear the value, keep the entry (admin)
pub async fn attribute_delete(
    State(state): State<AppState>,
    Path((product_id, attribute_id)): Path<(String, AttributeId)>,
    Extension(caller): Extension<Caller>,
) -> Result<StatusCode, ApiError> {
    state
        .products
        .clear_attribute_value(&caller, &product_id, attribute_id)
        .await?;
    Ok(StatusCode::OK)
}
