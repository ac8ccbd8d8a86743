use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

/// GET / - service description
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Product API",
        "version": version,
        "endpoints": {
            "health": "GET /health (public)",
            "products": "GET|POST /product (authenticated, POST admin only)",
            "product": "GET|PUT|DELETE /product/:productId (authenticated, PUT/DELETE admin only)",
            "attribute": "PUT|DELETE /product/:productId/attribute/:attributeId (admin only)",
        }
    }))
}

/// GET /health - store connectivity check
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    if let Err(e) = state.products.store().ping().await {
        tracing::warn!("Health check failed: {}", e);
        return Err(ApiError::service_unavailable("Product store is unavailable"));
    }

    Ok(Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "store": "ok"
    })))
}
