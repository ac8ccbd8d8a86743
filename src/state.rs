use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::ProductService;
use crate::store::DocumentStore;

/// Shared handler state; cheap to clone per request
#[derive(Clone)]
pub struct AppState {
    pub products: ProductService,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, config: &AppConfig) -> Self {
        Self {
            products: ProductService::new(store, config.api.max_list_limit),
            jwt_secret: Arc::from(config.security.jwt_secret.as_str()),
        }
    }
}
