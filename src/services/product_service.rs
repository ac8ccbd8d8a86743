use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::auth::Caller;
use crate::models::{AttributeId, ListOptions, ListQuery, Product, ProductInput};
use crate::store::{DocumentStore, StoreError};

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("admin rights required")]
    Unauthorized,

    #[error("{0}")]
    InvalidArgument(String),

    #[error("invalid product input")]
    Validation(HashMap<String, String>),

    #[error("product {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Product operations on top of a document store.
///
/// Mutations check the caller's admin flag first, then their arguments, and
/// only then issue exactly one store call. None of them verify that the
/// product exists.
#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn DocumentStore>,
    max_list_limit: i64,
}

impl ProductService {
    pub fn new(store: Arc<dyn DocumentStore>, max_list_limit: i64) -> Self {
        Self {
            store,
            max_list_limit: max_list_limit.max(0),
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    fn require_admin(caller: &Caller, action: &str) -> Result<(), ProductError> {
        if caller.is_admin {
            Ok(())
        } else {
            warn!("Rejected {} by non-admin user '{}'", action, caller.id);
            Err(ProductError::Unauthorized)
        }
    }

    pub async fn create(&self, caller: &Caller, input: ProductInput) -> Result<Product, ProductError> {
        Self::require_admin(caller, "product create")?;
        input.validate().map_err(ProductError::Validation)?;

        let fields = input.into_fields(caller.id.as_str());
        let id = self.store.insert(fields.clone()).await?;

        info!("Product {} created by '{}'", id, caller.id);
        Ok(fields.into_product(id))
    }

    /// Overwrites name, description and picture. Ownership moves to the
    /// editing admin. Attributes are left as stored.
    pub async fn update(
        &self,
        caller: &Caller,
        product_id: &str,
        input: ProductInput,
    ) -> Result<Product, ProductError> {
        Self::require_admin(caller, "product update")?;
        input.validate().map_err(ProductError::Validation)?;

        let fields = input.into_fields(caller.id.as_str());
        self.store.set_fields(product_id, fields.clone()).await?;

        info!("Product {} updated by '{}'", product_id, caller.id);
        Ok(fields.into_product(product_id.to_string()))
    }

    pub async fn set_attribute_value(
        &self,
        caller: &Caller,
        product_id: &str,
        attribute_id: AttributeId,
        new_value: &str,
    ) -> Result<(), ProductError> {
        Self::require_admin(caller, "attribute update")?;
        if new_value.is_empty() {
            return Err(ProductError::InvalidArgument("New value cannot be empty.".to_string()));
        }

        self.store
            .set_attribute_value(product_id, attribute_id, new_value)
            .await?;

        info!("Attribute {} of product {} set by '{}'", attribute_id, product_id, caller.id);
        Ok(())
    }

    /// Removes only the `value` field; the attribute entry stays behind
    pub async fn clear_attribute_value(
        &self,
        caller: &Caller,
        product_id: &str,
        attribute_id: AttributeId,
    ) -> Result<(), ProductError> {
        Self::require_admin(caller, "attribute clear")?;

        self.store.unset_attribute_value(product_id, attribute_id).await?;

        info!("Attribute {} of product {} cleared by '{}'", attribute_id, product_id, caller.id);
        Ok(())
    }

    pub async fn delete(&self, caller: &Caller, product_id: &str) -> Result<(), ProductError> {
        Self::require_admin(caller, "product delete")?;

        self.store.delete(product_id).await?;

        info!("Product {} deleted by '{}'", product_id, caller.id);
        Ok(())
    }

    pub async fn get(&self, _caller: &Caller, product_id: &str) -> Result<Product, ProductError> {
        self.store
            .get(product_id)
            .await?
            .ok_or_else(|| ProductError::NotFound(product_id.to_string()))
    }

    /// Reject malformed `f`/`so` parameters before touching the store
    pub async fn list(&self, _caller: &Caller, query: &ListQuery) -> Result<Vec<Product>, ProductError> {
        let options = ListOptions::from_query(query, self.max_list_limit)
            .map_err(|e| ProductError::InvalidArgument(e.to_string()))?;
        Ok(self.store.list(&options).await?)
    }
}
