//! Product document storage.
//!
//! Every mutating method maps to exactly one atomic store call. Mutations on
//! ids that have no document are silent no-ops; only `get` reports absence.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{AttributeId, ListOptions, Product, ProductFields};

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("malformed product id: {0}")]
    MalformedId(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document and return the id the store generated for it
    async fn insert(&self, fields: ProductFields) -> Result<String, StoreError>;

    /// Overwrite the scalar fields of a document, leaving attributes alone
    async fn set_fields(&self, id: &str, fields: ProductFields) -> Result<(), StoreError>;

    /// Upsert `attributes[attribute_id].value`
    async fn set_attribute_value(
        &self,
        id: &str,
        attribute_id: AttributeId,
        value: &str,
    ) -> Result<(), StoreError>;

    /// Remove `attributes[attribute_id].value`, keeping the entry itself
    async fn unset_attribute_value(&self, id: &str, attribute_id: AttributeId) -> Result<(), StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Product>, StoreError>;

    /// Documents passing every filter, ordered by the sort keys and then by
    /// creation order, paged by `limit`/`offset`
    async fn list(&self, options: &ListOptions) -> Result<Vec<Product>, StoreError>;

    /// Cheap connectivity check used by `/health`
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Parse an opaque product id into the store's native key
pub(crate) fn parse_id(id: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(id).map_err(|_| StoreError::MalformedId(id.to_string()))
}
