use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{parse_id, DocumentStore, StoreError};
use crate::models::{AttributeId, AttributeValue, ListOptions, Product, ProductFields};

#[derive(Default)]
struct Documents {
    next_seq: u64,
    by_id: HashMap<Uuid, (u64, Product)>,
}

/// In-process store with the same semantics as the Postgres one.
/// Each operation holds the lock for its whole mutation.
#[derive(Default)]
pub struct MemoryDocumentStore {
    docs: RwLock<Documents>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.docs.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, fields: ProductFields) -> Result<String, StoreError> {
        let id = Uuid::new_v4();
        let mut docs = self.docs.write().await;
        let seq = docs.next_seq;
        docs.next_seq += 1;
        docs.by_id.insert(id, (seq, fields.into_product(id.to_string())));
        Ok(id.to_string())
    }

    async fn set_fields(&self, id: &str, fields: ProductFields) -> Result<(), StoreError> {
        let key = parse_id(id)?;
        let mut docs = self.docs.write().await;
        if let Some((_, product)) = docs.by_id.get_mut(&key) {
            product.name = fields.name;
            product.description = fields.description;
            product.picture = fields.picture;
            product.owner_user_id = fields.owner_user_id;
        }
        Ok(())
    }

    async fn set_attribute_value(
        &self,
        id: &str,
        attribute_id: AttributeId,
        value: &str,
    ) -> Result<(), StoreError> {
        let key = parse_id(id)?;
        let mut docs = self.docs.write().await;
        if let Some((_, product)) = docs.by_id.get_mut(&key) {
            product
                .attributes
                .entry(attribute_id)
                .or_insert_with(AttributeValue::default)
                .value = Some(value.to_string());
        }
        Ok(())
    }

    async fn unset_attribute_value(&self, id: &str, attribute_id: AttributeId) -> Result<(), StoreError> {
        let key = parse_id(id)?;
        let mut docs = self.docs.write().await;
        if let Some((_, product)) = docs.by_id.get_mut(&key) {
            if let Some(attr) = product.attributes.get_mut(&attribute_id) {
                attr.value = None;
            }
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let key = parse_id(id)?;
        self.docs.write().await.by_id.remove(&key);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Product>, StoreError> {
        let key = parse_id(id)?;
        Ok(self
            .docs
            .read()
            .await
            .by_id
            .get(&key)
            .map(|(_, product)| product.clone()))
    }

    async fn list(&self, options: &ListOptions) -> Result<Vec<Product>, StoreError> {
        let docs = self.docs.read().await;
        let mut entries: Vec<&(u64, Product)> = docs
            .by_id
            .values()
            .filter(|(_, product)| options.matches(product))
            .collect();
        entries.sort_by(|(a_seq, a), (b_seq, b)| options.compare(a, b).then(a_seq.cmp(b_seq)));

        Ok(entries
            .into_iter()
            .skip(options.offset.max(0) as usize)
            .take(options.limit.max(0) as usize)
            .map(|(_, product)| product.clone())
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
