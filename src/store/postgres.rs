use async_trait::async_trait;
use sqlx::{types::Json, FromRow, PgPool, Postgres, QueryBuilder};
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

use super::{parse_id, DocumentStore, StoreError};
use crate::models::{AttributeCondition, AttributeId, AttributeValue, ListOptions, Product, ProductFields, SortDirection};

const SELECT_COLUMNS: &str = "id, name, description, picture, owner_user_id, attributes";

/// `attributes[id].value` as text, compared bytewise so ordering matches
/// the in-memory store
fn push_attribute_value(qb: &mut QueryBuilder<'_, Postgres>, attribute_id: AttributeId) {
    qb.push("((attributes -> ")
        .push_bind(attribute_id.to_string())
        .push("::text ->> 'value') COLLATE \"C\")");
}

fn build_list_query(options: &ListOptions) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {} FROM products", SELECT_COLUMNS));

    for (i, filter) in options.filters.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        push_attribute_value(&mut qb, filter.attribute_id);
        match &filter.condition {
            AttributeCondition::Eq(v) => {
                qb.push(" = ").push_bind(v.clone());
            }
            AttributeCondition::Ne(v) => {
                qb.push(" IS DISTINCT FROM ").push_bind(v.clone());
            }
            AttributeCondition::Lt(v) => {
                qb.push(" < ").push_bind(v.clone());
            }
            AttributeCondition::Gt(v) => {
                qb.push(" > ").push_bind(v.clone());
            }
            AttributeCondition::Null => {
                qb.push(" IS NULL");
            }
            AttributeCondition::NotNull => {
                qb.push(" IS NOT NULL");
            }
        }
    }

    qb.push(" ORDER BY ");
    for sort in &options.sorts {
        push_attribute_value(&mut qb, sort.attribute_id);
        qb.push(match sort.direction {
            SortDirection::Asc => " ASC NULLS FIRST, ",
            SortDirection::Desc => " DESC NULLS LAST, ",
        });
    }
    qb.push("created_at, id LIMIT ")
        .push_bind(options.limit.max(0))
        .push(" OFFSET ")
        .push_bind(options.offset.max(0));
    qb
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    picture: Option<String>,
    owner_user_id: String,
    attributes: Json<BTreeMap<AttributeId, AttributeValue>>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id.to_string(),
            name: row.name,
            description: row.description,
            picture: row.picture,
            owner_user_id: row.owner_user_id,
            attributes: row.attributes.0,
        }
    }
}

/// Products as rows of the `products` table with a JSONB `attributes`
/// document. Attribute values are addressed by JSON path inside a single
/// UPDATE, so no operation reads the document back before writing it.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert(&self, fields: ProductFields) -> Result<String, StoreError> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO products (name, description, picture, owner_user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(&fields.picture)
        .bind(&fields.owner_user_id)
        .fetch_one(&self.pool)
        .await?;

        debug!("Inserted product {}", id);
        Ok(id.to_string())
    }

    async fn set_fields(&self, id: &str, fields: ProductFields) -> Result<(), StoreError> {
        let key = parse_id(id)?;
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, description = $3, picture = $4, owner_user_id = $5, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(key)
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(&fields.picture)
        .bind(&fields.owner_user_id)
        .execute(&self.pool)
        .await?;

        debug!("Updated fields of product {} ({} rows)", id, result.rows_affected());
        Ok(())
    }

    async fn set_attribute_value(
        &self,
        id: &str,
        attribute_id: AttributeId,
        value: &str,
    ) -> Result<(), StoreError> {
        let key = parse_id(id)?;
        // Merge {"value": ...} into the entry so sibling fields survive
        let result = sqlx::query(
            r#"
            UPDATE products
            SET attributes = jsonb_set(
                    attributes,
                    ARRAY[$2::text],
                    COALESCE(attributes -> ($2::text), '{}'::jsonb) || jsonb_build_object('value', $3::text),
                    true
                ),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(key)
        .bind(attribute_id.to_string())
        .bind(value)
        .execute(&self.pool)
        .await?;

        debug!(
            "Set attribute {} on product {} ({} rows)",
            attribute_id,
            id,
            result.rows_affected()
        );
        Ok(())
    }

    async fn unset_attribute_value(&self, id: &str, attribute_id: AttributeId) -> Result<(), StoreError> {
        let key = parse_id(id)?;
        let result = sqlx::query(
            r#"
            UPDATE products
            SET attributes = attributes #- ARRAY[$2::text, 'value'],
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(key)
        .bind(attribute_id.to_string())
        .execute(&self.pool)
        .await?;

        debug!(
            "Cleared attribute {} on product {} ({} rows)",
            attribute_id,
            id,
            result.rows_affected()
        );
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let key = parse_id(id)?;
        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Product>, StoreError> {
        let key = parse_id(id)?;
        let sql = format!("SELECT {} FROM products WHERE id = $1", SELECT_COLUMNS);
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Product::from))
    }

    async fn list(&self, options: &ListOptions) -> Result<Vec<Product>, StoreError> {
        let mut qb = build_list_query(options);
        debug!("List query: {}", qb.sql());
        let rows = qb
            .build_query_as::<ProductRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
