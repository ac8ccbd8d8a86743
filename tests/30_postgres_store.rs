// Postgres store tests. They need DATABASE_URL pointing at a scratch database
// and pass trivially when it is unset.

use anyhow::Result;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use product_api::config::AppConfig;
use product_api::database::DatabaseManager;
use product_api::models::{AttributeId, ListOptions, ListQuery, ProductFields};
use product_api::store::{DocumentStore, PgDocumentStore, StoreError};

async fn connect() -> Result<Option<(PgPool, PgDocumentStore)>> {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set, skipping Postgres store test");
        return Ok(None);
    }

    let pool = DatabaseManager::connect(&AppConfig::from_env().database).await?;
    // parallel CREATE TABLE IF NOT EXISTS can collide on the first run
    if DatabaseManager::migrate(&pool).await.is_err() {
        DatabaseManager::migrate(&pool).await?;
    }
    Ok(Some((pool.clone(), PgDocumentStore::new(pool))))
}

/// Attribute id no other test run writes to, so list filters stay isolated
fn fresh_attribute() -> AttributeId {
    (Uuid::new_v4().as_u128() % 1_000_000_000) as AttributeId + 1_000
}

fn fields(name: &str) -> ProductFields {
    ProductFields {
        name: name.to_string(),
        description: Some("desc".to_string()),
        picture: None,
        owner_user_id: "admin-1".to_string(),
    }
}

async fn raw_attributes(pool: &PgPool, id: &str) -> Result<Value> {
    let attrs: Value = sqlx::query_scalar("SELECT attributes FROM products WHERE id = $1::uuid")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(attrs)
}

#[tokio::test]
async fn insert_and_get_round_trip() -> Result<()> {
    let Some((_, store)) = connect().await? else { return Ok(()) };

    let id = store.insert(fields("Chair")).await?;
    let product = store.get(&id).await?.expect("inserted product should exist");

    assert_eq!(product.id, id);
    assert_eq!(product.name, "Chair");
    assert_eq!(product.description.as_deref(), Some("desc"));
    assert_eq!(product.owner_user_id, "admin-1");
    assert!(product.attributes.is_empty());

    store.delete(&id).await?;
    Ok(())
}

#[tokio::test]
async fn set_and_clear_keep_sibling_fields() -> Result<()> {
    let Some((pool, store)) = connect().await? else { return Ok(()) };
    let id = store.insert(fields("Chair")).await?;

    store.set_attribute_value(&id, 3, "red").await?;
    store.set_attribute_value(&id, 3, "blue").await?;
    assert_eq!(raw_attributes(&pool, &id).await?, serde_json::json!({ "3": { "value": "blue" } }));

    sqlx::query(
        "UPDATE products SET attributes = jsonb_set(attributes, '{3,verified}', 'true'::jsonb) WHERE id = $1::uuid",
    )
    .bind(&id)
    .execute(&pool)
    .await?;

    store.set_attribute_value(&id, 3, "green").await?;
    assert_eq!(
        raw_attributes(&pool, &id).await?,
        serde_json::json!({ "3": { "value": "green", "verified": true } })
    );

    store.unset_attribute_value(&id, 3).await?;
    assert_eq!(raw_attributes(&pool, &id).await?, serde_json::json!({ "3": { "verified": true } }));

    let product = store.get(&id).await?.expect("product should exist");
    assert!(product.attributes[&3].value.is_none());
    assert_eq!(product.attributes[&3].extra.get("verified"), Some(&Value::Bool(true)));

    store.delete(&id).await?;
    Ok(())
}

#[tokio::test]
async fn clear_on_missing_entry_changes_nothing() -> Result<()> {
    let Some((pool, store)) = connect().await? else { return Ok(()) };
    let id = store.insert(fields("Chair")).await?;
    store.set_attribute_value(&id, 1, "oak").await?;

    store.unset_attribute_value(&id, 2).await?;

    assert_eq!(raw_attributes(&pool, &id).await?, serde_json::json!({ "1": { "value": "oak" } }));
    store.delete(&id).await?;
    Ok(())
}

#[tokio::test]
async fn update_keeps_attributes() -> Result<()> {
    let Some((_, store)) = connect().await? else { return Ok(()) };
    let id = store.insert(fields("Chair")).await?;
    store.set_attribute_value(&id, 3, "red").await?;

    let mut edited = fields("Stool");
    edited.owner_user_id = "admin-2".to_string();
    store.set_fields(&id, edited).await?;

    let product = store.get(&id).await?.expect("product should exist");
    assert_eq!(product.name, "Stool");
    assert_eq!(product.owner_user_id, "admin-2");
    assert_eq!(product.attributes[&3].value.as_deref(), Some("red"));

    store.delete(&id).await?;
    Ok(())
}

#[tokio::test]
async fn mutations_on_missing_id_are_noops() -> Result<()> {
    let Some((_, store)) = connect().await? else { return Ok(()) };
    let missing = Uuid::new_v4().to_string();

    store.set_fields(&missing, fields("Ghost")).await?;
    store.set_attribute_value(&missing, 1, "x").await?;
    store.unset_attribute_value(&missing, 1).await?;
    store.delete(&missing).await?;

    assert!(store.get(&missing).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn malformed_id_is_an_error() -> Result<()> {
    let Some((_, store)) = connect().await? else { return Ok(()) };

    assert!(matches!(store.delete("zz").await, Err(StoreError::MalformedId(_))));
    assert!(matches!(store.get("zz").await, Err(StoreError::MalformedId(_))));
    Ok(())
}

#[tokio::test]
async fn list_filters_and_sorts_by_attribute_value() -> Result<()> {
    let Some((_, store)) = connect().await? else { return Ok(()) };
    let attr = fresh_attribute();
    let marker = fresh_attribute();

    let mut ids = Vec::new();
    for (name, color) in [("a", Some("red")), ("b", None), ("c", Some("blue")), ("d", Some("red"))] {
        let id = store.insert(fields(name)).await?;
        // the marker restricts listings to this test's rows
        store.set_attribute_value(&id, marker, "x").await?;
        if let Some(color) = color {
            store.set_attribute_value(&id, attr, color).await?;
        }
        ids.push(id);
    }

    let list = |filter: String, sort: Option<String>| {
        let query = ListQuery {
            filter: Some(format!("{}:eq:x,{}", marker, filter)),
            sort,
            ..Default::default()
        };
        let store = &store;
        async move {
            let options = ListOptions::from_query(&query, 100)?;
            let names: Vec<String> = store.list(&options).await?.into_iter().map(|p| p.name).collect();
            anyhow::Ok(names)
        }
    };

    assert_eq!(list(format!("{}:eq:red", attr), None).await?, vec!["a", "d"]);
    assert_eq!(list(format!("{}:ne:red", attr), None).await?, vec!["b", "c"]);
    assert_eq!(list(format!("{}:lt:c", attr), None).await?, vec!["c"]);
    assert_eq!(list(format!("{}:gt:c", attr), None).await?, vec!["a", "d"]);
    assert_eq!(list(format!("{}:nu", attr), None).await?, vec!["b"]);
    assert_eq!(list(format!("{}:nn", attr), None).await?, vec!["a", "c", "d"]);

    assert_eq!(
        list(format!("{}:nn", marker), Some(format!("{}:1", attr))).await?,
        vec!["b", "c", "a", "d"]
    );
    assert_eq!(
        list(format!("{}:nn", marker), Some(format!("{}:-1", attr))).await?,
        vec!["a", "d", "c", "b"]
    );

    for id in ids {
        store.delete(&id).await?;
    }
    Ok(())
}
