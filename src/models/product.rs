use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// Attribute ids are the integer keys of `Product::attributes`
pub type AttributeId = i32;

/// One entry of a product's attribute mapping.
///
/// `value` may be absent: clearing a value removes only that field and keeps
/// the entry (and whatever else it carries, e.g. `verified` or `source`).
/// Stored numbers and booleans read back as their JSON text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeValue {
    #[serde(
        default,
        deserialize_with = "scalar_as_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AttributeValue {
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            extra: Map::new(),
        }
    }
}

fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// A product document as stored and as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    pub owner_user_id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<AttributeId, AttributeValue>,
}

/// Scalar fields written by create and update. Never carries `id`,
/// `ownerUserId` or attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFields {
    pub name: String,
    pub description: Option<String>,
    pub picture: Option<String>,
    pub owner_user_id: String,
}

impl ProductFields {
    /// The document as it exists right after insertion
    pub fn into_product(self, id: String) -> Product {
        Product {
            id,
            name: self.name,
            description: self.description,
            picture: self.picture,
            owner_user_id: self.owner_user_id,
            attributes: BTreeMap::new(),
        }
    }
}

/// Request body for `POST /product` and `PUT /product/{id}`.
///
/// Unknown keys (`id`, `ownerUserId`, `attributes`, ...) are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

impl ProductInput {
    /// Check required fields, returning per-field messages on failure
    pub fn validate(&self) -> Result<(), HashMap<String, String>> {
        let mut field_errors = HashMap::new();

        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => {}
            _ => {
                field_errors.insert("name".to_string(), "This field is required".to_string());
            }
        }

        if field_errors.is_empty() {
            Ok(())
        } else {
            Err(field_errors)
        }
    }

    /// Build the stored fields, stamping the given owner
    pub fn into_fields(self, owner_user_id: impl Into<String>) -> ProductFields {
        ProductFields {
            name: self.name.unwrap_or_default(),
            description: self.description,
            picture: self.picture,
            owner_user_id: owner_user_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn input_requires_name() {
        let input: ProductInput = serde_json::from_value(json!({ "description": "x" })).unwrap();
        let errors = input.validate().unwrap_err();
        assert!(errors.contains_key("name"));

        let blank: ProductInput = serde_json::from_value(json!({ "name": "   " })).unwrap();
        assert!(blank.validate().is_err());

        let ok: ProductInput = serde_json::from_value(json!({ "name": "Chair" })).unwrap();
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn input_ignores_server_assigned_fields() {
        let input: ProductInput = serde_json::from_value(json!({
            "id": "forged",
            "ownerUserId": "mallory",
            "name": "Chair",
            "attributes": { "3": { "value": "red" } }
        }))
        .unwrap();

        let fields = input.into_fields("alice");
        assert_eq!(fields.owner_user_id, "alice");
        let product = fields.into_product("generated".to_string());
        assert_eq!(product.id, "generated");
        assert!(product.attributes.is_empty());
    }

    #[test]
    fn attribute_value_keeps_sibling_fields() {
        let raw = json!({ "value": "red", "verified": false, "source": "dbpedia" });
        let mut attr: AttributeValue = serde_json::from_value(raw).unwrap();
        assert_eq!(attr.value.as_deref(), Some("red"));

        attr.value = None;
        let out = serde_json::to_value(&attr).unwrap();
        assert_eq!(out, json!({ "verified": false, "source": "dbpedia" }));
    }

    #[test]
    fn non_string_values_read_as_text() {
        let number: AttributeValue = serde_json::from_value(json!({ "value": 42, "verified": true })).unwrap();
        assert_eq!(number.value.as_deref(), Some("42"));
        assert_eq!(number.extra.get("verified"), Some(&Value::Bool(true)));

        let flag: AttributeValue = serde_json::from_value(json!({ "value": false })).unwrap();
        assert_eq!(flag.value.as_deref(), Some("false"));

        let null: AttributeValue = serde_json::from_value(json!({ "value": null })).unwrap();
        assert!(null.value.is_none());

        let attrs: BTreeMap<AttributeId, AttributeValue> =
            serde_json::from_value(json!({ "3": { "value": 1.5 }, "4": {} })).unwrap();
        assert_eq!(attrs[&3].value.as_deref(), Some("1.5"));
        assert!(attrs[&4].value.is_none());
    }

    #[test]
    fn product_serializes_integer_attribute_keys() {
        let mut product = ProductFields {
            name: "Chair".into(),
            description: None,
            picture: None,
            owner_user_id: "alice".into(),
        }
        .into_product("p1".into());
        product.attributes.insert(3, AttributeValue::with_value("red"));

        let v = serde_json::to_value(&product).unwrap();
        assert_eq!(v["ownerUserId"], "alice");
        assert_eq!(v["attributes"]["3"]["value"], "red");

        let back: Product = serde_json::from_value(v).unwrap();
        assert_eq!(back, product);
    }
}
