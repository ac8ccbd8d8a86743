use serde::Deserialize;
use std::cmp::Ordering;
use std::str::FromStr;
use thiserror::Error;

use super::product::{AttributeId, Product};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ListQueryError {
    #[error("Invalid attribute id in '{0}'")]
    InvalidAttribute(String),

    #[error("Missing condition value in filter '{0}'")]
    MissingValue(String),

    #[error("Invalid sort direction in '{0}', expected 1 or -1")]
    InvalidDirection(String),
}

/// Query string of `GET /product`.
///
/// `f` holds comma-separated `<attributeId>:<condition>:<value>` filters and
/// `so` comma-separated `<attributeId>:<1|-1>` sort keys.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    #[serde(rename = "f")]
    pub filter: Option<String>,
    #[serde(rename = "so")]
    pub sort: Option<String>,
}

/// Condition on `attributes[id].value`. Values compare as strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeCondition {
    Eq(String),
    /// Also matches products where the value is absent
    Ne(String),
    Lt(String),
    Gt(String),
    Null,
    NotNull,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeFilter {
    pub attribute_id: AttributeId,
    pub condition: AttributeCondition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Sort key on `attributes[id].value`. Absent values sort before any
/// present value, so they come first ascending and last descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSort {
    pub attribute_id: AttributeId,
    pub direction: SortDirection,
}

/// Normalized listing request handed to a store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub limit: i64,
    pub offset: i64,
    pub filters: Vec<AttributeFilter>,
    pub sorts: Vec<AttributeSort>,
}

fn parse_attribute_id(raw: &str, token: &str) -> Result<AttributeId, ListQueryError> {
    raw.trim()
        .parse()
        .map_err(|_| ListQueryError::InvalidAttribute(token.to_string()))
}

fn value_of(product: &Product, attribute_id: AttributeId) -> Option<&str> {
    product
        .attributes
        .get(&attribute_id)
        .and_then(|attr| attr.value.as_deref())
}

impl FromStr for AttributeFilter {
    type Err = ListQueryError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let mut parts = token.splitn(3, ':');
        let attribute_id = parse_attribute_id(parts.next().unwrap_or_default(), token)?;
        let condition = parts.next().unwrap_or_default();
        let value = parts.next();

        let needs_value = |v: Option<&str>| {
            v.map(str::to_string)
                .ok_or_else(|| ListQueryError::MissingValue(token.to_string()))
        };

        let condition = match condition {
            "nu" => AttributeCondition::Null,
            "nn" => AttributeCondition::NotNull,
            "ne" => AttributeCondition::Ne(needs_value(value)?),
            "lt" => AttributeCondition::Lt(needs_value(value)?),
            "gt" => AttributeCondition::Gt(needs_value(value)?),
            // anything else is an equality test
            _ => AttributeCondition::Eq(needs_value(value)?),
        };

        Ok(Self {
            attribute_id,
            condition,
        })
    }
}

impl AttributeFilter {
    pub fn matches(&self, product: &Product) -> bool {
        let value = value_of(product, self.attribute_id);
        match &self.condition {
            AttributeCondition::Eq(v) => value == Some(v.as_str()),
            AttributeCondition::Ne(v) => value != Some(v.as_str()),
            AttributeCondition::Lt(v) => value.is_some_and(|x| x < v.as_str()),
            AttributeCondition::Gt(v) => value.is_some_and(|x| x > v.as_str()),
            AttributeCondition::Null => value.is_none(),
            AttributeCondition::NotNull => value.is_some(),
        }
    }
}

impl FromStr for AttributeSort {
    type Err = ListQueryError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let (id, direction) = token
            .split_once(':')
            .ok_or_else(|| ListQueryError::InvalidDirection(token.to_string()))?;
        let attribute_id = parse_attribute_id(id, token)?;
        let direction = match direction.trim() {
            "1" => SortDirection::Asc,
            "-1" => SortDirection::Desc,
            _ => return Err(ListQueryError::InvalidDirection(token.to_string())),
        };
        Ok(Self {
            attribute_id,
            direction,
        })
    }
}

impl AttributeSort {
    pub fn compare(&self, a: &Product, b: &Product) -> Ordering {
        let ord = value_of(a, self.attribute_id).cmp(&value_of(b, self.attribute_id));
        match self.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

fn parse_list<T: FromStr<Err = ListQueryError>>(raw: Option<&str>) -> Result<Vec<T>, ListQueryError> {
    raw.unwrap_or_default()
        .split(',')
        .filter(|token| !token.trim().is_empty())
        .map(str::parse::<T>)
        .collect()
}

impl ListOptions {
    /// Parse the filter and sort parameters and clamp paging to `max_limit`
    pub fn from_query(query: &ListQuery, max_limit: i64) -> Result<Self, ListQueryError> {
        let max_limit = max_limit.max(0);
        Ok(Self {
            limit: query.limit.unwrap_or(max_limit).clamp(0, max_limit),
            offset: query.offset.unwrap_or(0).max(0),
            filters: parse_list(query.filter.as_deref())?,
            sorts: parse_list(query.sort.as_deref())?,
        })
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.filters.iter().all(|f| f.matches(product))
    }

    /// Compare by the sort keys in order; `Equal` when all of them tie
    pub fn compare(&self, a: &Product, b: &Product) -> Ordering {
        self.sorts
            .iter()
            .map(|s| s.compare(a, b))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}
