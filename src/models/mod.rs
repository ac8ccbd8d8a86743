pub mod listing;
pub mod product;

pub use listing::{
    AttributeCondition, AttributeFilter, AttributeSort, ListOptions, ListQuery, ListQueryError, SortDirection,
};
pub use product::{AttributeId, AttributeValue, Product, ProductFields, ProductInput};
