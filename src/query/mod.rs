//! Generic filtered-listing engine.
//!
//! `criteria` holds the filter bag, `predicate` compiles it into a record filter,
//! `order` parses ordering expressions, `cache` memoizes listings and `executor`
//! ties them together into a paged, projected result.

mod cache;
mod criteria;
mod executor;
mod order;
mod predicate;

pub use cache::*;
pub use criteria::*;
pub use executor::*;
pub use order::*;
pub use predicate::*;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

/// A record that can be filtered, ordered and projected by the listing engine.
pub trait Listable: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Sortable fields (camelCase), checked by the order parser.
    const ORDER_FIELDS: &'static [&'static str];
    /// Order applied when the criteria carries none.
    const DEFAULT_ORDER: &'static str;

    fn id(&self) -> i64;
    fn slug(&self) -> &str;
    fn title(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;

    /// Value of a status flag, `None` when this content type has no such flag.
    fn status(&self, flag: StatusFlag) -> Option<bool>;

    /// Columns searched by the free-text `term` filter.
    fn search_columns(&self) -> Vec<&str>;

    /// Sort key for one of [`Listable::ORDER_FIELDS`].
    fn sort_value(&self, field: &str) -> SortValue;

    /// Strip the fields not selected by `columns`.
    fn project(self, columns: ColumnOptions) -> Self;
}

/// Per-content-type criteria: the shared base plus a fixed set of extra filters.
pub trait ContentQuery: Clone + Send + Sync + 'static {
    type Record: Listable;

    /// Cache namespace prefix for this content type.
    const NAMESPACE: &'static str;

    fn base(&self) -> &QueryCriteria;
    fn base_mut(&mut self) -> &mut QueryCriteria;

    /// Content-specific filters, applied only when `advanceFilter` is on.
    fn rules() -> Vec<Rule<Self>>;

    /// Append the content-specific filter values to a cache key, in a fixed order.
    fn key_parts(&self, key: &mut CacheKey);

    /// Clone with text filters normalized.
    fn normalized(&self) -> Self {
        let mut query = self.clone();
        query.base_mut().normalize();
        query
    }
}
