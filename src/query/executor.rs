//! Listing executor: filter, order, page and project a record collection.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{compile_at, CacheManager, ContentQuery, Listable, OrderBy};
use crate::errors::AppError;

/// One page of a listing plus the total number of matching records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing<R> {
    pub items: Vec<R>,
    /// Matching records before pagination; 0 when record stats were skipped.
    pub total: i64,
}

impl<R> Listing<R> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }
}

/// Runs listing queries through the predicate compiler and the cache.
#[derive(Clone)]
pub struct ListingExecutor {
    cache: CacheManager,
}

impl ListingExecutor {
    pub fn new(cache: CacheManager) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// Execute `query` over the records produced by `load`.
    ///
    /// Criteria are validated before anything is loaded. `load` is only invoked on a
    /// cache miss (or when caching is bypassed) and its errors are propagated as-is.
    pub async fn execute<Q, F, Fut>(&self, query: &Q, load: F) -> Result<Listing<Q::Record>, AppError>
    where
        Q: ContentQuery,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Q::Record>, AppError>>,
    {
        let base = query.base();
        base.validate()?;
        let order = OrderBy::parse::<Q::Record>(&base.order)?;

        let now = Utc::now();
        let mut listing = self
            .cache
            .get_or_compute_at(Q::NAMESPACE, query, now, move || async move {
                let records = load().await?;
                Ok(run(query, &order, records, now))
            })
            .await?;

        if base.skip_record_stats {
            listing.total = 0;
        }

        tracing::debug!(
            namespace = Q::NAMESPACE,
            returned = listing.items.len(),
            total = listing.total,
            "listing executed"
        );
        Ok(listing)
    }
}

/// Pure listing pipeline over an in-memory collection.
pub fn run<Q: ContentQuery>(
    query: &Q,
    order: &OrderBy,
    records: Vec<Q::Record>,
    now: DateTime<Utc>,
) -> Listing<Q::Record> {
    let base = query.base();
    let predicate = compile_at(query, now);

    let mut matched: Vec<Q::Record> = records
        .into_iter()
        .filter(|record| predicate.matches(record))
        .collect();
    order.sort(&mut matched);

    let total = i64::try_from(matched.len()).unwrap_or(i64::MAX);
    let columns = base.effective_columns();

    let page: Vec<Q::Record> = if base.is_paginated() {
        matched
            .into_iter()
            .skip(base.offset())
            .take(usize::try_from(base.page_size).unwrap_or(0))
            .collect()
    } else {
        matched
    };

    Listing {
        items: page.into_iter().map(|r| r.project(columns)).collect(),
        total,
    }
}
