//! Listing cache.
//!
//! Results are stored as whole JSON documents in an in-process Moka cache, keyed by
//! a string derived from the criteria. The cache is an optimization only: a lost or
//! unreadable entry just means the listing is computed again.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::{ContentQuery, OrderBy};
use crate::config::Config;
use crate::errors::AppError;

/// Deterministic cache key built by appending criteria fields in a fixed order.
///
/// Shape: `<namespace>_<field>_<field>...`. Text fields are quoted and escaped so
/// that no two distinct field sequences render to the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(namespace: &str) -> Self {
        Self(namespace.to_string())
    }

    pub fn push(&mut self, value: impl Display) -> &mut Self {
        self.0.push('_');
        self.0.push_str(&value.to_string());
        self
    }

    pub fn push_text(&mut self, value: &str) -> &mut Self {
        self.0.push('_');
        self.0.push_str(&format!("{:?}", value));
        self
    }

    pub fn push_opt(&mut self, value: Option<impl Display>) -> &mut Self {
        match value {
            Some(value) => self.push(value),
            None => self.push("-"),
        }
    }

    /// Key for `query` under `namespace`, resolving named date ranges against the clock.
    pub fn for_query<Q: ContentQuery>(namespace: &str, query: &Q, order: &OrderBy) -> Self {
        Self::for_query_at(namespace, query, order, Utc::now())
    }

    /// Key for `query` under `namespace` as evaluated at `now`.
    ///
    /// Fields that cannot change the result are left out: `isCache` and
    /// `skipRecordStats` always, pagination for `loadAll`, every filter but the id
    /// for direct lookups, and the optional filters when `advanceFilter` is off.
    /// A named `dateFilter` is keyed by the window it resolves to at `now`, so an
    /// entry never outlives the day, week, month or year it was computed for.
    pub fn for_query_at<Q: ContentQuery>(
        namespace: &str,
        query: &Q,
        order: &OrderBy,
        now: DateTime<Utc>,
    ) -> Self {
        let mut query = query.normalized();
        query.base_mut().resolve_dates(now);
        let base = query.base();
        let mut key = Self::new(namespace);

        if base.is_lookup() {
            key.push("id").push(base.id);
            return key;
        }

        if base.load_all {
            key.push("all");
        } else {
            key.push(base.page_number).push(base.page_size);
        }
        key.push(base.effective_columns().as_str())
            .push(order.normalized())
            .push_text(&base.slug)
            .push_text(&base.slug_started_with)
            .push(base.advance_filter);

        if base.advance_filter {
            key.push(base.is_enabled.as_str())
                .push(base.is_approved.as_str())
                .push(base.is_draft.as_str())
                .push(base.is_archived.as_str())
                .push_opt(base.start_date.map(|d| d.timestamp_micros()))
                .push_opt(base.end_date.map(|d| d.timestamp_micros()))
                .push_text(&base.term);
            query.key_parts(&mut key);
        }
        key
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opt-in, time-bounded listing cache.
#[derive(Clone)]
pub struct CacheManager {
    /// `None` when the configured TTL is zero.
    store: Option<Cache<String, String>>,
}

impl CacheManager {
    pub fn new(ttl: Option<Duration>, max_capacity: u64) -> Self {
        let store = ttl.map(|ttl| {
            Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build()
        });
        Self { store }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cache_ttl(), config.cache_max_capacity)
    }

    /// A manager that never caches.
    pub fn disabled() -> Self {
        Self { store: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Serve the listing for `query` from `namespace`, computing it on a miss.
    ///
    /// Caching only happens when the criteria opt in with `isCache`.
    pub async fn get_or_compute<Q, V, F, Fut>(
        &self,
        namespace: &str,
        query: &Q,
        compute: F,
    ) -> Result<V, AppError>
    where
        Q: ContentQuery,
        V: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, AppError>>,
    {
        self.get_or_compute_at(namespace, query, Utc::now(), compute)
            .await
    }

    /// [`get_or_compute`](Self::get_or_compute) with the key evaluated at `now`.
    pub async fn get_or_compute_at<Q, V, F, Fut>(
        &self,
        namespace: &str,
        query: &Q,
        now: DateTime<Utc>,
        compute: F,
    ) -> Result<V, AppError>
    where
        Q: ContentQuery,
        V: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, AppError>>,
    {
        let order = OrderBy::parse::<Q::Record>(&query.base().order)?;
        let key = CacheKey::for_query_at(namespace, query, &order, now);
        self.get_or_compute_keyed(&key, query.base().is_cache, compute)
            .await
    }

    /// Serve `key` from the cache when `use_cache` is set, otherwise (or on a miss)
    /// run `compute` and store its successful result.
    ///
    /// Errors from `compute` are returned unchanged and never cached.
    pub async fn get_or_compute_keyed<V, F, Fut>(
        &self,
        key: &CacheKey,
        use_cache: bool,
        compute: F,
    ) -> Result<V, AppError>
    where
        V: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, AppError>>,
    {
        let store = match &self.store {
            Some(store) if use_cache => store,
            _ => {
                debug!(key = %key, "cache bypassed");
                return compute().await;
            }
        };

        if let Some(cached) = store.get(key.as_str()).await {
            match serde_json::from_str(&cached) {
                Ok(value) => {
                    debug!(key = %key, "cache hit");
                    return Ok(value);
                }
                Err(e) => warn!(key = %key, error = %e, "discarding unreadable cache entry"),
            }
        }

        debug!(key = %key, "cache miss");
        let value = compute().await?;

        match serde_json::to_string(&value) {
            Ok(serialized) => store.insert(key.as_str().to_string(), serialized).await,
            Err(e) => warn!(key = %key, error = %e, "failed to serialize cache entry"),
        }

        Ok(value)
    }

    /// Drop every entry whose key starts with `namespace`.
    pub async fn invalidate_namespace(&self, namespace: &str) {
        let Some(store) = &self.store else {
            return;
        };

        let prefix = format!("{}_", namespace);
        let stale: Vec<String> = store
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(key, _)| key.as_ref().clone())
            .collect();

        for key in &stale {
            store.invalidate(key).await;
        }
        debug!(namespace = %namespace, keys_invalidated = %stale.len(), "cache namespace invalidated");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::models::{BlogQuery, Tag, TagQuery};
    use crate::query::{FilterState, QueryCriteria};

    fn key_for(query: &TagQuery) -> CacheKey {
        let order = OrderBy::parse::<Tag>(&query.base.order).unwrap();
        CacheKey::for_query(TagQuery::NAMESPACE, query, &order)
    }

    async fn counted(
        cache: &CacheManager,
        key: &CacheKey,
        use_cache: bool,
        calls: &AtomicUsize,
    ) -> Result<Vec<i64>, AppError> {
        cache
            .get_or_compute_keyed(key, use_cache, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![1, 2, 3])
            })
            .await
    }

    #[test]
    fn test_key_ignores_field_declaration_order() {
        let a: TagQuery = serde_json::from_str(
            r#"{"pageNumber":2,"pageSize":10,"term":"rust","advanceFilter":true,"tagType":3}"#,
        )
        .unwrap();
        let b: TagQuery = serde_json::from_str(
            r#"{"tagType":3,"advanceFilter":true,"term":"rust","pageSize":10,"pageNumber":2}"#,
        )
        .unwrap();
        assert_eq!(key_for(&a), key_for(&b));
        assert!(key_for(&a).as_str().starts_with("tags_2_10_"));
    }

    #[test]
    fn test_key_excludes_fields_that_do_not_change_results() {
        let plain = TagQuery::default();
        let mut flagged = TagQuery::default();
        flagged.base.is_cache = true;
        flagged.base.skip_record_stats = true;
        assert_eq!(key_for(&plain), key_for(&flagged));

        // optional filters are inert without advanceFilter
        let mut inert = TagQuery::default();
        inert.base.term = "rust".to_string();
        inert.base.is_enabled = FilterState::Enabled;
        assert_eq!(key_for(&plain), key_for(&inert));

        // pagination is inert for loadAll
        let mut all_a = TagQuery::default();
        all_a.base.load_all = true;
        let mut all_b = all_a.clone();
        all_b.base.page_number = 7;
        assert_eq!(key_for(&all_a), key_for(&all_b));

        // every filter but the id is inert for lookups
        let mut lookup_a = TagQuery::default();
        lookup_a.base.id = 5;
        let mut lookup_b = lookup_a.clone();
        lookup_b.base.advance_filter = true;
        lookup_b.base.term = "x".to_string();
        assert_eq!(key_for(&lookup_a), key_for(&lookup_b));
    }

    #[test]
    fn test_key_distinguishes_result_changing_fields() {
        let base = TagQuery {
            base: QueryCriteria {
                advance_filter: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut other_page = base.clone();
        other_page.base.page_number = 2;
        let mut other_term = base.clone();
        other_term.base.term = "a".to_string();
        let mut other_type = base.clone();
        other_type.tag_type = 2;
        let mut other_order = base.clone();
        other_order.base.order = "createdAt desc".to_string();

        let key = key_for(&base);
        assert_ne!(key, key_for(&other_page));
        assert_ne!(key, key_for(&other_term));
        assert_ne!(key, key_for(&other_type));
        assert_ne!(key, key_for(&other_order));
    }

    #[test]
    fn test_named_date_range_is_keyed_by_its_window() {
        let at = |s: &str| DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc);
        let order = OrderBy::parse::<Tag>("").unwrap();
        let mut today = TagQuery::default();
        today.base.advance_filter = true;
        today.base.date_filter = crate::query::DateFilter::Today;

        let key_at = |now| CacheKey::for_query_at(TagQuery::NAMESPACE, &today, &order, now);
        let before_midnight = key_at(at("2024-03-09T23:59:00Z"));
        assert_eq!(before_midnight, key_at(at("2024-03-09T08:00:00Z")));
        assert_ne!(before_midnight, key_at(at("2024-03-10T00:01:00Z")));

        // same window as the explicit dates it resolves to
        let mut explicit = TagQuery::default();
        explicit.base.advance_filter = true;
        explicit.base.start_date = Some(at("2024-03-09T00:00:00Z"));
        explicit.base.end_date = Some(at("2024-03-10T00:00:00Z"));
        assert_eq!(
            before_midnight,
            CacheKey::for_query_at(TagQuery::NAMESPACE, &explicit, &order, at("2024-03-09T23:59:00Z"))
        );
    }

    #[tokio::test]
    async fn test_named_date_range_is_recomputed_after_midnight() {
        let at = |s: &str| DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc);
        let cache = CacheManager::new(Some(Duration::from_secs(60)), 100);
        let calls = AtomicUsize::new(0);
        let mut query = TagQuery::default();
        query.base.is_cache = true;
        query.base.advance_filter = true;
        query.base.date_filter = crate::query::DateFilter::Today;

        for now in ["2024-03-09T23:59:00Z", "2024-03-09T23:59:30Z", "2024-03-10T00:00:30Z"] {
            let _: Vec<i64> = cache
                .get_or_compute_at(TagQuery::NAMESPACE, &query, at(now), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1])
                })
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_text_fields_cannot_collide() {
        let mut a = BlogQuery::default();
        a.base.slug = "a_".to_string();
        a.base.slug_started_with = "b".to_string();
        let mut b = BlogQuery::default();
        b.base.slug = "a".to_string();
        b.base.slug_started_with = "_b".to_string();

        let order = OrderBy::parse::<crate::models::Blog>("").unwrap();
        assert_ne!(
            CacheKey::for_query("blogs", &a, &order),
            CacheKey::for_query("blogs", &b, &order)
        );
    }

    #[tokio::test]
    async fn test_hit_within_ttl_computes_once() {
        let cache = CacheManager::new(Some(Duration::from_secs(60)), 100);
        let key = CacheKey::new("tags_1");
        let calls = AtomicUsize::new(0);

        assert_eq!(counted(&cache, &key, true, &calls).await.unwrap(), vec![1, 2, 3]);
        assert_eq!(counted(&cache, &key, true, &calls).await.unwrap(), vec![1, 2, 3]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_recomputed() {
        let cache = CacheManager::new(Some(Duration::from_millis(100)), 100);
        let key = CacheKey::new("tags_1");
        let calls = AtomicUsize::new(0);

        counted(&cache, &key, true, &calls).await.unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        counted(&cache, &key, true, &calls).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_bypass_when_not_requested_or_disabled() {
        let cache = CacheManager::new(Some(Duration::from_secs(60)), 100);
        let key = CacheKey::new("tags_1");
        let calls = AtomicUsize::new(0);

        counted(&cache, &key, false, &calls).await.unwrap();
        counted(&cache, &key, false, &calls).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let disabled = CacheManager::disabled();
        let calls = AtomicUsize::new(0);
        counted(&disabled, &key, true, &calls).await.unwrap();
        counted(&disabled, &key, true, &calls).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!disabled.is_enabled());
    }

    #[tokio::test]
    async fn test_failures_are_propagated_and_not_cached() {
        let cache = CacheManager::new(Some(Duration::from_secs(60)), 100);
        let key = CacheKey::new("tags_1");

        let result: Result<Vec<i64>, AppError> = cache
            .get_or_compute_keyed(&key, true, || async {
                Err(AppError::Upstream("database is down".to_string()))
            })
            .await;
        assert_eq!(
            result.unwrap_err(),
            AppError::Upstream("database is down".to_string())
        );

        let calls = AtomicUsize::new(0);
        counted(&cache, &key, true, &calls).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_criteria_entry_point_honours_is_cache() {
        let cache = CacheManager::new(Some(Duration::from_secs(60)), 100);
        let calls = AtomicUsize::new(0);
        let mut query = TagQuery::default();

        for _ in 0..2 {
            let _: Vec<i64> = cache
                .get_or_compute(TagQuery::NAMESPACE, &query, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1])
                })
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        query.base.is_cache = true;
        for _ in 0..2 {
            let _: Vec<i64> = cache
                .get_or_compute(TagQuery::NAMESPACE, &query, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1])
                })
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_invalidate_namespace() {
        let cache = CacheManager::new(Some(Duration::from_secs(60)), 100);
        let tags = CacheKey::new("tags_1");
        let blogs = CacheKey::new("blogs_1");
        let calls = AtomicUsize::new(0);

        counted(&cache, &tags, true, &calls).await.unwrap();
        counted(&cache, &blogs, true, &calls).await.unwrap();
        cache.invalidate_namespace("tags").await;
        counted(&cache, &tags, true, &calls).await.unwrap();
        counted(&cache, &blogs, true, &calls).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
