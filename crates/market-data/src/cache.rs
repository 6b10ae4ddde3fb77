use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use signal_core::SignalError;

/// Freshness policy for one cache namespace.
#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    /// Entries younger than this are served without fetching.
    pub expiry: Duration,
    /// Hard floor between underlying fetches for one key. Overrides
    /// `force`, protecting rate-limited upstreams.
    pub min_interval: Duration,
}

impl CachePolicy {
    pub fn new(expiry: Duration, min_interval: Duration) -> Self {
        Self { expiry, min_interval }
    }
}

/// Cache entry with fetch timestamp. Replaced, never mutated, on refresh.
struct CacheEntry<V> {
    value: V,
    fetched_at: DateTime<Utc>,
}

/// Thread-safe key → (value, fetch-time) store for one namespace of
/// expensive upstream data.
///
/// Entries live in a sharded map, so reads and distinct-key writes never
/// contend. The underlying fetch always runs with no map guard held: a
/// lock held across a network call would serialize the whole screener.
pub struct TimeSeriesCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    policy: CachePolicy,
}

impl<V: Clone> TimeSeriesCache<V> {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            entries: DashMap::new(),
            policy,
        }
    }

    /// Return the cached value for `key`, or run `fetch_fn` and commit its
    /// result.
    ///
    /// - Fresh entry and no `force`: cached value, no fetch.
    /// - Any entry fetched within `min_interval`: cached value, no fetch,
    ///   even when `force` is set or the entry has expired.
    /// - Otherwise the fetch runs; on success the entry is replaced with
    ///   the new value and timestamp. On failure the error propagates and
    ///   the cache keeps whatever it had, so a transient upstream failure
    ///   never evicts stale-but-valid data.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: &str,
        force: bool,
        fetch_fn: F,
    ) -> Result<V, SignalError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, SignalError>>,
    {
        let now = Utc::now();

        // Read under the shard guard, then release it before any await.
        if let Some(entry) = self.entries.get(key) {
            let age = now - entry.fetched_at;
            if age < self.policy.min_interval {
                return Ok(entry.value.clone());
            }
            if age < self.policy.expiry && !force {
                return Ok(entry.value.clone());
            }
        }

        let value = fetch_fn().await?;
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.clone(),
                fetched_at: Utc::now(),
            },
        );
        Ok(value)
    }

    /// Age of the entry for `key`, if present.
    pub fn age(&self, key: &str) -> Option<Duration> {
        self.entries.get(key).map(|e| Utc::now() - e.fetched_at)
    }

    /// Peek at a cached value without fetching or freshness checks.
    pub fn peek(&self, key: &str) -> Option<V> {
        self.entries.get(key).map(|e| e.value.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    fn backdate(&self, key: &str, age: Duration) {
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.fetched_at = Utc::now() - age;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn policy_minutes(expiry: i64, min_interval: i64) -> CachePolicy {
        CachePolicy::new(Duration::minutes(expiry), Duration::minutes(min_interval))
    }

    #[tokio::test]
    async fn test_second_call_within_expiry_hits_cache() {
        let cache = TimeSeriesCache::new(policy_minutes(60, 1));
        let fetches = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let fetches = Arc::clone(&fetches);
            let value = cache
                .get_or_fetch("AAPL", false, move || async move {
                    fetches.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                })
                .await
                .unwrap();
            assert_eq!(value, 42);
        }

        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_force_within_min_interval_returns_cached() {
        let cache = TimeSeriesCache::new(policy_minutes(60, 5));
        let fetches = Arc::new(AtomicUsize::new(0));

        let count = Arc::clone(&fetches);
        cache
            .get_or_fetch("news", false, move || async move {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(1)
            })
            .await
            .unwrap();

        // Forced refresh immediately after: the floor wins.
        let count = Arc::clone(&fetches);
        let value = cache
            .get_or_fetch("news", true, move || async move {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(2)
            })
            .await
            .unwrap();

        assert_eq!(value, 1);
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_min_interval_floor_holds_for_stale_entry() {
        // min_interval longer than expiry: entry is expired but the floor
        // still suppresses the forced refetch.
        let cache = TimeSeriesCache::new(CachePolicy::new(
            Duration::seconds(1),
            Duration::minutes(5),
        ));

        cache
            .get_or_fetch("k", false, || async { Ok(7) })
            .await
            .unwrap();
        cache.backdate("k", Duration::seconds(90));

        let value = cache
            .get_or_fetch("k", true, || async { Ok(8) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_force_after_min_interval_refetches() {
        let cache = TimeSeriesCache::new(policy_minutes(60, 5));

        cache
            .get_or_fetch("k", false, || async { Ok(1) })
            .await
            .unwrap();
        cache.backdate("k", Duration::minutes(6));

        let value = cache
            .get_or_fetch("k", true, || async { Ok(2) })
            .await
            .unwrap();
        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn test_expired_entry_refetches() {
        let cache = TimeSeriesCache::new(policy_minutes(60, 1));

        cache
            .get_or_fetch("k", false, || async { Ok(1) })
            .await
            .unwrap();
        cache.backdate("k", Duration::minutes(61));

        let value = cache
            .get_or_fetch("k", false, || async { Ok(2) })
            .await
            .unwrap();
        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_previous_entry() {
        let cache = TimeSeriesCache::new(policy_minutes(60, 1));

        cache
            .get_or_fetch("k", false, || async { Ok(1) })
            .await
            .unwrap();
        cache.backdate("k", Duration::minutes(61));

        let err = cache
            .get_or_fetch("k", false, || async {
                Err::<i32, _>(SignalError::Provider("down".into()))
            })
            .await;
        assert!(err.is_err());

        // Stale value survives the failed refresh.
        assert_eq!(cache.peek("k"), Some(1));
    }

    #[tokio::test]
    async fn test_distinct_keys_fetch_independently() {
        let cache = Arc::new(TimeSeriesCache::new(policy_minutes(60, 1)));
        let fetches = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for key in ["A", "B", "C"] {
            let cache = Arc::clone(&cache);
            let fetches = Arc::clone(&fetches);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_fetch(key, false, move || async move {
                        fetches.fetch_add(1, Ordering::SeqCst);
                        Ok(key.len())
                    })
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(fetches.load(Ordering::SeqCst), 3);
        assert_eq!(cache.len(), 3);
    }
}
