/// Generic TTL cache shared by the client control layer and the gateway
///
/// Thread-safe, generic over key/value types. One entry per key with its own
/// fetch timestamp; absent entries are always stale. A failed fetch never
/// overwrites a present value, so stale-but-present data survives for display.
///
/// Two strengthenings over a plain read-through cache:
/// - per-key in-flight coalescing: a second caller awaiting the same key
///   re-checks freshness once the first fetch lands instead of fetching again
/// - monotonic write sequence numbers: a slow response can never overwrite a
///   newer one, regardless of arrival order
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use crate::errors::{ControlError, ControlResult};

/// Cache entry with TTL tracking
///
/// `fetched_at == None` marks the entry stale while keeping the last value
/// around for `peek`.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: Option<V>,
    fetched_at: Option<Instant>,
    write_seq: u64,
}

impl<V> Default for CacheEntry<V> {
    fn default() -> Self {
        Self {
            value: None,
            fetched_at: None,
            write_seq: 0,
        }
    }
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.value.is_some()
            && self
                .fetched_at
                .map(|t| t.elapsed() < ttl)
                .unwrap_or(false)
    }
}

/// Cache metrics for monitoring
#[derive(Debug, Clone, Default)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub coalesced: u64,
    pub inserts: u64,
    pub invalidations: u64,
    pub fetch_errors: u64,
}

impl CacheMetrics {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

pub struct TtlCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    // One async mutex per key serializes fetches for that key only
    fetch_locks: Mutex<HashMap<K, Arc<tokio::sync::Mutex<()>>>>,
    metrics: Mutex<CacheMetrics>,
    seq: AtomicU64,
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            fetch_locks: Mutex::new(HashMap::new()),
            metrics: Mutex::new(CacheMetrics::default()),
            seq: AtomicU64::new(0),
        }
    }

    /// Read-through get: returns the cached value while it is younger than
    /// `ttl`, otherwise runs `fetcher` and stores its result.
    ///
    /// Fetcher failures propagate to the caller and leave the entry untouched.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, ttl: Duration, fetcher: F) -> ControlResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ControlResult<V>>,
    {
        if let Some(value) = self.fresh_value(&key, ttl) {
            self.bump(|m| m.hits += 1);
            return Ok(value);
        }

        let lock = self.fetch_lock(&key);
        let _guard = lock.lock().await;

        // Another caller may have filled the entry while we waited
        if let Some(value) = self.fresh_value(&key, ttl) {
            self.bump(|m| {
                m.hits += 1;
                m.coalesced += 1;
            });
            return Ok(value);
        }

        self.bump(|m| m.misses += 1);
        let seq = self.reserve_seq();

        match fetcher().await {
            Ok(value) => {
                self.store_at(&key, value.clone(), seq);
                Ok(value)
            }
            Err(e) => {
                self.bump(|m| m.fetch_errors += 1);
                Err(e)
            }
        }
    }

    /// Mark the entry stale without dropping the last value
    pub fn invalidate(&self, key: &K) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.get_mut(key) {
            entry.fetched_at = None;
        }
        drop(entries);
        self.bump(|m| m.invalidations += 1);
    }

    /// Last known value regardless of freshness (for last-known-good display)
    pub fn peek(&self, key: &K) -> Option<V> {
        self.entries
            .lock()
            .unwrap()
            .get(key)
            .and_then(|e| e.value.clone())
    }

    /// Whether a `get_or_fetch` right now would hit without fetching
    pub fn is_fresh(&self, key: &K, ttl: Duration) -> bool {
        self.entries
            .lock()
            .unwrap()
            .get(key)
            .map(|e| e.is_fresh(ttl))
            .unwrap_or(false)
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.metrics.lock().unwrap().clone()
    }

    fn fresh_value(&self, key: &K, ttl: Duration) -> Option<V> {
        let entries = self.entries.lock().unwrap();
        entries
            .get(key)
            .filter(|e| e.is_fresh(ttl))
            .and_then(|e| e.value.clone())
    }

    fn fetch_lock(&self, key: &K) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.fetch_locks.lock().unwrap();
        locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    pub(crate) fn reserve_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Store a fetch result unless a newer write already landed for this key
    pub(crate) fn store_at(&self, key: &K, value: V, seq: u64) {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.entry(key.clone()).or_default();
        if seq > entry.write_seq {
            entry.value = Some(value);
            entry.fetched_at = Some(Instant::now());
            entry.write_seq = seq;
            drop(entries);
            self.bump(|m| m.inserts += 1);
        }
    }

    fn bump<F: FnOnce(&mut CacheMetrics)>(&self, f: F) {
        f(&mut self.metrics.lock().unwrap());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_fetcher(
        counter: Arc<AtomicUsize>,
        value: f64,
    ) -> impl FnOnce() -> std::pin::Pin<Box<dyn Future<Output = ControlResult<f64>> + Send>> {
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { Ok(value) })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_hit_skips_fetcher() {
        let cache: TtlCache<&str, f64> = TtlCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let ttl = Duration::from_millis(120_000);

        let v = cache
            .get_or_fetch("portfolio", ttl, counting_fetcher(calls.clone(), 15.89))
            .await
            .unwrap();
        assert_eq!(v, 15.89);

        tokio::time::advance(Duration::from_millis(60_000)).await;
        let v = cache
            .get_or_fetch("portfolio", ttl, counting_fetcher(calls.clone(), 99.0))
            .await
            .unwrap();
        assert_eq!(v, 15.89, "within TTL the cached value is served");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.metrics().hits, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_triggers_exactly_one_fetch() {
        let cache: TtlCache<&str, f64> = TtlCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let ttl = Duration::from_millis(120_000);

        cache
            .get_or_fetch("portfolio", ttl, counting_fetcher(calls.clone(), 15.89))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_millis(121_000)).await;
        let v = cache
            .get_or_fetch("portfolio", ttl, counting_fetcher(calls.clone(), 16.02))
            .await
            .unwrap();
        assert_eq!(v, 16.02);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // freshly refetched: next get is a hit again
        let v = cache
            .get_or_fetch("portfolio", ttl, counting_fetcher(calls.clone(), 0.0))
            .await
            .unwrap();
        assert_eq!(v, 16.02);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_forces_fetch_regardless_of_age() {
        let cache: TtlCache<&str, f64> = TtlCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let ttl = Duration::from_secs(3600);

        cache
            .get_or_fetch("config", ttl, counting_fetcher(calls.clone(), 1.0))
            .await
            .unwrap();
        cache.invalidate(&"config");

        let v = cache
            .get_or_fetch("config", ttl, counting_fetcher(calls.clone(), 2.0))
            .await
            .unwrap();
        assert_eq!(v, 2.0);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failure_preserves_stale_value() {
        let cache: TtlCache<&str, f64> = TtlCache::new();
        let ttl = Duration::from_millis(10);

        cache
            .get_or_fetch("portfolio", ttl, || async { Ok(7.5) })
            .await
            .unwrap();
        tokio::time::advance(Duration::from_millis(20)).await;

        let err = cache
            .get_or_fetch("portfolio", ttl, || async {
                Err::<f64, _>(ControlError::Daemon("refresh failed".into()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ControlError::Daemon(_)));

        // the stale value is still there for display
        assert_eq!(cache.peek(&"portfolio"), Some(7.5));
        assert_eq!(cache.metrics().fetch_errors, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_misses_coalesce_into_one_fetch() {
        let cache: Arc<TtlCache<&str, f64>> = Arc::new(TtlCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let ttl = Duration::from_secs(60);

        let slow = |calls: Arc<AtomicUsize>| {
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(42.0)
            }
        };

        let a = {
            let cache = cache.clone();
            let calls = calls.clone();
            tokio::spawn(async move { cache.get_or_fetch("status", ttl, slow(calls)).await })
        };
        let b = {
            let cache = cache.clone();
            let calls = calls.clone();
            tokio::spawn(async move { cache.get_or_fetch("status", ttl, slow(calls)).await })
        };

        assert_eq!(a.await.unwrap().unwrap(), 42.0);
        assert_eq!(b.await.unwrap().unwrap(), 42.0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.metrics().coalesced, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_response_never_overwrites_newer_one() {
        let cache: TtlCache<&str, f64> = TtlCache::new();
        let old_seq = cache.reserve_seq();
        let new_seq = cache.reserve_seq();

        cache.store_at(&"portfolio", 16.0, new_seq);
        // the older request resolves late; its write must be discarded
        cache.store_at(&"portfolio", 15.0, old_seq);

        assert_eq!(cache.peek(&"portfolio"), Some(16.0));
    }

    #[tokio::test(start_paused = true)]
    async fn keys_expire_independently() {
        let cache: TtlCache<&str, f64> = TtlCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_fetch("portfolio", Duration::from_millis(100), counting_fetcher(calls.clone(), 1.0))
            .await
            .unwrap();
        cache
            .get_or_fetch("history", Duration::from_secs(600), counting_fetcher(calls.clone(), 2.0))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_millis(200)).await;
        assert!(!cache.is_fresh(&"portfolio", Duration::from_millis(100)));
        assert!(cache.is_fresh(&"history", Duration::from_secs(600)));
    }
}
