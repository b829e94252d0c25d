//! In-process result cache for read-only query results.
//!
//! Entries expire a fixed TTL after they were written. Expiry is checked
//! lazily on read and eagerly by [`spawn_sweeper`], which also trims the
//! cache back to its cap by dropping the oldest-written entries.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use reelscroll_core::{defaults, RequestSignature};

/// Result cache keyed by request signature.
#[derive(Clone)]
pub struct ResultCache<T> {
    inner: Arc<ResultCacheInner<T>>,
}

struct ResultCacheInner<T> {
    entries: Mutex<HashMap<RequestSignature, CacheEntry<T>>>,
    ttl: Duration,
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

struct CacheEntry<T> {
    value: T,
    stored_at: Instant,
}

/// Cache statistics for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl<T: Clone + Send + 'static> ResultCache<T> {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            inner: Arc::new(ResultCacheInner {
                entries: Mutex::new(HashMap::new()),
                ttl,
                max_entries,
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
            }),
        }
    }

    /// Cached value for `signature`, if present and younger than the TTL.
    pub async fn get(&self, signature: &RequestSignature) -> Option<T> {
        let mut entries = self.inner.entries.lock().await;
        let fresh = match entries.get(signature) {
            Some(entry) if entry.stored_at.elapsed() < self.inner.ttl => {
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(signature);
                None
            }
            None => None,
        };
        drop(entries);

        match fresh {
            Some(value) => {
                self.inner.hits.fetch_add(1, Ordering::Relaxed);
                debug!(
                    subsystem = "engine",
                    component = "result_cache",
                    signature = %signature,
                    "Cache HIT"
                );
                Some(value)
            }
            None => {
                self.inner.misses.fetch_add(1, Ordering::Relaxed);
                debug!(
                    subsystem = "engine",
                    component = "result_cache",
                    signature = %signature,
                    "Cache MISS"
                );
                None
            }
        }
    }

    /// Store a completed result. Overwrites restart the TTL.
    pub async fn set(&self, signature: RequestSignature, value: T) {
        let mut entries = self.inner.entries.lock().await;
        debug!(
            subsystem = "engine",
            component = "result_cache",
            signature = %signature,
            ttl_secs = self.inner.ttl.as_secs(),
            "Cache SET"
        );
        entries.insert(
            signature,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop expired entries, then the oldest-written ones until the cache
    /// is within its cap. Returns the number of entries removed.
    pub async fn sweep(&self) -> usize {
        let mut entries = self.inner.entries.lock().await;
        let before = entries.len();
        let ttl = self.inner.ttl;
        entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);

        if entries.len() > self.inner.max_entries {
            let mut by_age: Vec<(RequestSignature, Instant)> = entries
                .iter()
                .map(|(sig, entry)| (sig.clone(), entry.stored_at))
                .collect();
            by_age.sort_by_key(|(_, stored_at)| *stored_at);
            let excess = entries.len() - self.inner.max_entries;
            for (sig, _) in by_age.into_iter().take(excess) {
                entries.remove(&sig);
            }
        }

        before - entries.len()
    }

    /// Remove every entry.
    pub async fn clear(&self) {
        self.inner.entries.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.inner.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            entries: self.len().await,
        }
    }
}

/// Spawn the periodic sweep task. It runs until `shutdown` is cancelled.
///
/// Intervals below [`defaults::MIN_SWEEP_INTERVAL_MS`] are raised to it.
pub fn spawn_sweeper<T>(
    cache: ResultCache<T>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()>
where
    T: Clone + Send + Sync + 'static,
{
    let interval = interval.max(Duration::from_millis(defaults::MIN_SWEEP_INTERVAL_MS));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let evicted = cache.sweep().await;
                    debug!(
                        subsystem = "engine",
                        component = "result_cache",
                        evicted,
                        "Cache sweep finished"
                    );
                }
            }
        }

        info!(
            subsystem = "engine",
            component = "result_cache",
            "Cache sweeper stopped"
        );
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(term: &str) -> RequestSignature {
        RequestSignature::builder("FindTags").term("q", term).build()
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_before_and_after_ttl() {
        let cache = ResultCache::new(Duration::from_secs(300), 100);
        cache.set(sig("beach"), vec![1, 2]).await;

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get(&sig("beach")).await, Some(vec![1, 2]));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get(&sig("beach")).await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_restarts_ttl() {
        let cache = ResultCache::new(Duration::from_secs(10), 100);
        cache.set(sig("a"), 1).await;
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.set(sig("a"), 2).await;
        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get(&sig("a")).await, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_expired() {
        let cache = ResultCache::new(Duration::from_secs(10), 100);
        cache.set(sig("old"), 1).await;
        tokio::time::advance(Duration::from_secs(6)).await;
        cache.set(sig("new"), 2).await;
        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(cache.sweep().await, 1);
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get(&sig("new")).await, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_evicts_oldest_written_over_cap() {
        let cache = ResultCache::new(Duration::from_secs(300), 2);
        for term in ["first", "second", "third", "fourth"] {
            cache.set(sig(term), term.to_string()).await;
            tokio::time::advance(Duration::from_secs(1)).await;
        }
        // Reading does not refresh write order.
        assert!(cache.get(&sig("first")).await.is_some());

        assert_eq!(cache.sweep().await, 2);
        assert_eq!(cache.get(&sig("first")).await, None);
        assert_eq!(cache.get(&sig("second")).await, None);
        assert_eq!(cache.get(&sig("fourth")).await.as_deref(), Some("fourth"));
    }

    #[tokio::test]
    async fn test_stats_count_hits_and_misses() {
        let cache = ResultCache::new(Duration::from_secs(300), 10);
        cache.get(&sig("x")).await;
        cache.set(sig("x"), 1).await;
        cache.get(&sig("x")).await;
        let stats = cache.stats().await;
        assert_eq!(
            stats,
            CacheStats {
                hits: 1,
                misses: 1,
                entries: 1
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_runs_and_stops() {
        let cache = ResultCache::new(Duration::from_secs(5), 10);
        cache.set(sig("x"), 1).await;
        let shutdown = CancellationToken::new();
        let handle = spawn_sweeper(cache.clone(), Duration::from_secs(10), shutdown.clone());

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(cache.is_empty().await);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_sweep_interval_is_raised_to_minimum() {
        let cache = ResultCache::new(Duration::from_secs(1), 10);
        cache.set(sig("x"), 1).await;
        let shutdown = CancellationToken::new();
        let handle = spawn_sweeper(cache.clone(), Duration::ZERO, shutdown.clone());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(cache.len().await, 0);
        assert!(!handle.is_finished());

        shutdown.cancel();
        handle.await.unwrap();
    }
}
