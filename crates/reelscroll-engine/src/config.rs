//! Engine configuration.

use std::env;
use std::time::Duration;

use reelscroll_core::defaults;

/// Tunables of the query/cache engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Result-cache TTL, measured from write time.
    pub cache_ttl: Duration,
    /// Interval between periodic cache sweeps.
    pub sweep_interval: Duration,
    /// Maximum result-cache entries kept after a sweep.
    pub cache_max_entries: usize,
    /// Maximum members of each membership cache before compaction.
    pub membership_max: usize,
    /// IDs per existence-probe batch.
    pub existence_batch_size: usize,
    /// Existence-probe batches allowed in flight at once.
    pub existence_max_concurrent_batches: usize,
    /// Default feed page size.
    pub page_size: u32,
    /// Shuffle drops scenes with this many in-page markers or more.
    pub shuffle_max_markers_per_scene: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(defaults::CACHE_TTL_SECS),
            sweep_interval: Duration::from_secs(defaults::CACHE_SWEEP_INTERVAL_SECS),
            cache_max_entries: defaults::CACHE_MAX_ENTRIES,
            membership_max: defaults::MEMBERSHIP_CACHE_MAX,
            existence_batch_size: defaults::EXISTENCE_BATCH_SIZE,
            existence_max_concurrent_batches: defaults::EXISTENCE_MAX_CONCURRENT_BATCHES,
            page_size: defaults::PAGE_SIZE,
            shuffle_max_markers_per_scene: defaults::SHUFFLE_MAX_MARKERS_PER_SCENE,
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `FEED_CACHE_TTL_SECS` | `300` | Result-cache TTL |
    /// | `FEED_SWEEP_INTERVAL_SECS` | `300` | Sweep interval |
    /// | `FEED_CACHE_MAX_ENTRIES` | `100` | Result-cache cap |
    /// | `FEED_MEMBERSHIP_MAX` | `1000` | Membership-cache cap |
    /// | `FEED_PAGE_SIZE` | `20` | Feed page size |
    /// | `FEED_SHUFFLE_MAX_MARKERS` | `5` | Shuffle density threshold |
    pub fn from_env() -> Self {
        let base = Self::default();
        Self {
            cache_ttl: env_parse::<u64>("FEED_CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(base.cache_ttl),
            sweep_interval: env_parse::<u64>("FEED_SWEEP_INTERVAL_SECS")
                .filter(|&s| s > 0)
                .map(Duration::from_secs)
                .unwrap_or(base.sweep_interval),
            cache_max_entries: env_parse::<usize>("FEED_CACHE_MAX_ENTRIES")
                .unwrap_or(base.cache_max_entries),
            membership_max: env_parse::<usize>("FEED_MEMBERSHIP_MAX")
                .map(|v| v.max(2))
                .unwrap_or(base.membership_max),
            page_size: env_parse::<u32>("FEED_PAGE_SIZE")
                .map(|v| v.max(1))
                .unwrap_or(base.page_size),
            shuffle_max_markers_per_scene: env_parse::<usize>("FEED_SHUFFLE_MAX_MARKERS")
                .unwrap_or(base.shuffle_max_markers_per_scene),
            ..base
        }
    }

    /// Set the cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set the sweep interval (at least [`defaults::MIN_SWEEP_INTERVAL_MS`]).
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval.max(Duration::from_millis(defaults::MIN_SWEEP_INTERVAL_MS));
        self
    }

    /// Set the result-cache cap.
    pub fn with_cache_max_entries(mut self, max: usize) -> Self {
        self.cache_max_entries = max;
        self
    }

    /// Set the membership-cache cap.
    pub fn with_membership_max(mut self, max: usize) -> Self {
        self.membership_max = max.max(2);
        self
    }

    /// Set the feed page size (at least 1).
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Set the shuffle density threshold.
    pub fn with_shuffle_max_markers(mut self, max: usize) -> Self {
        self.shuffle_max_markers_per_scene = max;
        self
    }
}

fn env_parse<T: TryFrom<u64>>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| parse_u64_as(&v))
}

/// Parse a non-negative integer; values that do not fit `T` are rejected.
fn parse_u64_as<T: TryFrom<u64>>(raw: &str) -> Option<T> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .and_then(|v| T::try_from(v).ok())
}
