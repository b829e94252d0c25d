//! Bounded set of IDs known to satisfy an existence predicate.

use lru::LruCache;
use tracing::debug;

/// Positive-only membership cache.
///
/// Members are kept in insertion order; lookups never reorder them. When the
/// set grows past its cap it is compacted down to half the cap, keeping the
/// most recently added members.
pub struct MembershipCache {
    name: &'static str,
    members: LruCache<String, ()>,
    max: usize,
}

impl MembershipCache {
    pub fn new(name: &'static str, max: usize) -> Self {
        Self {
            name,
            members: LruCache::unbounded(),
            max: max.max(2),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    /// Record `id` as a confirmed member.
    pub fn insert(&mut self, id: &str) {
        if self.members.contains(id) {
            return;
        }
        self.members.put(id.to_string(), ());
        if self.members.len() > self.max {
            self.compact();
        }
    }

    fn compact(&mut self) {
        let keep = self.max / 2;
        let before = self.members.len();
        while self.members.len() > keep {
            self.members.pop_lru();
        }
        debug!(
            subsystem = "engine",
            component = "membership",
            cache = self.name,
            evicted = before - self.members.len(),
            "Compacted membership cache"
        );
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
