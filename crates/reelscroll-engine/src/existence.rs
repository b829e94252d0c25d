//! Batched existence checking.
//!
//! Answers "which of these IDs have at least one match?" with as few round
//! trips as the membership cache allows. Unknown IDs are probed one count
//! query per ID, grouped into small batches with a bounded number of
//! batches in flight.

use std::collections::HashSet;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

use reelscroll_core::Result;

use crate::membership::MembershipCache;

/// Remote predicate probe.
#[async_trait]
pub trait ExistenceProbe: Send + Sync {
    /// Number of matches for a single ID.
    async fn count_one(&self, id: &str) -> Result<u64>;

    /// Combined match count across `ids`, used as a fast exit when it is
    /// zero. `None` when the probe has no aggregate form.
    async fn count_any(&self, _ids: &[String]) -> Option<Result<u64>> {
        None
    }
}

/// Existence checker with its own membership cache.
pub struct ExistenceChecker {
    name: &'static str,
    members: Mutex<MembershipCache>,
    batch_size: usize,
    max_concurrent_batches: usize,
}

impl ExistenceChecker {
    pub fn new(
        name: &'static str,
        membership_max: usize,
        batch_size: usize,
        max_concurrent_batches: usize,
    ) -> Self {
        Self {
            name,
            members: Mutex::new(MembershipCache::new(name, membership_max)),
            batch_size: batch_size.max(1),
            max_concurrent_batches: max_concurrent_batches.max(1),
        }
    }

    /// Subset of `ids` known or newly confirmed to satisfy the probe.
    pub async fn check(&self, ids: &HashSet<String>, probe: &dyn ExistenceProbe) -> HashSet<String> {
        let (mut confirmed, mut unknown) = {
            let members = self.members.lock().await;
            let mut known = HashSet::new();
            let mut unknown = Vec::new();
            for id in ids {
                if members.contains(id) {
                    known.insert(id.clone());
                } else {
                    unknown.push(id.clone());
                }
            }
            (known, unknown)
        };

        if unknown.is_empty() {
            return confirmed;
        }
        unknown.sort();

        if let Some(Ok(0)) = probe.count_any(&unknown).await {
            debug!(
                subsystem = "engine",
                component = "existence",
                checker = self.name,
                id_count = unknown.len(),
                "Aggregate probe found nothing, skipping batches"
            );
            return confirmed;
        }

        let batches: Vec<Vec<String>> = unknown
            .chunks(self.batch_size)
            .map(<[String]>::to_vec)
            .collect();
        let batch_count = batches.len();

        let mut results = stream::iter(batches)
            .map(|batch| probe_batch(self.name, probe, batch))
            .buffer_unordered(self.max_concurrent_batches);

        let mut found = Vec::new();
        while let Some(positives) = results.next().await {
            found.extend(positives);
        }

        {
            let mut members = self.members.lock().await;
            for id in &found {
                members.insert(id);
            }
        }

        debug!(
            subsystem = "engine",
            component = "existence",
            checker = self.name,
            id_count = unknown.len(),
            batches = batch_count,
            result_count = found.len(),
            "Existence check finished"
        );

        confirmed.extend(found);
        confirmed
    }

    /// Number of cached members.
    pub async fn known_count(&self) -> usize {
        self.members.lock().await.len()
    }
}

async fn probe_batch(
    checker: &'static str,
    probe: &dyn ExistenceProbe,
    batch: Vec<String>,
) -> Vec<String> {
    let counts = futures::future::join_all(batch.iter().map(|id| probe.count_one(id))).await;

    batch
        .into_iter()
        .zip(counts)
        .filter_map(|(id, count)| match count {
            Ok(n) if n > 0 => {
                trace!(checker, id = %id, count = n, "Probe positive");
                Some(id)
            }
            Ok(_) => None,
            Err(e) => {
                warn!(
                    subsystem = "engine",
                    component = "existence",
                    checker,
                    id = %id,
                    error = %e,
                    "Probe failed, treating as not confirmed"
                );
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelscroll_core::Error;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    #[derive(Default)]
    struct CountingProbe {
        counts: HashMap<String, Result<u64>>,
        aggregate: Option<u64>,
        probed: StdMutex<Vec<String>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl CountingProbe {
        fn with(pairs: &[(&str, u64)]) -> Self {
            Self {
                counts: pairs.iter().map(|(k, v)| (k.to_string(), Ok(*v))).collect(),
                ..Default::default()
            }
        }

        fn probed(&self) -> Vec<String> {
            self.probed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ExistenceProbe for CountingProbe {
        async fn count_one(&self, id: &str) -> Result<u64> {
            self.probed.lock().unwrap().push(id.to_string());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.counts.get(id).cloned().unwrap_or(Ok(0))
        }

        async fn count_any(&self, _ids: &[String]) -> Option<Result<u64>> {
            self.aggregate.map(Ok)
        }
    }

    fn ids(list: &[&str]) -> HashSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_returns_positive_ids_only() {
        let checker = ExistenceChecker::new("tags", 100, 5, 3);
        let probe = CountingProbe::with(&[("1", 3), ("2", 0), ("3", 1)]);
        let found = checker.check(&ids(&["1", "2", "3"]), &probe).await;
        assert_eq!(found, ids(&["1", "3"]));
    }

    #[tokio::test]
    async fn test_confirmed_ids_are_not_reprobed() {
        let checker = ExistenceChecker::new("tags", 100, 5, 3);
        let probe = CountingProbe::with(&[("1", 3), ("2", 0)]);
        checker.check(&ids(&["1", "2"]), &probe).await;
        checker.check(&ids(&["1", "2"]), &probe).await;

        let probed = probe.probed();
        assert_eq!(probed.iter().filter(|id| *id == "1").count(), 1);
        // Negatives are not cached.
        assert_eq!(probed.iter().filter(|id| *id == "2").count(), 2);
    }

    #[tokio::test]
    async fn test_probe_errors_count_as_unconfirmed() {
        let checker = ExistenceChecker::new("tags", 100, 5, 3);
        let mut probe = CountingProbe::with(&[("1", 2)]);
        probe
            .counts
            .insert("bad".into(), Err(Error::Transport("500".into())));
        let found = checker.check(&ids(&["1", "bad"]), &probe).await;
        assert_eq!(found, ids(&["1"]));
    }

    #[tokio::test]
    async fn test_aggregate_zero_skips_batches() {
        let checker = ExistenceChecker::new("tags", 100, 5, 3);
        let probe = CountingProbe {
            aggregate: Some(0),
            ..CountingProbe::with(&[("1", 2)])
        };
        let found = checker.check(&ids(&["1", "2"]), &probe).await;
        assert!(found.is_empty());
        assert!(probe.probed().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_window_is_bounded() {
        let checker = ExistenceChecker::new("tags", 100, 5, 3);
        let probe = CountingProbe::default();
        let many: HashSet<String> = (0..40).map(|i| i.to_string()).collect();
        checker.check(&many, &probe).await;

        assert_eq!(probe.probed().len(), 40);
        // 3 batches of 5 IDs each, overlapping.
        let max_in_flight = probe.max_in_flight.load(Ordering::SeqCst);
        assert!(max_in_flight > 5, "batches ran serially: {}", max_in_flight);
        assert!(max_in_flight <= 15);
    }
}
