//! Rolling per-indexer performance statistics.
//!
//! Consumed by operators (stats snapshots) and by the deduplicator (survivor
//! selection). Updates are per-counter atomic increments so concurrent
//! aggregation runs never block a search or tear each other's records.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::search::IndexerOutcome;

#[derive(Default)]
struct Counters {
    attempts: AtomicU64,
    successes: AtomicU64,
    response_ms: AtomicU64,
    results: AtomicU64,
}

/// Read-only view of one indexer's counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerStatsSnapshot {
    pub indexer: String,
    pub attempts: u64,
    pub successes: u64,
    /// successful fetches / attempted fetches; 0.0 before the first attempt
    pub success_rate: f64,
    pub avg_response_ms: f64,
    pub results: u64,
    /// this indexer's parsed results / results across all indexers
    pub result_share: f64,
}

impl IndexerStatsSnapshot {
    /// Whether this indexer historically outranks `other` for provenance
    /// selection: higher success rate first, then lower average response
    /// time. Equal on both axes means no preference.
    pub fn outranks(&self, other: &IndexerStatsSnapshot) -> Option<bool> {
        if self.success_rate != other.success_rate {
            return Some(self.success_rate > other.success_rate);
        }
        if self.avg_response_ms != other.avg_response_ms {
            return Some(self.avg_response_ms < other.avg_response_ms);
        }
        None
    }
}

pub struct StatsAggregator {
    per_indexer: RwLock<HashMap<String, Arc<Counters>>>,
    total_results: AtomicU64,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self {
            per_indexer: RwLock::new(HashMap::new()),
            total_results: AtomicU64::new(0),
        }
    }

    fn counters_for(&self, indexer: &str) -> Arc<Counters> {
        if let Some(counters) = self
            .per_indexer
            .read()
            .expect("stats lock poisoned")
            .get(indexer)
        {
            return Arc::clone(counters);
        }
        let mut map = self.per_indexer.write().expect("stats lock poisoned");
        Arc::clone(map.entry(indexer.to_string()).or_default())
    }

    /// Fold one aggregation run's outcome records into the counters.
    pub fn record_outcomes(&self, outcomes: &[IndexerOutcome]) {
        for outcome in outcomes {
            let counters = self.counters_for(&outcome.indexer);
            counters.attempts.fetch_add(1, Ordering::Relaxed);
            if outcome.success {
                counters.successes.fetch_add(1, Ordering::Relaxed);
                counters
                    .results
                    .fetch_add(outcome.result_count as u64, Ordering::Relaxed);
                self.total_results
                    .fetch_add(outcome.result_count as u64, Ordering::Relaxed);
            }
            counters
                .response_ms
                .fetch_add(outcome.elapsed_ms, Ordering::Relaxed);
        }
    }

    pub fn snapshot_for(&self, indexer: &str) -> Option<IndexerStatsSnapshot> {
        let map = self.per_indexer.read().expect("stats lock poisoned");
        let counters = map.get(indexer)?;
        Some(self.build_snapshot(indexer, counters))
    }

    /// Read-only snapshots for every indexer seen so far, sorted by name.
    pub fn snapshot(&self) -> Vec<IndexerStatsSnapshot> {
        let map = self.per_indexer.read().expect("stats lock poisoned");
        let mut snapshots: Vec<_> = map
            .iter()
            .map(|(name, counters)| self.build_snapshot(name, counters))
            .collect();
        snapshots.sort_by(|a, b| a.indexer.cmp(&b.indexer));
        snapshots
    }

    fn build_snapshot(&self, indexer: &str, counters: &Counters) -> IndexerStatsSnapshot {
        let attempts = counters.attempts.load(Ordering::Relaxed);
        let successes = counters.successes.load(Ordering::Relaxed);
        let response_ms = counters.response_ms.load(Ordering::Relaxed);
        let results = counters.results.load(Ordering::Relaxed);
        let total = self.total_results.load(Ordering::Relaxed);

        IndexerStatsSnapshot {
            indexer: indexer.to_string(),
            attempts,
            successes,
            success_rate: if attempts > 0 {
                successes as f64 / attempts as f64
            } else {
                0.0
            },
            avg_response_ms: if attempts > 0 {
                response_ms as f64 / attempts as f64
            } else {
                0.0
            },
            results,
            result_share: if total > 0 {
                results as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    pub fn reset(&self) {
        self.per_indexer
            .write()
            .expect("stats lock poisoned")
            .clear();
        self.total_results.store(0, Ordering::Relaxed);
    }
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_snapshot() {
        let stats = StatsAggregator::new();
        stats.record_outcomes(&[
            IndexerOutcome::ok("alpha", 100, 10),
            IndexerOutcome::failed("alpha", 500, "boom", false),
            IndexerOutcome::ok("beta", 300, 30),
        ]);

        let alpha = stats.snapshot_for("alpha").unwrap();
        assert_eq!(alpha.attempts, 2);
        assert_eq!(alpha.successes, 1);
        assert_eq!(alpha.success_rate, 0.5);
        assert_eq!(alpha.avg_response_ms, 300.0);
        assert_eq!(alpha.results, 10);
        assert_eq!(alpha.result_share, 0.25);

        let beta = stats.snapshot_for("beta").unwrap();
        assert_eq!(beta.success_rate, 1.0);
        assert_eq!(beta.result_share, 0.75);
    }

    #[test]
    fn test_outranks() {
        let stats = StatsAggregator::new();
        stats.record_outcomes(&[
            IndexerOutcome::ok("fast", 100, 5),
            IndexerOutcome::ok("slow", 900, 5),
            IndexerOutcome::failed("flaky", 100, "timeout", true),
        ]);

        let fast = stats.snapshot_for("fast").unwrap();
        let slow = stats.snapshot_for("slow").unwrap();
        let flaky = stats.snapshot_for("flaky").unwrap();

        // Same success rate: lower average response wins
        assert_eq!(fast.outranks(&slow), Some(true));
        // Higher success rate beats everything
        assert_eq!(slow.outranks(&flaky), Some(true));
        // Self-comparison is a tie
        assert_eq!(fast.outranks(&fast.clone()), None);
    }

    #[test]
    fn test_reset() {
        let stats = StatsAggregator::new();
        stats.record_outcomes(&[IndexerOutcome::ok("alpha", 100, 10)]);
        stats.reset();
        assert!(stats.snapshot().is_empty());
        assert!(stats.snapshot_for("alpha").is_none());
    }

    #[test]
    fn test_zero_results_success_still_counts() {
        let stats = StatsAggregator::new();
        stats.record_outcomes(&[IndexerOutcome::ok("alpha", 50, 0)]);
        let alpha = stats.snapshot_for("alpha").unwrap();
        assert_eq!(alpha.success_rate, 1.0);
        assert_eq!(alpha.results, 0);
    }
}
