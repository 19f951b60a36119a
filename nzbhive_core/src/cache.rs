//! Memoization of aggregation outcomes.
//!
//! Keyed on the canonical request signature (`SearchRequest::signature`),
//! the cache stores the full deduplicated, unpaginated result set; callers
//! paginate from it on every read. A per-signature async mutex guarantees at
//! most one concurrent computation per signature - concurrent identical
//! requests serialize behind the in-flight one and share its result. Failed
//! computations are never cached.
//!
//! The alternative policy (offset/limit as part of the key) would let pages
//! expire independently but re-runs the provider fan-out on every page flip;
//! it is deliberately not implemented.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::error::SearchError;

struct Slot<V> {
    value: Option<(Instant, V)>,
}

pub struct SearchCache<V> {
    ttl: Duration,
    slots: Mutex<HashMap<String, Arc<Mutex<Slot<V>>>>>,
}

impl<V: Clone> SearchCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value for `signature` if fresh, otherwise run
    /// `compute` and store its result.
    pub async fn get_or_compute<F, Fut>(
        &self,
        signature: &str,
        compute: F,
    ) -> Result<V, SearchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, SearchError>>,
    {
        // The outer map lock is held only long enough to find the slot;
        // distinct signatures never block each other.
        let slot = {
            let mut slots = self.slots.lock().await;
            Arc::clone(
                slots
                    .entry(signature.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(Slot { value: None }))),
            )
        };

        let mut guard = slot.lock().await;
        if let Some((stored_at, value)) = &guard.value {
            if stored_at.elapsed() < self.ttl {
                return Ok(value.clone());
            }
        }

        let value = compute().await?;
        guard.value = Some((Instant::now(), value.clone()));
        Ok(value)
    }

    /// Drop every entry. Called on configuration changes that affect
    /// provider selection.
    pub async fn invalidate_all(&self) {
        self.slots.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_compute(
        counter: Arc<AtomicUsize>,
    ) -> impl Future<Output = Result<u32, SearchError>> {
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(42)
        }
    }

    #[tokio::test]
    async fn test_second_call_served_from_cache() {
        let cache = SearchCache::new(Duration::from_secs(60));
        let counter = Arc::new(AtomicUsize::new(0));

        let a = cache
            .get_or_compute("sig", || counting_compute(Arc::clone(&counter)))
            .await
            .unwrap();
        let b = cache
            .get_or_compute("sig", || counting_compute(Arc::clone(&counter)))
            .await
            .unwrap();

        assert_eq!(a, b);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_single_flight_concurrent_callers() {
        let cache = Arc::new(SearchCache::new(Duration::from_secs(60)));
        let counter = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let counter = Arc::clone(&counter);
                tokio::spawn(async move {
                    cache
                        .get_or_compute("sig", || async move {
                            counter.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            Ok(7u32)
                        })
                        .await
                        .unwrap()
                })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap(), 7);
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ttl_expiry_recomputes() {
        let cache = SearchCache::new(Duration::from_millis(10));
        let counter = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_compute("sig", || counting_compute(Arc::clone(&counter)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        cache
            .get_or_compute("sig", || counting_compute(Arc::clone(&counter)))
            .await
            .unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_compute_not_cached() {
        let cache: SearchCache<u32> = SearchCache::new(Duration::from_secs(60));
        let counter = Arc::new(AtomicUsize::new(0));

        let failing = cache
            .get_or_compute("sig", || async {
                Err(SearchError::AllProvidersFailed { attempted: 2 })
            })
            .await;
        assert!(failing.is_err());

        let ok = cache
            .get_or_compute("sig", || counting_compute(Arc::clone(&counter)))
            .await
            .unwrap();
        assert_eq!(ok, 42);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let cache = SearchCache::new(Duration::from_secs(60));
        let counter = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_compute("sig", || counting_compute(Arc::clone(&counter)))
            .await
            .unwrap();
        cache.invalidate_all().await;
        cache
            .get_or_compute("sig", || counting_compute(Arc::clone(&counter)))
            .await
            .unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_distinct_signatures_do_not_share() {
        let cache = SearchCache::new(Duration::from_secs(60));
        let counter = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_compute("a", || counting_compute(Arc::clone(&counter)))
            .await
            .unwrap();
        cache
            .get_or_compute("b", || counting_compute(Arc::clone(&counter)))
            .await
            .unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
