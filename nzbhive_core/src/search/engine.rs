//! The aggregation engine.
//!
//! Control flow per request: validate, consult the cache, on miss fan out to
//! every eligible indexer, normalize and filter the union, merge duplicates,
//! record stats, then rank and paginate from the full deduplicated set.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use crate::cache::SearchCache;
use crate::config::{HiveConfig, IndexerConfig};
use crate::error::SearchError;
use crate::fetch::Fetcher;
use crate::indexers;
use crate::search::types::{CanonicalResult, SearchRequest, SearchResponse, SearchType};
use crate::search::{dedup, normalize, orchestrator, rank};
use crate::stats::{IndexerStatsSnapshot, StatsAggregator};
use crate::IndexerRegistry;

struct EngineState {
    config: HiveConfig,
    registry: Arc<IndexerRegistry>,
}

pub struct SearchEngine {
    state: RwLock<EngineState>,
    fetcher: Arc<dyn Fetcher>,
    stats: Arc<StatsAggregator>,
    cache: SearchCache<Arc<Vec<CanonicalResult>>>,
}

impl SearchEngine {
    pub fn new(config: HiveConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        let registry = Arc::new(indexers::build_registry(&config));
        let ttl = Duration::from_secs(config.engine.cache_ttl_secs);
        Self {
            state: RwLock::new(EngineState { config, registry }),
            fetcher,
            stats: Arc::new(StatsAggregator::new()),
            cache: SearchCache::new(ttl),
        }
    }

    /// Run one logical search. Provider-level failures never surface here;
    /// the only caller-visible errors are an invalid request and the
    /// degraded-service case where every attempted indexer failed.
    pub async fn search(
        &self,
        use_cache: bool,
        request: &SearchRequest,
    ) -> Result<SearchResponse, SearchError> {
        validate(request)?;

        let cache_enabled = use_cache
            && self
                .state
                .read()
                .expect("engine state poisoned")
                .config
                .engine
                .cache_enabled;

        let merged = if cache_enabled {
            self.cache
                .get_or_compute(&request.signature(), || self.aggregate(request))
                .await?
        } else {
            self.aggregate(request).await?
        };

        let (results, total) = rank::rank_and_paginate(&merged, request.offset, request.limit);
        Ok(SearchResponse {
            results,
            total,
            offset: request.offset,
        })
    }

    /// The uncached fan-out path: fetch, normalize, filter, merge.
    async fn aggregate(
        &self,
        request: &SearchRequest,
    ) -> Result<Arc<Vec<CanonicalResult>>, SearchError> {
        let now = Utc::now();
        let (configs, registry, engine_config) = {
            let state = self.state.read().expect("engine state poisoned");
            (
                state.config.indexers.clone(),
                Arc::clone(&state.registry),
                state.config.engine.clone(),
            )
        };

        let (tagged, outcomes) =
            orchestrator::fetch_all(request, &configs, &registry, &self.fetcher, &engine_config)
                .await;

        self.stats.record_outcomes(&outcomes);

        let attempted = outcomes.len();
        if attempted > 0 && outcomes.iter().all(|o| !o.success) {
            return Err(SearchError::AllProvidersFailed { attempted });
        }

        let request_counts: HashMap<String, usize> = outcomes
            .iter()
            .map(|o| (o.indexer.clone(), o.result_count))
            .collect();

        let normalized: Vec<CanonicalResult> = tagged
            .into_iter()
            .map(|(indexer, candidate)| normalize::normalize(candidate, &indexer, now))
            .filter(|result| passes_filters(result, request))
            .collect();
        debug!(
            "{} candidates from {} indexers after filtering",
            normalized.len(),
            attempted
        );

        let merged = dedup::merge(normalized, &self.stats, &request_counts);
        info!(
            "aggregated {} unique results from {} attempted indexers",
            merged.len(),
            attempted
        );

        Ok(Arc::new(merged))
    }

    /// Read-only per-indexer statistics snapshots.
    pub fn stats(&self) -> Vec<IndexerStatsSnapshot> {
        self.stats.snapshot()
    }

    pub fn reset_stats(&self) {
        self.stats.reset()
    }

    /// Names of the indexers currently registered, enabled or not.
    pub fn indexer_names(&self) -> Vec<String> {
        self.state
            .read()
            .expect("engine state poisoned")
            .registry
            .names()
    }

    /// Currently configured indexers.
    pub fn indexer_configs(&self) -> Vec<IndexerConfig> {
        self.state
            .read()
            .expect("engine state poisoned")
            .config
            .indexers
            .clone()
    }

    /// Swap in a new configuration. Rebuilds the adapter registry and drops
    /// every cached result set, since provider selection affects output.
    /// The cache TTL itself is fixed at construction.
    pub async fn update_config(&self, config: HiveConfig) {
        {
            let mut state = self.state.write().expect("engine state poisoned");
            state.registry = Arc::new(indexers::build_registry(&config));
            state.config = config;
        }
        self.cache.invalidate_all().await;
    }

    pub async fn invalidate_cache(&self) {
        self.cache.invalidate_all().await;
    }
}

fn validate(request: &SearchRequest) -> Result<(), SearchError> {
    match request.search_type {
        SearchType::General => {
            if request.query.is_none() {
                return Err(SearchError::InvalidRequest(
                    "general search requires a query".to_string(),
                ));
            }
        }
        SearchType::Tv => {
            if request.query.is_none() && !request.has_identifier() {
                return Err(SearchError::InvalidRequest(
                    "tv search requires a query or a show identifier".to_string(),
                ));
            }
        }
        SearchType::Movie => {
            if request.query.is_none() && !request.has_identifier() {
                return Err(SearchError::InvalidRequest(
                    "movie search requires a query or a movie identifier".to_string(),
                ));
            }
        }
    }
    Ok(())
}

fn passes_filters(result: &CanonicalResult, request: &SearchRequest) -> bool {
    if let Some(min) = request.min_size {
        if result.size_bytes < min {
            return false;
        }
    }
    if let Some(max) = request.max_size {
        if result.size_bytes > max {
            return false;
        }
    }
    // Age bounds only apply when a date was resolvable at all.
    if let Some(age) = result.age_days {
        if let Some(min) = request.min_age {
            if age < min {
                return false;
            }
        }
        if let Some(max) = request.max_age {
            if age > max {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::normalize::normalize;
    use crate::search::types::CandidateEntry;

    #[test]
    fn test_validate_general_requires_query() {
        let request = SearchRequest::new(SearchType::General);
        assert!(matches!(
            validate(&request),
            Err(SearchError::InvalidRequest(_))
        ));
        assert!(validate(&request.with_query("x")).is_ok());
    }

    #[test]
    fn test_validate_tv_accepts_identifier_without_query() {
        let bare = SearchRequest::new(SearchType::Tv);
        assert!(matches!(
            validate(&bare),
            Err(SearchError::InvalidRequest(_))
        ));
        assert!(validate(&bare.with_identifier("tvdbid", "121361")).is_ok());
    }

    #[test]
    fn test_validate_movie_accepts_identifier_without_query() {
        let request = SearchRequest::new(SearchType::Movie).with_identifier("imdbid", "0816692");
        assert!(validate(&request).is_ok());
    }

    fn sized_result(size_bytes: u64, epoch: Option<i64>) -> CanonicalResult {
        normalize(
            CandidateEntry {
                title: "t".to_string(),
                size_bytes,
                publish_epoch: epoch,
                age_precise: false,
                guid: "g".to_string(),
                download_url: None,
                category: None,
            },
            "test",
            Utc::now(),
        )
    }

    #[test]
    fn test_size_filter_bounds() {
        let request = SearchRequest::new(SearchType::General)
            .with_query("x")
            .with_size_bounds(Some(1_000), Some(2_000));

        assert!(!passes_filters(&sized_result(500, None), &request));
        assert!(passes_filters(&sized_result(1_500, None), &request));
        assert!(!passes_filters(&sized_result(3_000, None), &request));
    }

    #[test]
    fn test_age_filter_skips_dateless_results() {
        let request = SearchRequest::new(SearchType::General)
            .with_query("x")
            .with_age_bounds(None, Some(7));

        let old = Utc::now().timestamp() - 30 * 86_400;
        assert!(!passes_filters(&sized_result(1, Some(old)), &request));
        // No resolvable date: the bound cannot be applied, keep the result
        assert!(passes_filters(&sized_result(1, None), &request));
    }
}
