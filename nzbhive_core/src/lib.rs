// src/lib.rs
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod indexers;
pub mod search;
pub mod stats;
pub mod util;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::SearchError;
use crate::search::{CandidateEntry, SearchRequest, SearchType};

pub use crate::config::{ConfigStore, EngineConfig, HiveConfig, IndexerConfig, IndexerKind};
pub use crate::fetch::{FetchResponse, Fetcher, HttpFetcher};
pub use crate::search::{
    decode_guid, encode_guid, CanonicalResult, GuidPayload, IndexerOutcome, Provenance,
    SearchEngine, SearchResponse,
};
pub use crate::stats::{IndexerStatsSnapshot, StatsAggregator};

/// What request shapes an adapter can serve. Consulted by the orchestrator
/// before dispatch; adapters are selected and constructed at
/// configuration-load time, never probed at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexerCapabilities {
    pub supports_query: bool,
    /// True when the indexer cannot search at all without a free-text query.
    pub needs_query: bool,
    pub supports_show_search: bool,
    pub supports_movie_search: bool,
    pub supports_category_filter: bool,
}

impl IndexerCapabilities {
    /// The common shape of raw usenet search engines: queries only.
    pub fn query_only() -> Self {
        Self {
            supports_query: true,
            needs_query: true,
            supports_show_search: false,
            supports_movie_search: false,
            supports_category_filter: false,
        }
    }

    /// Newznab-style APIs: every search shape, identifiers included.
    pub fn full() -> Self {
        Self {
            supports_query: true,
            needs_query: false,
            supports_show_search: true,
            supports_movie_search: true,
            supports_category_filter: true,
        }
    }

    /// Whether this capability set can serve the given search type at all.
    pub fn can_serve(&self, search_type: SearchType) -> bool {
        match search_type {
            SearchType::General => self.supports_query,
            SearchType::Tv => self.supports_show_search || self.supports_query,
            SearchType::Movie => self.supports_movie_search || self.supports_query,
        }
    }
}

/// Contract every indexer adapter implements.
///
/// Adapters are synchronous, pure functions over request fields and
/// already-fetched bytes; all I/O happens in the orchestrator. URL builders
/// fail with `SearchError::UnsupportedSearch` when the request shape cannot
/// be served (the orchestrator skips the provider - not a failure).
/// `parse_response` is tolerant: entries missing required fields are skipped
/// individually, only a fully unparseable body is an error.
pub trait IndexerAdapter: Send + Sync {
    fn name(&self) -> &str;

    fn capabilities(&self) -> IndexerCapabilities;

    /// Upper bound on results a single fetch can return.
    fn max_results(&self) -> u32 {
        250
    }

    fn build_search_urls(&self, request: &SearchRequest) -> Result<Vec<String>, SearchError>;

    /// TV search. Query-only indexers serve it as a plain query search and
    /// fail when no query was supplied.
    fn build_show_search_urls(&self, request: &SearchRequest) -> Result<Vec<String>, SearchError> {
        if self.capabilities().needs_query && request.query.is_none() {
            return Err(SearchError::UnsupportedSearch(format!(
                "{} only supports query-based searches and no query was supplied",
                self.name()
            )));
        }
        self.build_search_urls(request)
    }

    /// Movie search; same fallback policy as show search.
    fn build_movie_search_urls(&self, request: &SearchRequest) -> Result<Vec<String>, SearchError> {
        if self.capabilities().needs_query && request.query.is_none() {
            return Err(SearchError::UnsupportedSearch(format!(
                "{} only supports query-based searches and no query was supplied",
                self.name()
            )));
        }
        self.build_search_urls(request)
    }

    fn parse_response(&self, body: &str) -> Result<Vec<CandidateEntry>, SearchError>;
}

/// Holds the adapter instances built from configuration.
pub struct IndexerRegistry {
    indexers: HashMap<String, Arc<dyn IndexerAdapter>>,
}

impl IndexerRegistry {
    pub fn new() -> Self {
        Self {
            indexers: HashMap::new(),
        }
    }

    pub fn register(&mut self, adapter: Arc<dyn IndexerAdapter>) {
        self.indexers.insert(adapter.name().to_string(), adapter);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn IndexerAdapter>> {
        self.indexers.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.indexers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.indexers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexers.is_empty()
    }
}

impl Default for IndexerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
