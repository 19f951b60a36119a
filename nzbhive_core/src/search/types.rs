//! Core types for aggregated indexer search.

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// What kind of search the caller is performing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    /// Free-text search across everything
    #[default]
    General,
    /// TV episode search (optionally by show identifier + season/episode)
    Tv,
    /// Movie search (optionally by external movie identifier)
    Movie,
}

/// One logical search. Immutable once constructed; all fields that affect
/// the merged result set participate in the cache signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub search_type: SearchType,

    /// Free-text query. Optional: identifier-based tv/movie searches work
    /// without one on indexers that support it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Pagination. Served from the cached full set, never sent upstream.
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// External identifier, e.g. `tvdbid`/`rid` for tv, `imdbid` for movies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier_value: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,

    /// Size bounds in bytes, age bounds in days.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_age: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<i64>,
}

fn default_limit() -> usize {
    100
}

impl SearchRequest {
    pub fn new(search_type: SearchType) -> Self {
        Self {
            search_type,
            query: None,
            category: None,
            offset: 0,
            limit: default_limit(),
            identifier_key: None,
            identifier_value: None,
            season: None,
            episode: None,
            min_size: None,
            max_size: None,
            min_age: None,
            max_age: None,
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    pub fn with_identifier(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.identifier_key = Some(key.into());
        self.identifier_value = Some(value.into());
        self
    }

    pub fn with_episode(mut self, season: Option<u32>, episode: Option<u32>) -> Self {
        self.season = season;
        self.episode = episode;
        self
    }

    pub fn with_size_bounds(mut self, min: Option<u64>, max: Option<u64>) -> Self {
        self.min_size = min;
        self.max_size = max;
        self
    }

    pub fn with_age_bounds(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        self.min_age = min;
        self.max_age = max;
        self
    }

    pub fn has_identifier(&self) -> bool {
        self.identifier_key.is_some() && self.identifier_value.is_some()
    }

    /// Deterministic cache signature over every output-affecting field.
    /// `offset`/`limit` are excluded: the cache stores the full deduplicated
    /// set and pagination is a slice on read.
    pub fn signature(&self) -> String {
        let key = CacheKey {
            search_type: self.search_type,
            query: self.query.as_deref(),
            category: self.category.as_deref(),
            identifier_key: self.identifier_key.as_deref(),
            identifier_value: self.identifier_value.as_deref(),
            season: self.season,
            episode: self.episode,
            min_size: self.min_size,
            max_size: self.max_size,
            min_age: self.min_age,
            max_age: self.max_age,
        };
        // Struct field order is fixed, so the JSON encoding is stable.
        serde_json::to_string(&key).unwrap_or_default()
    }
}

#[derive(Serialize)]
struct CacheKey<'a> {
    search_type: SearchType,
    query: Option<&'a str>,
    category: Option<&'a str>,
    identifier_key: Option<&'a str>,
    identifier_value: Option<&'a str>,
    season: Option<u32>,
    episode: Option<u32>,
    min_size: Option<u64>,
    max_size: Option<u64>,
    min_age: Option<i64>,
    max_age: Option<i64>,
}

/// A raw, provider-local result as parsed out of one indexer's response,
/// before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateEntry {
    /// Raw title as scraped; may still carry filename noise.
    pub title: String,
    /// Size in bytes, already unit-converted by the adapter.
    pub size_bytes: u64,
    /// Absolute publish time, when the provider gave one we could resolve.
    pub publish_epoch: Option<i64>,
    /// False when the provider only gave a day-granular or relative date.
    pub age_precise: bool,
    /// Provider-local identifier, sufficient to re-fetch the item later.
    pub guid: String,
    pub download_url: Option<String>,
    pub category: Option<String>,
}

/// One (indexer, provider-local guid) sighting of a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub indexer: String,
    pub guid: String,
}

/// The decoded body of a composite guid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidPayload {
    pub indexer: String,
    pub guid: String,
    pub title: String,
}

/// Encode the composite guid issued on every canonical result. JSON so a
/// later `get nfo` / `build download link` call can decode it without a
/// re-search.
pub fn encode_guid(indexer: &str, local_guid: &str, title: &str) -> String {
    let payload = GuidPayload {
        indexer: indexer.to_string(),
        guid: local_guid.to_string(),
        title: title.to_string(),
    };
    serde_json::to_string(&payload).unwrap_or_default()
}

/// Decode a previously issued composite guid back to the exact
/// (indexer, provider-local id) pair that produced it.
pub fn decode_guid(encoded: &str) -> Result<GuidPayload, SearchError> {
    serde_json::from_str(encoded).map_err(|e| SearchError::InvalidGuid(e.to_string()))
}

/// The normalized, deduplicated, cross-provider result schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalResult {
    /// Primary provenance: the indexer this record is attributed to.
    pub indexer: String,

    /// Composite guid (indexer + local id + title, JSON-encoded).
    pub guid: String,

    /// Cleaned title, stripped of filename/container noise.
    pub title: String,

    pub size_bytes: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_epoch: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_date_utc: Option<String>,

    /// Age in whole days at aggregation time; never provider-supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_days: Option<i64>,

    pub age_precise: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,

    /// Every indexer this release was observed on, primary included. Each
    /// entry's guid remains independently resolvable.
    pub seen_on: Vec<Provenance>,
}

impl CanonicalResult {
    /// The provider-local guid of the primary provenance.
    pub fn local_guid(&self) -> Result<String, SearchError> {
        decode_guid(&self.guid).map(|p| p.guid)
    }
}

/// Outcome record for one attempted provider in one aggregation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerOutcome {
    pub indexer: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub is_timeout: bool,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    /// Candidate entries extracted after parsing. Zero with `success` is a
    /// valid "no matches" outcome, distinct from a failed fetch.
    pub result_count: usize,
}

impl IndexerOutcome {
    pub fn ok(indexer: impl Into<String>, elapsed_ms: u64, result_count: usize) -> Self {
        Self {
            indexer: indexer.into(),
            success: true,
            error: None,
            is_timeout: false,
            elapsed_ms,
            http_status: Some(200),
            result_count,
        }
    }

    pub fn failed(
        indexer: impl Into<String>,
        elapsed_ms: u64,
        error: impl Into<String>,
        is_timeout: bool,
    ) -> Self {
        Self {
            indexer: indexer.into(),
            success: false,
            error: Some(error.into()),
            is_timeout,
            elapsed_ms,
            http_status: None,
            result_count: 0,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }
}

/// What `SearchEngine::search` hands back to the routing layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<CanonicalResult>,
    /// Size of the full deduplicated set, not the page.
    pub total: usize,
    pub offset: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = SearchRequest::new(SearchType::Tv)
            .with_query("show name")
            .with_identifier("tvdbid", "121361")
            .with_episode(Some(4), Some(10))
            .with_page(20, 50);

        assert_eq!(request.search_type, SearchType::Tv);
        assert_eq!(request.query.as_deref(), Some("show name"));
        assert!(request.has_identifier());
        assert_eq!(request.season, Some(4));
        assert_eq!(request.offset, 20);
    }

    #[test]
    fn test_signature_ignores_pagination() {
        let a = SearchRequest::new(SearchType::General).with_query("ubuntu");
        let b = a.clone().with_page(100, 25);
        assert_eq!(a.signature(), b.signature());

        let c = a.clone().with_query("debian");
        assert_ne!(a.signature(), c.signature());
    }

    #[test]
    fn test_signature_covers_filters() {
        let a = SearchRequest::new(SearchType::General).with_query("ubuntu");
        let b = a.clone().with_size_bounds(Some(1024), None);
        assert_ne!(a.signature(), b.signature());
    }

    #[test]
    fn test_guid_round_trip() {
        let encoded = encode_guid("binsearch", "12345abc", "Some.Release.720p");
        let decoded = decode_guid(&encoded).unwrap();
        assert_eq!(decoded.indexer, "binsearch");
        assert_eq!(decoded.guid, "12345abc");
        assert_eq!(decoded.title, "Some.Release.720p");
    }

    #[test]
    fn test_decode_guid_rejects_garbage() {
        assert!(decode_guid("not json").is_err());
    }
}
