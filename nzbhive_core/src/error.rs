// src/error.rs
/// Error taxonomy for the aggregation engine.
///
/// Provider-level variants (`UnsupportedSearch`, `Fetch`, `Parse`, `Timeout`)
/// never reach the caller of `SearchEngine::search`; they are absorbed into
/// `IndexerOutcome` records. Only `InvalidRequest` and `AllProvidersFailed`
/// are caller-visible.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("unsupported search: {0}")]
    UnsupportedSearch(String),

    #[error("fetch failed for {indexer}: {reason}")]
    Fetch { indexer: String, reason: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("{indexer} timed out after {after_ms}ms")]
    Timeout { indexer: String, after_ms: u64 },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("all {attempted} attempted indexers failed")]
    AllProvidersFailed { attempted: usize },

    #[error("invalid guid: {0}")]
    InvalidGuid(String),

    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),
}

impl SearchError {
    pub fn code_str(&self) -> &'static str {
        match self {
            SearchError::UnsupportedSearch(_) => "unsupported_search",
            SearchError::Fetch { .. } => "fetch_failed",
            SearchError::Parse(_) => "parse_error",
            SearchError::Timeout { .. } => "timeout",
            SearchError::InvalidRequest(_) => "invalid_request",
            SearchError::AllProvidersFailed { .. } => "service_degraded",
            SearchError::InvalidGuid(_) => "invalid_guid",
            SearchError::HttpRequest(_) => "upstream_error",
            SearchError::SerdeJson(_) => "internal_error",
            SearchError::Io(_) => "internal_error",
            SearchError::Config(_) => "config_error",
        }
    }

    /// True for errors that disqualify a single provider without affecting
    /// the rest of the aggregation run.
    pub fn is_provider_local(&self) -> bool {
        matches!(
            self,
            SearchError::UnsupportedSearch(_)
                | SearchError::Fetch { .. }
                | SearchError::Parse(_)
                | SearchError::Timeout { .. }
        )
    }
}
