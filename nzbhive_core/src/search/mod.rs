//! Search aggregation across indexers.
//!
//! This module provides:
//! - `SearchRequest` / `CanonicalResult`: the request and result schema
//! - `SearchEngine`: cache, fan-out, normalize, dedup, rank
//! - `decode_guid`: resolve a previously issued composite guid
//!
//! # Example
//!
//! ```ignore
//! use nzbhive_core::{HiveConfig, HttpFetcher, SearchEngine};
//! use nzbhive_core::search::{SearchRequest, SearchType};
//!
//! let engine = SearchEngine::new(HiveConfig::builtin(), std::sync::Arc::new(HttpFetcher::new()));
//! let request = SearchRequest::new(SearchType::General).with_query("linux iso");
//! let response = engine.search(true, &request).await?;
//! ```

mod dedup;
mod engine;
mod normalize;
mod orchestrator;
mod rank;
mod types;

pub use engine::SearchEngine;
pub use normalize::normalize;
pub use rank::rank_and_paginate;
pub use types::{
    decode_guid, encode_guid, CandidateEntry, CanonicalResult, GuidPayload, IndexerOutcome,
    Provenance, SearchRequest, SearchResponse, SearchType,
};
