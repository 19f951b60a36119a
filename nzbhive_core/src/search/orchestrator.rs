//! Concurrent fan-out across the eligible indexers.
//!
//! One task per provider, all joined; a provider that times out or fails is
//! recorded in its outcome and never blocks or fails its siblings. URL
//! fetches across all providers share a global semaphore.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::{EngineConfig, IndexerConfig};
use crate::error::SearchError;
use crate::fetch::Fetcher;
use crate::search::types::{CandidateEntry, IndexerOutcome, SearchRequest, SearchType};
use crate::{IndexerAdapter, IndexerRegistry};

struct ProviderFailure {
    reason: String,
    status: Option<u16>,
}

/// Fan the request out to every eligible provider and collect candidate
/// entries (tagged with their indexer) plus one outcome record per attempted
/// provider. Providers skipped as unsupported produce no outcome.
pub async fn fetch_all(
    request: &SearchRequest,
    configs: &[IndexerConfig],
    registry: &IndexerRegistry,
    fetcher: &Arc<dyn Fetcher>,
    engine: &EngineConfig,
) -> (Vec<(String, CandidateEntry)>, Vec<IndexerOutcome>) {
    let semaphore = Arc::new(Semaphore::new(engine.concurrency.max(1)));

    let mut outcomes = Vec::new();
    let mut jobs = Vec::new();

    for config in configs.iter().filter(|c| c.enabled) {
        let adapter = match registry.get(&config.name) {
            Some(adapter) => Arc::clone(adapter),
            None => {
                warn!("no adapter registered for configured indexer {}", config.name);
                continue;
            }
        };

        if !adapter.capabilities().can_serve(request.search_type) {
            debug!(
                "{} cannot serve {:?} searches, skipping",
                config.name, request.search_type
            );
            continue;
        }

        let urls = match build_urls(adapter.as_ref(), request) {
            Ok(urls) => urls,
            Err(SearchError::UnsupportedSearch(reason)) => {
                debug!("{} skipped: {}", config.name, reason);
                continue;
            }
            Err(e) => {
                outcomes.push(IndexerOutcome::failed(
                    config.name.as_str(),
                    0,
                    e.to_string(),
                    false,
                ));
                continue;
            }
        };

        let name = config.name.clone();
        // A provider may not outlive the overall request deadline even if
        // its own timeout is more generous.
        let timeout_ms = config.timeout_ms.min(engine.deadline_ms);
        let fetcher = Arc::clone(fetcher);
        let semaphore = Arc::clone(&semaphore);

        jobs.push(async move {
            let start = Instant::now();
            let attempt = timeout(
                Duration::from_millis(timeout_ms),
                fetch_provider(&name, adapter.as_ref(), &urls, fetcher.as_ref(), &semaphore, timeout_ms),
            )
            .await;
            let elapsed = start.elapsed().as_millis() as u64;

            match attempt {
                Ok(Ok((entries, status))) => {
                    debug!("{} returned {} entries in {}ms", name, entries.len(), elapsed);
                    let outcome =
                        IndexerOutcome::ok(name.as_str(), elapsed, entries.len()).with_status(status);
                    let tagged = entries
                        .into_iter()
                        .map(|entry| (name.clone(), entry))
                        .collect::<Vec<_>>();
                    (tagged, outcome)
                }
                Ok(Err(failure)) => {
                    warn!("{} failed after {}ms: {}", name, elapsed, failure.reason);
                    let mut outcome =
                        IndexerOutcome::failed(name.as_str(), elapsed, failure.reason, false);
                    if let Some(status) = failure.status {
                        outcome = outcome.with_status(status);
                    }
                    (Vec::new(), outcome)
                }
                Err(_) => {
                    warn!("{} timed out after {}ms", name, timeout_ms);
                    let outcome = IndexerOutcome::failed(
                        name.as_str(),
                        elapsed,
                        format!("timed out after {}ms", timeout_ms),
                        true,
                    );
                    (Vec::new(), outcome)
                }
            }
        });
    }

    let mut entries = Vec::new();
    for (tagged, outcome) in join_all(jobs).await {
        entries.extend(tagged);
        outcomes.push(outcome);
    }

    (entries, outcomes)
}

fn build_urls(
    adapter: &dyn IndexerAdapter,
    request: &SearchRequest,
) -> Result<Vec<String>, SearchError> {
    match request.search_type {
        SearchType::General => adapter.build_search_urls(request),
        SearchType::Tv => adapter.build_show_search_urls(request),
        SearchType::Movie => adapter.build_movie_search_urls(request),
    }
}

async fn fetch_provider(
    name: &str,
    adapter: &dyn IndexerAdapter,
    urls: &[String],
    fetcher: &dyn Fetcher,
    semaphore: &Semaphore,
    timeout_ms: u64,
) -> Result<(Vec<CandidateEntry>, u16), ProviderFailure> {
    let mut entries = Vec::new();
    let mut last_status = 200;

    for url in urls {
        let _permit = semaphore.acquire().await.map_err(|e| ProviderFailure {
            reason: format!("concurrency limiter closed: {}", e),
            status: None,
        })?;

        let response = fetcher
            .fetch(url, Duration::from_millis(timeout_ms))
            .await
            .map_err(|e| ProviderFailure {
                reason: e.to_string(),
                status: None,
            })?;

        if !(200..300).contains(&response.status) {
            return Err(ProviderFailure {
                reason: format!("HTTP {}", response.status),
                status: Some(response.status),
            });
        }
        last_status = response.status;

        let parsed = adapter
            .parse_response(&response.body)
            .map_err(|e| ProviderFailure {
                reason: e.to_string(),
                status: Some(response.status),
            })?;
        debug!("{}: parsed {} entries from {}", name, parsed.len(), url);
        entries.extend(parsed);
    }

    Ok((entries, last_status))
}
