//! NZBIndex adapter.
//!
//! Another query-only usenet search engine. Result rows carry the release
//! name in a `<label>`, the size as `N.N GB` text and the post age as
//! relative text (`2.3 days`), so publish times from this indexer are always
//! approximate.

use scraper::{Html, Selector};
use tracing::debug;

use crate::error::SearchError;
use crate::search::{CandidateEntry, SearchRequest};
use crate::util::{clean_release_title, find_size_in_text, relative_age_to_epoch};
use crate::{IndexerAdapter, IndexerCapabilities};

const DEFAULT_BASE_URL: &str = "https://nzbindex.com";
const DEFAULT_MAX_RESULTS: u32 = 250;

pub struct NzbindexAdapter {
    name: String,
    base_url: String,
    max_results: u32,
}

impl NzbindexAdapter {
    pub fn new(name: impl Into<String>, max_results: Option<u32>) -> Self {
        Self {
            name: name.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_results: max_results.unwrap_or(DEFAULT_MAX_RESULTS),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl IndexerAdapter for NzbindexAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> IndexerCapabilities {
        IndexerCapabilities::query_only()
    }

    fn max_results(&self) -> u32 {
        self.max_results
    }

    fn build_search_urls(&self, request: &SearchRequest) -> Result<Vec<String>, SearchError> {
        let query = request.query.as_deref().ok_or_else(|| {
            SearchError::UnsupportedSearch(format!(
                "{} only supports query-based searches and no query was supplied",
                self.name
            ))
        })?;

        Ok(vec![format!(
            "{}/search/?q={}&max={}&hidespam=1",
            self.base_url,
            urlencoding::encode(query),
            self.max_results,
        )])
    }

    fn parse_response(&self, body: &str) -> Result<Vec<CandidateEntry>, SearchError> {
        let document = Html::parse_document(body);
        let table_selector =
            Selector::parse("table#results").map_err(|e| SearchError::Parse(e.to_string()))?;
        let row_selector =
            Selector::parse("table#results tr").map_err(|e| SearchError::Parse(e.to_string()))?;
        let checkbox_selector = Selector::parse("input[type=\"checkbox\"]")
            .map_err(|e| SearchError::Parse(e.to_string()))?;
        let label_selector =
            Selector::parse("label").map_err(|e| SearchError::Parse(e.to_string()))?;
        let download_selector = Selector::parse("a[href*=\"/download/\"]")
            .map_err(|e| SearchError::Parse(e.to_string()))?;

        if document.select(&table_selector).next().is_none() {
            return Err(SearchError::Parse(
                "nzbindex response contains no result table".to_string(),
            ));
        }

        let mut entries = Vec::new();
        for row in document.select(&row_selector) {
            let label = match row.select(&label_selector).next() {
                Some(label) => label,
                None => continue,
            };

            let guid = match row
                .select(&checkbox_selector)
                .next()
                .and_then(|el| el.value().attr("value"))
            {
                Some(value) => value.to_string(),
                None => continue,
            };

            let row_text = row.text().collect::<Vec<_>>().join(" ");

            let size_bytes = match find_size_in_text(&row_text) {
                Some(size) => size,
                None => {
                    debug!("nzbindex: no size information in row, skipping");
                    continue;
                }
            };

            let download_url = row
                .select(&download_selector)
                .next()
                .and_then(|el| el.value().attr("href"))
                .map(|href| {
                    if href.starts_with('/') {
                        format!("{}{}", self.base_url, href)
                    } else {
                        href.to_string()
                    }
                });

            entries.push(CandidateEntry {
                title: clean_release_title(&label.text().collect::<String>()),
                size_bytes,
                publish_epoch: relative_age_to_epoch(&row_text),
                // Relative ages only; never precise.
                age_precise: false,
                guid,
                download_url,
                category: None,
            });
        }

        Ok(entries)
    }
}
