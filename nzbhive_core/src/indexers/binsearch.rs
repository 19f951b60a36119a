//! Binsearch adapter.
//!
//! Binsearch is a raw usenet search engine: query-only, no category
//! filtering, results served as an HTML table. The result rows carry a
//! checkbox whose `name` attribute is the provider-local id, a quoted
//! filename as title, a `size: N.N GB` description and a `DD-MMM-YYYY`
//! post date (day granularity only, so ages are approximate).

use scraper::{Html, Selector};
use tracing::debug;

use crate::error::SearchError;
use crate::search::{CandidateEntry, SearchRequest};
use crate::util::{clean_release_title, find_dd_mmm_yyyy_epoch, find_size_in_text};
use crate::{IndexerAdapter, IndexerCapabilities};

const DEFAULT_BASE_URL: &str = "https://www.binsearch.info";
const DEFAULT_MAX_RESULTS: u32 = 250;
const MAX_AGE_DAYS: u32 = 2500;

pub struct BinsearchAdapter {
    name: String,
    base_url: String,
    max_results: u32,
}

impl BinsearchAdapter {
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

    /// NZB download link for a provider-local id. Plain string formatting -
    /// the query parameter must survive verbatim.
    pub fn download_url(&self, local_guid: &str) -> String {
        format!(
            "{}/fcgi/nzb.fcgi?q={}",
            self.base_url,
            urlencoding::encode(local_guid)
        )
    }
}

impl IndexerAdapter for BinsearchAdapter {
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
            "{}/index.php?q={}&max={}&adv_age={}&postdate=date",
            self.base_url,
            urlencoding::encode(query),
            self.max_results,
            MAX_AGE_DAYS,
        )])
    }

    fn parse_response(&self, body: &str) -> Result<Vec<CandidateEntry>, SearchError> {
        let document = Html::parse_document(body);
        let table_selector =
            Selector::parse("table#r2").map_err(|e| SearchError::Parse(e.to_string()))?;
        let row_selector =
            Selector::parse("table#r2 tr").map_err(|e| SearchError::Parse(e.to_string()))?;
        let checkbox_selector = Selector::parse("input[type=\"checkbox\"]")
            .map_err(|e| SearchError::Parse(e.to_string()))?;
        let title_selector =
            Selector::parse("span.s").map_err(|e| SearchError::Parse(e.to_string()))?;

        if document.select(&table_selector).next().is_none() {
            return Err(SearchError::Parse(
                "binsearch response contains no result table".to_string(),
            ));
        }

        let mut entries = Vec::new();
        for row in document.select(&row_selector) {
            let title_span = match row.select(&title_selector).next() {
                Some(span) => span,
                None => continue, // header / spacer rows
            };

            let guid = match row
                .select(&checkbox_selector)
                .next()
                .and_then(|el| el.value().attr("name"))
            {
                Some(name) => name.to_string(),
                None => continue,
            };

            let row_text = row.text().collect::<Vec<_>>().join(" ");

            let size_bytes = match find_size_in_text(&row_text) {
                Some(size) => size,
                None => {
                    debug!("binsearch: no size information in row, skipping: {row_text}");
                    continue;
                }
            };

            let title = clean_release_title(&title_span.text().collect::<String>());
            let publish_epoch = find_dd_mmm_yyyy_epoch(&row_text);

            entries.push(CandidateEntry {
                title,
                size_bytes,
                publish_epoch,
                // Post dates are day-granular at best.
                age_precise: false,
                download_url: Some(self.download_url(&guid)),
                guid,
                category: None,
            });
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchType;

    const SAMPLE: &str = r#"
    <html><body>
    <table id="r2">
      <tr><th>subject</th></tr>
      <tr>
        <td><input type="checkbox" name="1873450935" /></td>
        <td>
          <span class="s">"Some.Show.S01E02.720p.mkv"</span>
          <span class="d">size: 1.5 GB, parts available: 42 / 42</span>
          <span>07-Aug-2015</span>
        </td>
      </tr>
      <tr>
        <td><input type="checkbox" name="1873450999" /></td>
        <td>
          <span class="s">"broken.entry.rar"</span>
          <span class="d">parts available: 3 / 9</span>
        </td>
      </tr>
      <tr>
        <td><input type="checkbox" name="1873451000" /></td>
        <td>
          <span class="s">"Another.Release.nfo"</span>
          <span class="d">size: 700.0 MB</span>
        </td>
      </tr>
    </table>
    </body></html>"#;

    fn adapter() -> BinsearchAdapter {
        BinsearchAdapter::new("binsearch", None)
    }

    #[test]
    fn test_build_search_urls() {
        let request = SearchRequest::new(SearchType::General).with_query("ubuntu iso");
        let urls = adapter().build_search_urls(&request).unwrap();
        assert_eq!(urls.len(), 1);
        assert!(urls[0].starts_with("https://www.binsearch.info/index.php?q=ubuntu%20iso"));
        assert!(urls[0].contains("max=250"));
    }

    #[test]
    fn test_query_required() {
        let request = SearchRequest::new(SearchType::General);
        let err = adapter().build_search_urls(&request).unwrap_err();
        assert!(matches!(err, SearchError::UnsupportedSearch(_)));
    }

    #[test]
    fn test_show_search_falls_back_to_query() {
        let request = SearchRequest::new(SearchType::Tv).with_query("some show");
        assert!(adapter().build_show_search_urls(&request).is_ok());

        let no_query = SearchRequest::new(SearchType::Tv).with_identifier("tvdbid", "12345");
        let err = adapter().build_show_search_urls(&no_query).unwrap_err();
        assert!(matches!(err, SearchError::UnsupportedSearch(_)));
    }

    #[test]
    fn test_parse_rows() {
        let entries = adapter().parse_response(SAMPLE).unwrap();
        // The sizeless row is skipped, not fatal
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.title, "Some.Show.S01E02.720p");
        assert_eq!(first.size_bytes, 1_610_612_736);
        assert_eq!(first.guid, "1873450935");
        assert_eq!(first.publish_epoch, Some(1_438_905_600));
        assert!(!first.age_precise);

        let second = &entries[1];
        assert_eq!(second.title, "Another.Release");
        assert_eq!(second.size_bytes, 734_003_200);
        assert_eq!(second.publish_epoch, None);
    }

    #[test]
    fn test_download_url_carries_query_parameter() {
        // Regression: the link is built by string formatting and must keep
        // the guid as the q= value.
        let entries = adapter().parse_response(SAMPLE).unwrap();
        let url = entries[0].download_url.as_deref().unwrap();
        assert_eq!(
            url,
            "https://www.binsearch.info/fcgi/nzb.fcgi?q=1873450935"
        );
    }

    #[test]
    fn test_unparseable_body_is_error() {
        let err = adapter().parse_response("<html><body>maintenance</body></html>");
        assert!(matches!(err, Err(SearchError::Parse(_))));
    }
}
