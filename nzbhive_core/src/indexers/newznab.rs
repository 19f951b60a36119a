//! Generic Newznab adapter.
//!
//! One instance per configured Newznab-compatible host. Unlike the raw
//! usenet engines this API supports every search shape: free-text, TV by
//! `rid`/`tvdbid` with season/episode, movies by `imdbid`, and numeric
//! category filters. Identifier searches work without a query.

use chrono::DateTime;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use tracing::debug;

use crate::error::SearchError;
use crate::search::{CandidateEntry, SearchRequest};
use crate::util::clean_release_title;
use crate::{IndexerAdapter, IndexerCapabilities};

const DEFAULT_MAX_RESULTS: u32 = 100;

pub struct NewznabAdapter {
    name: String,
    base_url: String,
    api_key: Option<String>,
    max_results: u32,
}

impl NewznabAdapter {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: Option<String>,
        max_results: Option<u32>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            max_results: max_results.unwrap_or(DEFAULT_MAX_RESULTS),
        }
    }

    fn api_url(&self, function: &str, request: &SearchRequest) -> String {
        let mut url = format!(
            "{}/api?t={}&extended=1&limit={}",
            self.base_url, function, self.max_results
        );
        if let Some(key) = &self.api_key {
            url.push_str(&format!("&apikey={}", urlencoding::encode(key)));
        }
        if let Some(query) = &request.query {
            url.push_str(&format!("&q={}", urlencoding::encode(query)));
        }
        if let Some(category) = &request.category {
            url.push_str(&format!("&cat={}", urlencoding::encode(category)));
        }
        // Newznab understands size bounds natively; forwarding them trims
        // the response before it ever reaches the engine-side filter.
        if let Some(min_size) = request.min_size {
            url.push_str(&format!("&minsize={}", min_size));
        }
        if let Some(max_size) = request.max_size {
            url.push_str(&format!("&maxsize={}", max_size));
        }
        url
    }
}

impl IndexerAdapter for NewznabAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> IndexerCapabilities {
        IndexerCapabilities::full()
    }

    fn max_results(&self) -> u32 {
        self.max_results
    }

    fn build_search_urls(&self, request: &SearchRequest) -> Result<Vec<String>, SearchError> {
        if request.query.is_none() {
            return Err(SearchError::UnsupportedSearch(format!(
                "{} needs a query for a general search",
                self.name
            )));
        }
        Ok(vec![self.api_url("search", request)])
    }

    fn build_show_search_urls(&self, request: &SearchRequest) -> Result<Vec<String>, SearchError> {
        if request.query.is_none() && !request.has_identifier() {
            return Err(SearchError::UnsupportedSearch(format!(
                "{} needs a query or a show identifier for a tv search",
                self.name
            )));
        }

        let mut url = self.api_url("tvsearch", request);
        if let (Some(key), Some(value)) = (&request.identifier_key, &request.identifier_value) {
            url.push_str(&format!("&{}={}", key, urlencoding::encode(value)));
        }
        if let Some(season) = request.season {
            url.push_str(&format!("&season={}", season));
        }
        if let Some(episode) = request.episode {
            url.push_str(&format!("&ep={}", episode));
        }
        Ok(vec![url])
    }

    fn build_movie_search_urls(&self, request: &SearchRequest) -> Result<Vec<String>, SearchError> {
        if request.query.is_none() && !request.has_identifier() {
            return Err(SearchError::UnsupportedSearch(format!(
                "{} needs a query or a movie identifier for a movie search",
                self.name
            )));
        }

        let mut url = self.api_url("movie", request);
        if let (Some(key), Some(value)) = (&request.identifier_key, &request.identifier_value) {
            url.push_str(&format!("&{}={}", key, urlencoding::encode(value)));
        }
        Ok(vec![url])
    }

    fn parse_response(&self, body: &str) -> Result<Vec<CandidateEntry>, SearchError> {
        let mut reader = Reader::from_str(body);
        reader.trim_text(true);

        let mut entries = Vec::new();
        let mut buf = Vec::new();

        let mut saw_channel = false;
        let mut current_item: Option<ItemBuilder> = None;
        let mut current_element = String::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    if name == "channel" {
                        saw_channel = true;
                    }
                    if name == "item" {
                        current_item = Some(ItemBuilder::default());
                    }
                    current_element = name;
                }
                Ok(Event::Empty(e)) => {
                    let Some(ref mut item) = current_item else {
                        buf.clear();
                        continue;
                    };
                    match e.name().as_ref() {
                        b"newznab:attr" => {
                            let mut attr_name = None;
                            let mut attr_value = None;
                            for attr in e.attributes().flatten() {
                                let value = String::from_utf8_lossy(&attr.value).to_string();
                                match attr.key.as_ref() {
                                    b"name" => attr_name = Some(value),
                                    b"value" => attr_value = Some(value),
                                    _ => {}
                                }
                            }
                            match (attr_name.as_deref(), attr_value) {
                                (Some("size"), Some(value)) => {
                                    item.attr_size = value.parse().ok();
                                }
                                (Some("usenetdate"), Some(value)) => {
                                    item.usenet_date = Some(value);
                                }
                                _ => {}
                            }
                        }
                        b"enclosure" => {
                            for attr in e.attributes().flatten() {
                                let value = String::from_utf8_lossy(&attr.value).to_string();
                                match attr.key.as_ref() {
                                    b"length" => item.enclosure_length = value.parse().ok(),
                                    b"url" => item.enclosure_url = Some(value),
                                    _ => {}
                                }
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Event::End(e)) => {
                    if e.name().as_ref() == b"item" {
                        if let Some(builder) = current_item.take() {
                            match builder.build() {
                                Some(entry) => entries.push(entry),
                                None => debug!("{}: incomplete api item skipped", self.name),
                            }
                        }
                    }
                    current_element.clear();
                }
                Ok(Event::Text(e)) => {
                    if let Some(ref mut item) = current_item {
                        let text = e.unescape().unwrap_or_default().to_string();
                        if !text.is_empty() {
                            match current_element.as_str() {
                                "title" => item.title = Some(text),
                                "guid" => item.guid = Some(text),
                                "link" => item.link = Some(text),
                                "category" => item.category = Some(text),
                                "pubDate" => item.pub_date = Some(text),
                                _ => {}
                            }
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(SearchError::Parse(format!("XML parse error: {}", e))),
                _ => {}
            }
            buf.clear();
        }

        if !saw_channel {
            return Err(SearchError::Parse(format!(
                "{} response is not a newznab feed",
                self.name
            )));
        }

        Ok(entries)
    }
}

#[derive(Default)]
struct ItemBuilder {
    title: Option<String>,
    guid: Option<String>,
    link: Option<String>,
    category: Option<String>,
    pub_date: Option<String>,
    usenet_date: Option<String>,
    attr_size: Option<u64>,
    enclosure_length: Option<u64>,
    enclosure_url: Option<String>,
}

impl ItemBuilder {
    fn build(self) -> Option<CandidateEntry> {
        let title = clean_release_title(&self.title?);
        let size_bytes = self.attr_size.or(self.enclosure_length)?;
        let guid = self.guid.or_else(|| self.link.clone())?;

        let publish_epoch = self
            .pub_date
            .as_deref()
            .or(self.usenet_date.as_deref())
            .and_then(|raw| DateTime::parse_from_rfc2822(raw).ok())
            .map(|dt| dt.timestamp());

        Some(CandidateEntry {
            title,
            size_bytes,
            age_precise: publish_epoch.is_some(),
            publish_epoch,
            guid,
            download_url: self.enclosure_url.or(self.link),
            category: self.category,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchType;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:newznab="http://www.newznab.com/DTD/2010/feeds/attributes/">
  <channel>
    <title>indexer.example.com</title>
    <item>
      <title>Some.Movie.2015.1080p.BluRay</title>
      <guid>https://indexer.example.com/details/abcdef123456</guid>
      <link>https://indexer.example.com/getnzb/abcdef123456.nzb</link>
      <category>Movies &gt; HD</category>
      <pubDate>Fri, 07 Aug 2015 12:30:00 +0000</pubDate>
      <enclosure url="https://indexer.example.com/getnzb/abcdef123456.nzb" length="100" type="application/x-nzb" />
      <newznab:attr name="category" value="2040" />
      <newznab:attr name="size" value="8589934592" />
    </item>
  </channel>
</rss>"#;

    fn adapter() -> NewznabAdapter {
        NewznabAdapter::new(
            "local-newznab",
            "https://indexer.example.com/",
            Some("secret".to_string()),
            None,
        )
    }

    #[test]
    fn test_general_search_url() {
        let request = SearchRequest::new(SearchType::General)
            .with_query("some movie")
            .with_category("2040");
        let urls = adapter().build_search_urls(&request).unwrap();
        assert_eq!(urls.len(), 1);
        assert!(urls[0].starts_with("https://indexer.example.com/api?t=search"));
        assert!(urls[0].contains("q=some%20movie"));
        assert!(urls[0].contains("cat=2040"));
        assert!(urls[0].contains("apikey=secret"));
    }

    #[test]
    fn test_tv_search_by_identifier_without_query() {
        let request = SearchRequest::new(SearchType::Tv)
            .with_identifier("tvdbid", "121361")
            .with_episode(Some(4), Some(10));
        let urls = adapter().build_show_search_urls(&request).unwrap();
        assert!(urls[0].contains("t=tvsearch"));
        assert!(urls[0].contains("tvdbid=121361"));
        assert!(urls[0].contains("season=4"));
        assert!(urls[0].contains("ep=10"));
    }

    #[test]
    fn test_tv_search_needs_query_or_identifier() {
        let request = SearchRequest::new(SearchType::Tv);
        let err = adapter().build_show_search_urls(&request).unwrap_err();
        assert!(matches!(err, SearchError::UnsupportedSearch(_)));
    }

    #[test]
    fn test_movie_search_by_imdbid() {
        let request = SearchRequest::new(SearchType::Movie).with_identifier("imdbid", "0816692");
        let urls = adapter().build_movie_search_urls(&request).unwrap();
        assert!(urls[0].contains("t=movie"));
        assert!(urls[0].contains("imdbid=0816692"));
    }

    #[test]
    fn test_size_bounds_forwarded() {
        let request = SearchRequest::new(SearchType::General)
            .with_query("x")
            .with_size_bounds(Some(1024), Some(2048));
        let urls = adapter().build_search_urls(&request).unwrap();
        assert!(urls[0].contains("minsize=1024"));
        assert!(urls[0].contains("maxsize=2048"));
    }

    #[test]
    fn test_parse_prefers_attr_size_over_enclosure() {
        let entries = adapter().parse_response(SAMPLE).unwrap();
        assert_eq!(entries.len(), 1);

        let entry = &entries[0];
        assert_eq!(entry.title, "Some.Movie.2015.1080p.BluRay");
        assert_eq!(entry.size_bytes, 8_589_934_592);
        assert_eq!(entry.guid, "https://indexer.example.com/details/abcdef123456");
        assert_eq!(entry.category.as_deref(), Some("Movies > HD"));
        assert!(entry.age_precise);
        assert_eq!(entry.publish_epoch, Some(1_438_950_600));
    }

    #[test]
    fn test_non_feed_body_is_error() {
        let err = adapter().parse_response("<html>login required</html>");
        assert!(matches!(err, Err(SearchError::Parse(_))));
    }
}
