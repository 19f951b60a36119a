//! NZBClub adapter.
//!
//! NZBClub exposes searches as an RSS feed. Enclosure `length` attributes
//! carry exact byte sizes and `pubDate` is full RFC-2822, so ages from this
//! indexer are precise. Query-only, no category filtering.

use chrono::DateTime;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use tracing::debug;

use crate::error::SearchError;
use crate::search::{CandidateEntry, SearchRequest};
use crate::util::clean_release_title;
use crate::{IndexerAdapter, IndexerCapabilities};

const DEFAULT_BASE_URL: &str = "https://www.nzbclub.com";
const DEFAULT_MAX_RESULTS: u32 = 250;

pub struct NzbclubAdapter {
    name: String,
    base_url: String,
    max_results: u32,
}

impl NzbclubAdapter {
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

impl IndexerAdapter for NzbclubAdapter {
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
            "{}/nzbrss.aspx?q={}&max={}&postdate=date",
            self.base_url,
            urlencoding::encode(query),
            self.max_results,
        )])
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
                    if e.name().as_ref() == b"enclosure" {
                        if let Some(ref mut item) = current_item {
                            for attr in e.attributes().flatten() {
                                let value = String::from_utf8_lossy(&attr.value).to_string();
                                match attr.key.as_ref() {
                                    b"length" => item.size_bytes = value.parse().ok(),
                                    b"url" => item.enclosure_url = Some(value),
                                    _ => {}
                                }
                            }
                        }
                    }
                }
                Ok(Event::End(e)) => {
                    if e.name().as_ref() == b"item" {
                        if let Some(builder) = current_item.take() {
                            match builder.build() {
                                Some(entry) => entries.push(entry),
                                None => debug!("nzbclub: incomplete RSS item skipped"),
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
            return Err(SearchError::Parse(
                "nzbclub response is not an RSS feed".to_string(),
            ));
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
    size_bytes: Option<u64>,
    enclosure_url: Option<String>,
}

impl ItemBuilder {
    fn build(self) -> Option<CandidateEntry> {
        let title = clean_release_title(&self.title?);
        let size_bytes = self.size_bytes?;
        let guid = self.guid.or_else(|| self.link.clone())?;

        let publish_epoch = self
            .pub_date
            .as_deref()
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
