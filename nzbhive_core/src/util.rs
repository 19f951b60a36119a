//! Shared parsing helpers used by the indexer adapters.

use chrono::{NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static SIZE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+(?:\.[0-9]+)?)\s*(KB|MB|GB|TB)").expect("size regex"));

static QUOTED_FILENAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(.*)\.(rar|nfo|mkv|mp4|avi|par2|001|nzb|url|zip|r[0-9]{2})""#)
        .expect("filename regex")
});

static DD_MMM_YYYY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{2}-\w{3}-\d{4})").expect("date regex"));

static RELATIVE_DAYS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+(?:\.[0-9]+)?)\s*(d|day|days|h|hour|hours)").expect("age regex"));

/// Convert a `"1.5" + "GB"` style pair to bytes using binary multiples,
/// rounded to the nearest byte.
pub fn size_to_bytes(value: f64, unit: &str) -> u64 {
    let multiplier = match unit.to_ascii_uppercase().as_str() {
        "KB" => 1024f64,
        "MB" => 1024f64 * 1024.0,
        "GB" => 1024f64 * 1024.0 * 1024.0,
        "TB" => 1024f64 * 1024.0 * 1024.0 * 1024.0,
        _ => 1.0,
    };
    (value * multiplier).round() as u64
}

/// Find a `N.N GB` / `N MB` size anywhere in a text blob (e.g. a result row
/// description). Returns None when no size is present - callers skip the
/// entry rather than failing the batch.
pub fn find_size_in_text(text: &str) -> Option<u64> {
    let caps = SIZE_RE.captures(text)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    Some(size_to_bytes(value, caps.get(2)?.as_str()))
}

/// Strip the quoted-filename noise scraped titles often carry
/// (`"Some.Release.720p.mkv"` -> `Some.Release.720p`), decode HTML entities
/// and collapse whitespace.
pub fn clean_release_title(raw: &str) -> String {
    let stripped = match QUOTED_FILENAME_RE.captures(raw) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(raw).to_string(),
        None => raw.trim_matches('"').to_string(),
    };
    let decoded = html_escape::decode_html_entities(&stripped);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Similarity key for deduplication: lowercase alphanumerics only, so
/// case, whitespace and punctuation differences collapse.
pub fn title_key(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Resolve a terse `DD-MMM-YYYY` provider date (e.g. `07-Aug-2015`) found
/// anywhere in `text` to a UTC midnight epoch. Day granularity only, so the
/// resulting age is not precise.
pub fn find_dd_mmm_yyyy_epoch(text: &str) -> Option<i64> {
    let raw = DD_MMM_YYYY_RE.captures(text)?.get(1)?.as_str();
    let date = NaiveDate::parse_from_str(raw, "%d-%b-%Y").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight).timestamp())
}

/// Resolve a relative `2.3 days` / `5 hours` age string to an approximate
/// absolute epoch against the current clock. Approximate by construction -
/// callers must mark the entry `age_precise = false`.
pub fn relative_age_to_epoch(text: &str) -> Option<i64> {
    let caps = RELATIVE_DAYS_RE.captures(&text.to_ascii_lowercase())?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let seconds = match caps.get(2)?.as_str() {
        "h" | "hour" | "hours" => value * 3600.0,
        _ => value * 86400.0,
    };
    Some(Utc::now().timestamp() - seconds as i64)
}
