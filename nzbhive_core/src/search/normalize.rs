//! Candidate-to-canonical normalization.
//!
//! Pure mapping, no I/O. Responsible for title cleanup, composite-guid
//! construction and age derivation against the aggregation clock.

use chrono::{DateTime, TimeZone, Utc};

use crate::search::types::{encode_guid, CandidateEntry, CanonicalResult, Provenance};
use crate::util::clean_release_title;

/// Convert one provider-local candidate into the canonical schema.
///
/// `now` is the single clock sample taken at the start of the aggregation
/// run; `age_days` is always derived from it, never provider-supplied.
pub fn normalize(candidate: CandidateEntry, indexer: &str, now: DateTime<Utc>) -> CanonicalResult {
    let title = clean_release_title(&candidate.title);
    let guid = encode_guid(indexer, &candidate.guid, &title);

    let (publish_epoch, publish_date_utc, age_days) = match candidate.publish_epoch {
        Some(epoch) => {
            let age_days = (now.timestamp() - epoch).max(0) / 86_400;
            let date_utc = Utc
                .timestamp_opt(epoch, 0)
                .single()
                .map(|date| date.to_rfc3339());
            (Some(epoch), date_utc, Some(age_days))
        }
        None => (None, None, None),
    };

    CanonicalResult {
        indexer: indexer.to_string(),
        guid,
        title,
        size_bytes: candidate.size_bytes,
        publish_epoch,
        publish_date_utc,
        age_days,
        age_precise: candidate.age_precise && publish_epoch.is_some(),
        category: candidate.category,
        download_url: candidate.download_url,
        seen_on: vec![Provenance {
            indexer: indexer.to_string(),
            guid: candidate.guid,
        }],
    }
}
