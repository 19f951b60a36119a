//! Cross-provider result merging.
//!
//! Two results are the same release when their normalized titles match and
//! their reported sizes are within a small relative tolerance (encoders on
//! different providers report slightly different sizes for the same upload).
//! The survivor keeps the earliest publish time seen, is attributed to the
//! indexer with the better historical record, and accumulates every
//! (indexer, guid) sighting so no provenance is lost.

use std::collections::HashMap;

use crate::search::types::CanonicalResult;
use crate::stats::StatsAggregator;
use crate::util::title_key;

/// Relative size tolerance for considering two results the same release.
const SIZE_TOLERANCE: f64 = 0.01;

fn sizes_match(a: u64, b: u64) -> bool {
    let (a, b) = (a as f64, b as f64);
    (a - b).abs() <= a.max(b) * SIZE_TOLERANCE
}

/// Merge duplicates. `request_counts` holds each indexer's parsed result
/// count for this request, used as the tie-break when two indexers have
/// indistinguishable historical scores.
pub fn merge(
    results: Vec<CanonicalResult>,
    stats: &StatsAggregator,
    request_counts: &HashMap<String, usize>,
) -> Vec<CanonicalResult> {
    let mut groups: HashMap<String, Vec<CanonicalResult>> = HashMap::new();
    for result in results {
        groups.entry(title_key(&result.title)).or_default().push(result);
    }

    let mut merged = Vec::new();
    for (_, group) in groups {
        let mut clusters: Vec<CanonicalResult> = Vec::new();
        for result in group {
            match clusters
                .iter_mut()
                .find(|c| sizes_match(c.size_bytes, result.size_bytes))
            {
                Some(existing) => merge_into(existing, result, stats, request_counts),
                None => clusters.push(result),
            }
        }
        merged.extend(clusters);
    }
    merged
}

fn merge_into(
    existing: &mut CanonicalResult,
    incoming: CanonicalResult,
    stats: &StatsAggregator,
    request_counts: &HashMap<String, usize>,
) {
    // Earliest sighting wins the publish fields, whichever record it came
    // from.
    let earliest_from_incoming = match (existing.publish_epoch, incoming.publish_epoch) {
        (Some(a), Some(b)) => b < a,
        (None, Some(_)) => true,
        _ => false,
    };
    let publish = if earliest_from_incoming {
        (
            incoming.publish_epoch,
            incoming.publish_date_utc.clone(),
            incoming.age_days,
            incoming.age_precise,
        )
    } else {
        (
            existing.publish_epoch,
            existing.publish_date_utc.clone(),
            existing.age_days,
            existing.age_precise,
        )
    };

    let mut seen_on = existing.seen_on.clone();
    for provenance in &incoming.seen_on {
        if !seen_on.contains(provenance) {
            seen_on.push(provenance.clone());
        }
    }

    if prefer_incoming(existing, &incoming, stats, request_counts) {
        *existing = incoming;
    }

    existing.seen_on = seen_on;
    existing.publish_epoch = publish.0;
    existing.publish_date_utc = publish.1;
    existing.age_days = publish.2;
    existing.age_precise = publish.3;
}

/// Should the incoming record's indexer become the primary provenance?
fn prefer_incoming(
    existing: &CanonicalResult,
    incoming: &CanonicalResult,
    stats: &StatsAggregator,
    request_counts: &HashMap<String, usize>,
) -> bool {
    let existing_stats = stats.snapshot_for(&existing.indexer);
    let incoming_stats = stats.snapshot_for(&incoming.indexer);

    match (existing_stats, incoming_stats) {
        (Some(a), Some(b)) => match b.outranks(&a) {
            Some(preferred) => preferred,
            // Scores are equal: the indexer that returned more results for
            // this request likely has the more complete metadata.
            None => {
                request_counts.get(&incoming.indexer).copied().unwrap_or(0)
                    > request_counts.get(&existing.indexer).copied().unwrap_or(0)
            }
        },
        (None, Some(_)) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::normalize;
    use crate::search::types::{CandidateEntry, Provenance};
    use crate::search::IndexerOutcome;
    use chrono::Utc;

    fn result(
        indexer: &str,
        title: &str,
        size_bytes: u64,
        publish_epoch: Option<i64>,
    ) -> CanonicalResult {
        normalize(
            CandidateEntry {
                title: title.to_string(),
                size_bytes,
                publish_epoch,
                age_precise: publish_epoch.is_some(),
                guid: format!("{}-{}", indexer, title.len()),
                download_url: None,
                category: None,
            },
            indexer,
            Utc::now(),
        )
    }

    #[test]
    fn test_title_variants_within_tolerance_collapse() {
        let stats = StatsAggregator::new();
        let merged = merge(
            vec![
                result("alpha", "Some Release 720p", 1_000_000_000, Some(1_000)),
                result("beta", "some.release.720P", 1_005_000_000, Some(2_000)),
            ],
            &stats,
            &HashMap::new(),
        );

        assert_eq!(merged.len(), 1);
        let survivor = &merged[0];
        assert_eq!(survivor.seen_on.len(), 2);
        assert!(survivor.seen_on.iter().any(|p| p.indexer == "alpha"));
        assert!(survivor.seen_on.iter().any(|p| p.indexer == "beta"));
        // Earliest publish time survives
        assert_eq!(survivor.publish_epoch, Some(1_000));
    }

    #[test]
    fn test_size_outside_tolerance_stays_separate() {
        let stats = StatsAggregator::new();
        let merged = merge(
            vec![
                result("alpha", "Some Release", 1_000_000_000, None),
                result("beta", "Some Release", 1_100_000_000, None),
            ],
            &stats,
            &HashMap::new(),
        );
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_different_titles_stay_separate() {
        let stats = StatsAggregator::new();
        let merged = merge(
            vec![
                result("alpha", "Some Release 720p", 1_000_000_000, None),
                result("alpha", "Some Release 1080p", 1_000_000_000, None),
            ],
            &stats,
            &HashMap::new(),
        );
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_primary_goes_to_better_history() {
        let stats = StatsAggregator::new();
        stats.record_outcomes(&[
            IndexerOutcome::ok("reliable", 100, 10),
            IndexerOutcome::failed("flaky", 100, "boom", false),
            IndexerOutcome::ok("flaky", 100, 10),
        ]);

        let merged = merge(
            vec![
                result("flaky", "Some Release", 1_000_000_000, None),
                result("reliable", "Some Release", 1_000_000_000, None),
            ],
            &stats,
            &HashMap::new(),
        );

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].indexer, "reliable");
        assert_eq!(merged[0].seen_on.len(), 2);
    }

    #[test]
    fn test_equal_history_tie_broken_by_request_count() {
        let stats = StatsAggregator::new();
        stats.record_outcomes(&[
            IndexerOutcome::ok("alpha", 100, 5),
            IndexerOutcome::ok("beta", 100, 5),
        ]);

        let counts = HashMap::from([("alpha".to_string(), 3), ("beta".to_string(), 40)]);
        let merged = merge(
            vec![
                result("alpha", "Some Release", 1_000_000_000, None),
                result("beta", "Some Release", 1_000_000_000, None),
            ],
            &stats,
            &counts,
        );

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].indexer, "beta");
    }

    #[test]
    fn test_original_guids_stay_resolvable() {
        let stats = StatsAggregator::new();
        let a = result("alpha", "Some Release", 1_000_000_000, None);
        let b = result("beta", "Some Release", 1_000_000_000, None);
        let a_provenance = a.seen_on[0].clone();
        let b_provenance = b.seen_on[0].clone();

        let merged = merge(vec![a, b], &stats, &HashMap::new());
        assert_eq!(merged.len(), 1);
        assert!(merged[0].seen_on.contains(&a_provenance));
        assert!(merged[0].seen_on.contains(&b_provenance));
        assert!(matches!(
            merged[0].seen_on[0],
            Provenance { ref indexer, .. } if !indexer.is_empty()
        ));
    }
}
