//! Ordering and pagination of the merged result set.

use std::cmp::Ordering;

use crate::search::types::CanonicalResult;

/// Sort the merged set (newest first, unresolved dates last, title as the
/// deterministic tie-break) and slice out the requested page. The returned
/// total is the full deduplicated set size so callers can page further.
pub fn rank_and_paginate(
    results: &[CanonicalResult],
    offset: usize,
    limit: usize,
) -> (Vec<CanonicalResult>, usize) {
    let mut ordered: Vec<&CanonicalResult> = results.iter().collect();
    ordered.sort_by(|a, b| compare(a, b));

    let page = ordered
        .into_iter()
        .skip(offset)
        .take(limit)
        .cloned()
        .collect();

    (page, results.len())
}

fn compare(a: &CanonicalResult, b: &CanonicalResult) -> Ordering {
    match (a.publish_epoch, b.publish_epoch) {
        (Some(a_epoch), Some(b_epoch)) => b_epoch
            .cmp(&a_epoch)
            .then_with(|| a.title.cmp(&b.title)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.title.cmp(&b.title),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::normalize;
    use crate::search::types::CandidateEntry;
    use chrono::Utc;

    fn result(title: &str, publish_epoch: Option<i64>) -> CanonicalResult {
        normalize(
            CandidateEntry {
                title: title.to_string(),
                size_bytes: 1_000,
                publish_epoch,
                age_precise: publish_epoch.is_some(),
                guid: title.to_string(),
                download_url: None,
                category: None,
            },
            "test",
            Utc::now(),
        )
    }

    #[test]
    fn test_newest_first_nulls_last() {
        let set = vec![
            result("old", Some(1_000)),
            result("dateless-b", None),
            result("new", Some(9_000)),
            result("dateless-a", None),
        ];

        let (page, total) = rank_and_paginate(&set, 0, 10);
        assert_eq!(total, 4);

        let titles: Vec<_> = page.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "old", "dateless-a", "dateless-b"]);

        // Non-increasing epochs over the dated prefix
        let epochs: Vec<_> = page.iter().filter_map(|r| r.publish_epoch).collect();
        assert!(epochs.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_equal_epochs_ordered_by_title() {
        let set = vec![
            result("bravo", Some(5_000)),
            result("alpha", Some(5_000)),
        ];
        let (page, _) = rank_and_paginate(&set, 0, 10);
        assert_eq!(page[0].title, "alpha");
        assert_eq!(page[1].title, "bravo");
    }

    #[test]
    fn test_pagination_slices_ordered_set() {
        let set: Vec<_> = (0..10)
            .map(|i| result(&format!("r{i}"), Some(i * 100)))
            .collect();

        let (page, total) = rank_and_paginate(&set, 3, 4);
        assert_eq!(total, 10);
        assert_eq!(page.len(), 4);
        // Newest is r9; offset 3 starts at r6
        assert_eq!(page[0].title, "r6");
        assert_eq!(page[3].title, "r3");
    }

    #[test]
    fn test_offset_past_end_is_empty_page() {
        let set = vec![result("only", Some(1))];
        let (page, total) = rank_and_paginate(&set, 5, 10);
        assert!(page.is_empty());
        assert_eq!(total, 1);
    }
}
