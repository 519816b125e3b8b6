//! Result deduplication by normalised URL.
//!
//! Flattened provider output is scanned in order; the first result for
//! each dedup key is kept with its originating provider tag and later
//! duplicates are dropped.

use std::collections::HashSet;

use crate::types::SearchResult;

use super::url_normalize::dedup_key;

/// Deduplicate `results` by [`dedup_key`], keeping first occurrences in
/// their original order.
///
/// Never increases the count and never drops a result whose key is unique.
pub fn deduplicate(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut seen = HashSet::with_capacity(results.len());
    let before = results.len();

    let kept: Vec<SearchResult> = results
        .into_iter()
        .filter(|result| seen.insert(dedup_key(&result.url)))
        .collect();

    tracing::debug!(before, after = kept.len(), "deduplicated results");
    kept
}
