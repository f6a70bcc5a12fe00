//! Key set partitioning.
//!
//! Backing stores bound how many parameters one query may carry, so a key
//! set of arbitrary size is deduplicated, sorted, and sliced into
//! fixed-maximum-size chunks before querying. Sorting makes chunk
//! assignment deterministic for a given input, which keeps query plans
//! stable and tests reproducible.

use std::collections::BTreeSet;

use rule_types::RuleKey;

/// Maximum keys per chunk unless the caller overrides it.
///
/// Matches the lowest parameter-count limit among supported stores.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Partition a key collection into ordered chunks of unique keys.
///
/// Duplicates collapse before slicing, so a key appears in exactly one
/// chunk. Every chunk holds at most `max_chunk_size` keys; the last chunk
/// may be smaller. An empty input yields zero chunks.
///
/// # Panics
///
/// Panics if `max_chunk_size` is zero.
pub fn partition_keys(
    keys: impl IntoIterator<Item = RuleKey>,
    max_chunk_size: usize,
) -> Vec<Vec<RuleKey>> {
    assert!(max_chunk_size > 0, "max_chunk_size must be positive");

    let unique: BTreeSet<RuleKey> = keys.into_iter().collect();

    let mut chunks = Vec::with_capacity(unique.len().div_ceil(max_chunk_size));
    let mut current = Vec::new();
    for key in unique {
        current.push(key);
        if current.len() == max_chunk_size {
            chunks.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
