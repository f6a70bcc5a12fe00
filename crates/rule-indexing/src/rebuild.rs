//! Pipeline drivers that feed scan output into the search index.
//!
//! Two passes cover the two scan shapes:
//! - keyed: partition a key set and drive the multi-chunk scan
//! - metadata: one full pass over every tagged rule
//!
//! Both passes pull documents one at a time, buffer them into bulk index
//! writes, and commit once at the end. Documents upsert by id, so the
//! passes can run in either order without duplicating index entries.

use tracing::{debug, info};

use rule_search::RuleIndexer;
use rule_storage::DbSession;
use rule_types::RuleKey;

use crate::error::IndexingError;
use crate::metadata::MetadataScan;
use crate::multi_chunk::MultiChunkScan;
use crate::partition::DEFAULT_CHUNK_SIZE;
use crate::scan::DocScan;

/// Configuration for index passes.
#[derive(Debug, Clone)]
pub struct IndexRulesConfig {
    /// Documents per bulk index write.
    pub bulk_size: usize,
    /// Whether template rules are skipped.
    pub exclude_templates: bool,
    /// Maximum keys per chunk for keyed passes.
    pub chunk_size: usize,
}

impl Default for IndexRulesConfig {
    fn default() -> Self {
        Self {
            bulk_size: 100,
            exclude_templates: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl IndexRulesConfig {
    /// Set the bulk write size.
    pub fn with_bulk_size(mut self, size: usize) -> Self {
        self.bulk_size = size;
        self
    }

    /// Set whether template rules are skipped.
    pub fn with_exclude_templates(mut self, exclude: bool) -> Self {
        self.exclude_templates = exclude;
        self
    }

    /// Set the chunk size for keyed passes.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }
}

/// Progress counters for one index pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexProgress {
    /// Documents written to the index.
    pub indexed: u64,
    /// Bulk writes issued.
    pub bulk_writes: u64,
}

impl IndexProgress {
    /// Create an empty progress tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one bulk write of `count` documents.
    pub fn record_bulk(&mut self, count: usize) {
        self.indexed += count as u64;
        self.bulk_writes += 1;
    }
}

/// Index the rules matching a key set.
///
/// Partitions `keys`, scans chunk by chunk, and bulk-loads the produced
/// documents. The scan is closed on every path; a failure bubbles up after
/// cleanup and the caller may retry with a fresh pass (reads are
/// idempotent).
pub fn index_rules_by_keys(
    session: &DbSession<'_>,
    indexer: &RuleIndexer,
    keys: impl IntoIterator<Item = RuleKey>,
    config: &IndexRulesConfig,
) -> Result<IndexProgress, IndexingError> {
    let mut scan =
        MultiChunkScan::with_chunk_size(*session, keys, config.exclude_templates, config.chunk_size);
    let result = drain_into_index(&mut scan, indexer, config);
    scan.close();
    let progress = result?;

    indexer.commit()?;
    info!(
        indexed = progress.indexed,
        bulk_writes = progress.bulk_writes,
        "Keyed rule index pass complete"
    );
    Ok(progress)
}

/// Index side-channel attributes for every tagged rule.
///
/// Runs as its own index-write pass: metadata documents upsert by the same
/// document id as keyed-pass documents, so no in-memory merge happens.
pub fn index_rule_metadata(
    session: &DbSession<'_>,
    indexer: &RuleIndexer,
    config: &IndexRulesConfig,
) -> Result<IndexProgress, IndexingError> {
    let mut scan = MetadataScan::new(session, config.exclude_templates)?;
    let result = drain_into_index(&mut scan, indexer, config);
    scan.close();
    let progress = result?;

    indexer.commit()?;
    info!(
        indexed = progress.indexed,
        bulk_writes = progress.bulk_writes,
        "Metadata index pass complete"
    );
    Ok(progress)
}

/// Pull every document from `scan` and bulk-load it into `indexer`.
fn drain_into_index(
    scan: &mut dyn DocScan,
    indexer: &RuleIndexer,
    config: &IndexRulesConfig,
) -> Result<IndexProgress, IndexingError> {
    let mut progress = IndexProgress::new();
    let mut batch = Vec::with_capacity(config.bulk_size);

    while scan.has_next()? {
        batch.push(scan.next_doc()?);
        if batch.len() >= config.bulk_size {
            let count = indexer.index_docs(&batch)?;
            progress.record_bulk(count);
            debug!(indexed = progress.indexed, "Bulk write issued");
            batch.clear();
        }
    }
    if !batch.is_empty() {
        let count = indexer.index_docs(&batch)?;
        progress.record_bulk(count);
    }

    Ok(progress)
}
