//! Full-table scan over tagged rules.
//!
//! Used when side-channel attributes are rebuilt for every record rather
//! than for a known key set: one forward-only scroll over the whole table,
//! restricted to rows whose tags column carries anything.

use rule_storage::{DbSession, FullScanCursor};
use rule_types::RuleDoc;

use crate::scan::{CursorScan, DocScan, ScanError};

/// Scan over every tagged rule in the store.
///
/// Same contract as [`crate::SingleChunkScan`], without a key restriction.
pub struct MetadataScan<'a> {
    inner: CursorScan<FullScanCursor<'a>>,
}

impl<'a> MetadataScan<'a> {
    /// Open the full-table cursor.
    ///
    /// Rows without tags never surface; `exclude_templates` additionally
    /// filters template records.
    pub fn new(session: &DbSession<'a>, exclude_templates: bool) -> Result<Self, ScanError> {
        let cursor = session
            .scan_all(exclude_templates, true)
            .map_err(|source| ScanError::Setup { source })?;
        Ok(Self {
            inner: CursorScan::new(cursor),
        })
    }
}

impl DocScan for MetadataScan<'_> {
    fn has_next(&mut self) -> Result<bool, ScanError> {
        self.inner.has_next()
    }

    fn next_doc(&mut self) -> Result<RuleDoc, ScanError> {
        self.inner.next_doc()
    }

    fn close(&mut self) {
        self.inner.close()
    }
}
