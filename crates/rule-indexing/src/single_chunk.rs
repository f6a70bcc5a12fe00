//! Lazy scan over the records matching one chunk of keys.

use rule_storage::{ChunkCursor, DbSession};
use rule_types::{RuleDoc, RuleKey};

use crate::scan::{CursorScan, DocScan, ScanError};

/// Scan over one chunk of keys.
///
/// Opens exactly one cursor against the borrowed session at construction
/// and releases it on exhaustion or close, whichever comes first. The
/// session itself is never closed here; it belongs to the caller.
pub struct SingleChunkScan<'a> {
    inner: CursorScan<ChunkCursor<'a>>,
}

impl<'a> SingleChunkScan<'a> {
    /// Open the chunk's cursor.
    ///
    /// Fails with [`ScanError::Setup`] when the query cannot be prepared;
    /// the store releases any partially opened resource before the error
    /// reaches the caller.
    pub fn new(
        session: &DbSession<'a>,
        chunk: &[RuleKey],
        exclude_templates: bool,
    ) -> Result<Self, ScanError> {
        let cursor = session
            .scan_chunk(chunk, exclude_templates)
            .map_err(|source| ScanError::Setup { source })?;
        Ok(Self {
            inner: CursorScan::new(cursor),
        })
    }
}

impl DocScan for SingleChunkScan<'_> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rule_storage::RuleStore;
    use rule_types::RuleRecord;
    use tempfile::TempDir;

    fn seeded_store() -> (TempDir, RuleStore) {
        let dir = TempDir::new().unwrap();
        let store = RuleStore::open(dir.path()).unwrap();
        for (repo, rule, tags, template) in [
            ("repoA", "rule1", "a,b", false),
            ("repoA", "rule2", "", false),
            ("repoB", "rule1", "c", true),
        ] {
            let mut record = RuleRecord::new(repo, rule, format!("{}:{}", repo, rule), Utc::now())
                .with_tags(tags);
            if template {
                record = record.as_template();
            }
            store.put_rule(&record).unwrap();
        }
        (dir, store)
    }

    #[test]
    fn test_scan_produces_docs_for_chunk_keys_only() {
        let (_dir, store) = seeded_store();
        let session = store.open_session(true);
        let chunk = vec![RuleKey::new("repoA", "rule1"), RuleKey::new("repoB", "rule1")];

        let mut scan = SingleChunkScan::new(&session, &chunk, false).unwrap();
        let mut keys = Vec::new();
        while scan.has_next().unwrap() {
            keys.push(scan.next_doc().unwrap().key);
        }
        scan.close();

        assert_eq!(keys, chunk);
        assert_eq!(store.open_cursor_count(), 0);
    }

    #[test]
    fn test_exclude_templates_filter() {
        let (_dir, store) = seeded_store();
        let session = store.open_session(true);
        let chunk = vec![RuleKey::new("repoA", "rule1"), RuleKey::new("repoB", "rule1")];

        let mut scan = SingleChunkScan::new(&session, &chunk, true).unwrap();
        let doc = scan.next_doc().unwrap();
        assert_eq!(doc.key, RuleKey::new("repoA", "rule1"));
        assert!(!scan.has_next().unwrap());
    }

    #[test]
    fn test_next_on_exhausted_scan_fails() {
        let (_dir, store) = seeded_store();
        let session = store.open_session(true);

        let mut scan =
            SingleChunkScan::new(&session, &[RuleKey::new("repoA", "rule1")], false).unwrap();
        scan.next_doc().unwrap();
        assert!(matches!(scan.next_doc(), Err(ScanError::Exhausted)));
    }

    #[test]
    fn test_close_is_idempotent_and_releases_cursor() {
        let (_dir, store) = seeded_store();
        let session = store.open_session(true);

        let mut scan =
            SingleChunkScan::new(&session, &[RuleKey::new("repoA", "rule1")], false).unwrap();
        assert_eq!(store.open_cursor_count(), 1);

        scan.close();
        scan.close();
        assert_eq!(store.open_cursor_count(), 0);
        assert!(matches!(scan.next_doc(), Err(ScanError::Closed)));
    }

    #[test]
    fn test_failed_setup_surfaces_without_leaking_a_cursor() {
        let dir = TempDir::new().unwrap();
        let store = RuleStore::open_without_rules_cf(dir.path()).unwrap();
        let session = store.open_session(true);

        let result = SingleChunkScan::new(&session, &[RuleKey::new("repoA", "rule1")], false);
        assert!(matches!(result, Err(ScanError::Setup { .. })));
        assert_eq!(store.open_cursor_count(), 0);
    }

    #[test]
    fn test_tags_parsed_into_doc() {
        let (_dir, store) = seeded_store();
        let session = store.open_session(true);

        let mut scan =
            SingleChunkScan::new(&session, &[RuleKey::new("repoA", "rule1")], false).unwrap();
        let doc = scan.next_doc().unwrap();
        assert!(doc.tags.contains("a"));
        assert!(doc.tags.contains("b"));
    }
}
