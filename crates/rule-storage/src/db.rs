//! RocksDB wrapper for rule storage.
//!
//! Provides:
//! - Database open/close with column family setup
//! - Single-key reads and writes for rule records
//! - Read sessions (`DbSession`) that scan code borrows but never owns
//! - Server-side cursors with exactly-once release accounting
//!
//! Cursor accounting is the resource-safety contract the scan engine is
//! built on: every cursor acquires a slot on open and releases it exactly
//! once, on `close()` or on drop, whichever comes first. A preparation
//! failure releases the slot before the error propagates.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use rocksdb::{ColumnFamily, DBIteratorWithThreadMode, IteratorMode, Options, DB};
use tracing::{debug, info};

use rule_types::{RuleKey, RuleRecord};

use crate::column_families::{build_cf_descriptors, ALL_CF_NAMES, CF_RULES};
use crate::error::StorageError;
use crate::keys::RuleRecordKey;

/// Main storage interface for rule records
pub struct RuleStore {
    db: DB,
    /// Cursors currently open against this store
    open_cursors: AtomicU64,
    /// Cursors opened over the store's lifetime
    cursors_opened: AtomicU64,
}

/// Cursor accounting snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Cursors currently open
    pub open_cursors: u64,
    /// Cursors opened since the store was opened
    pub cursors_opened: u64,
}

impl RuleStore {
    /// Open storage at the given path, creating if necessary
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        info!(column_families = ?ALL_CF_NAMES, "Opening rule store at {:?}", path);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_background_jobs(4);

        let cf_descriptors = build_cf_descriptors();
        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        Ok(Self {
            db,
            open_cursors: AtomicU64::new(0),
            cursors_opened: AtomicU64::new(0),
        })
    }

    /// Open a store without attaching the rules column family (for
    /// exercising preparation-failure paths in tests).
    ///
    /// Every cursor preparation against such a store fails with
    /// [`StorageError::ColumnFamilyNotFound`] after releasing its
    /// accounting slot.
    pub fn open_without_rules_cf(path: &Path) -> Result<Self, StorageError> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        let db = DB::open(&db_opts, path)?;

        Ok(Self {
            db,
            open_cursors: AtomicU64::new(0),
            cursors_opened: AtomicU64::new(0),
        })
    }

    fn rules_cf(&self) -> Result<&ColumnFamily, StorageError> {
        self.db
            .cf_handle(CF_RULES)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(CF_RULES.to_string()))
    }

    /// Store a rule record, replacing any previous version
    pub fn put_rule(&self, record: &RuleRecord) -> Result<(), StorageError> {
        let cf = self.rules_cf()?;
        let key = RuleRecordKey::new(record.key());
        self.db.put_cf(cf, key.to_bytes(), record.to_bytes()?)?;
        debug!(key = %record.key(), "Stored rule record");
        Ok(())
    }

    /// Read one rule record, `None` if absent
    pub fn get_rule(&self, key: &RuleKey) -> Result<Option<RuleRecord>, StorageError> {
        let cf = self.rules_cf()?;
        let record_key = RuleRecordKey::new(key.clone());
        match self.db.get_cf(cf, record_key.to_bytes())? {
            Some(bytes) => Ok(Some(RuleRecord::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Delete one rule record, `NotFound` if absent
    pub fn delete_rule(&self, key: &RuleKey) -> Result<(), StorageError> {
        if self.get_rule(key)?.is_none() {
            return Err(StorageError::NotFound(key.to_string()));
        }
        let cf = self.rules_cf()?;
        let record_key = RuleRecordKey::new(key.clone());
        self.db.delete_cf(cf, record_key.to_bytes())?;
        debug!(key = %key, "Deleted rule record");
        Ok(())
    }

    /// Count stored rule records (full scan)
    pub fn rule_count(&self) -> Result<u64, StorageError> {
        let cf = self.rules_cf()?;
        let mut count = 0u64;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            item?;
            count += 1;
        }
        Ok(count)
    }

    /// Open a read session scoped to the caller.
    ///
    /// Scanners borrow the session; closing any scanner never closes the
    /// session, and dropping the session never closes the store.
    pub fn open_session(&self, read_only: bool) -> DbSession<'_> {
        DbSession {
            store: self,
            read_only,
        }
    }

    /// Cursors currently open against this store
    pub fn open_cursor_count(&self) -> u64 {
        self.open_cursors.load(Ordering::SeqCst)
    }

    /// Cursor accounting snapshot
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            open_cursors: self.open_cursors.load(Ordering::SeqCst),
            cursors_opened: self.cursors_opened.load(Ordering::SeqCst),
        }
    }
}

/// A caller-owned read session over the store.
///
/// Holds no server-side resource itself; it is the execution context that
/// cursors are opened in. Shared by reference across every scanner one
/// iteration instantiates.
#[derive(Clone, Copy)]
pub struct DbSession<'a> {
    store: &'a RuleStore,
    read_only: bool,
}

impl<'a> DbSession<'a> {
    /// Whether the session was opened read-only
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// The store this session reads from
    pub fn store(&self) -> &'a RuleStore {
        self.store
    }

    /// Open a cursor over the records matching one chunk of keys.
    ///
    /// Keys are visited in sorted order; keys with no backing record match
    /// nothing. When `exclude_templates` is set, template records are
    /// filtered out server-side.
    pub fn scan_chunk(
        &self,
        keys: &[RuleKey],
        exclude_templates: bool,
    ) -> Result<ChunkCursor<'a>, StorageError> {
        let mut ticket = CursorTicket::acquire(self.store);
        if let Err(e) = self.store.rules_cf() {
            // Failed preparation must not leave the slot held.
            ticket.release();
            return Err(e);
        }

        let mut sorted: Vec<RuleKey> = keys.to_vec();
        sorted.sort();
        sorted.dedup();
        debug!(keys = sorted.len(), exclude_templates, "Opened chunk cursor");

        Ok(ChunkCursor {
            store: self.store,
            ticket,
            pending: sorted.into(),
            exclude_templates,
        })
    }

    /// Open a forward-only cursor over every rule record.
    ///
    /// `require_tags` restricts the scroll to records with a non-empty tags
    /// column; `exclude_templates` filters template records.
    pub fn scan_all(
        &self,
        exclude_templates: bool,
        require_tags: bool,
    ) -> Result<FullScanCursor<'a>, StorageError> {
        let mut ticket = CursorTicket::acquire(self.store);
        let cf = match self.store.rules_cf() {
            Ok(cf) => cf,
            Err(e) => {
                ticket.release();
                return Err(e);
            }
        };

        let iter = self.store.db.iterator_cf(cf, IteratorMode::Start);
        debug!(exclude_templates, require_tags, "Opened full-scan cursor");

        Ok(FullScanCursor {
            ticket,
            iter: Some(iter),
            exclude_templates,
            require_tags,
        })
    }
}

/// Accounting slot held by one open cursor. Released exactly once.
struct CursorTicket<'a> {
    store: &'a RuleStore,
    released: bool,
}

impl<'a> CursorTicket<'a> {
    fn acquire(store: &'a RuleStore) -> Self {
        store.open_cursors.fetch_add(1, Ordering::SeqCst);
        store.cursors_opened.fetch_add(1, Ordering::SeqCst);
        Self {
            store,
            released: false,
        }
    }

    fn release(&mut self) {
        if !self.released {
            self.store.open_cursors.fetch_sub(1, Ordering::SeqCst);
            self.released = true;
        }
    }
}

impl Drop for CursorTicket<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Cursor over the records matching one chunk of keys.
///
/// Lazily fetches one record per `fetch_next` call via point reads over
/// the sorted key list.
pub struct ChunkCursor<'a> {
    store: &'a RuleStore,
    ticket: CursorTicket<'a>,
    pending: VecDeque<RuleKey>,
    exclude_templates: bool,
}

impl ChunkCursor<'_> {
    /// Fetch the next matching record, `None` once the chunk is exhausted.
    ///
    /// A read failure releases the cursor before the error propagates.
    pub fn fetch_next(&mut self) -> Result<Option<RuleRecord>, StorageError> {
        while let Some(key) = self.pending.pop_front() {
            let record = match self.store.get_rule(&key) {
                Ok(record) => record,
                Err(e) => {
                    self.close();
                    return Err(e);
                }
            };
            match record {
                Some(record) if self.exclude_templates && record.is_template => continue,
                Some(record) => return Ok(Some(record)),
                // Key with no backing record matches nothing.
                None => continue,
            }
        }
        self.ticket.release();
        Ok(None)
    }

    /// Release the cursor. Idempotent.
    pub fn close(&mut self) {
        self.pending.clear();
        self.ticket.release();
    }
}

/// Forward-only cursor over the whole rules column family.
pub struct FullScanCursor<'a> {
    ticket: CursorTicket<'a>,
    iter: Option<DBIteratorWithThreadMode<'a, DB>>,
    exclude_templates: bool,
    require_tags: bool,
}

impl FullScanCursor<'_> {
    /// Fetch the next matching record, `None` once the scroll is exhausted.
    ///
    /// A read failure releases the cursor before the error propagates.
    pub fn fetch_next(&mut self) -> Result<Option<RuleRecord>, StorageError> {
        loop {
            let item = match self.iter.as_mut() {
                Some(iter) => iter.next(),
                None => return Ok(None),
            };
            let Some(item) = item else {
                self.close();
                return Ok(None);
            };
            let (_, value) = match item {
                Ok(entry) => entry,
                Err(e) => {
                    self.close();
                    return Err(e.into());
                }
            };
            let record = match RuleRecord::from_bytes(&value) {
                Ok(record) => record,
                Err(e) => {
                    self.close();
                    return Err(e.into());
                }
            };
            if self.require_tags && !record.has_tags() {
                continue;
            }
            if self.exclude_templates && record.is_template {
                continue;
            }
            return Ok(Some(record));
        }
    }

    /// Release the cursor. Idempotent.
    pub fn close(&mut self) {
        self.iter = None;
        self.ticket.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn store() -> (TempDir, RuleStore) {
        let dir = TempDir::new().unwrap();
        let store = RuleStore::open(dir.path()).unwrap();
        (dir, store)
    }

    fn record(repo: &str, rule: &str) -> RuleRecord {
        RuleRecord::new(repo, rule, format!("{} {}", repo, rule), Utc::now())
    }

    #[test]
    fn test_put_get_delete_roundtrip() {
        let (_dir, store) = store();
        let rec = record("squid", "S100").with_tags("style");
        store.put_rule(&rec).unwrap();

        let loaded = store.get_rule(&rec.key()).unwrap().unwrap();
        assert_eq!(loaded.name, rec.name);
        assert_eq!(loaded.tags, "style");

        store.delete_rule(&rec.key()).unwrap();
        assert!(store.get_rule(&rec.key()).unwrap().is_none());
        assert!(matches!(
            store.delete_rule(&rec.key()),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_chunk_cursor_visits_sorted_and_skips_missing() {
        let (_dir, store) = store();
        store.put_rule(&record("repoB", "rule1")).unwrap();
        store.put_rule(&record("repoA", "rule1")).unwrap();

        let session = store.open_session(true);
        let keys = vec![
            RuleKey::new("repoB", "rule1"),
            RuleKey::new("repoA", "rule1"),
            RuleKey::new("ghost", "none"),
        ];
        let mut cursor = session.scan_chunk(&keys, false).unwrap();

        let first = cursor.fetch_next().unwrap().unwrap();
        assert_eq!(first.key(), RuleKey::new("repoA", "rule1"));
        let second = cursor.fetch_next().unwrap().unwrap();
        assert_eq!(second.key(), RuleKey::new("repoB", "rule1"));
        assert!(cursor.fetch_next().unwrap().is_none());
        assert_eq!(store.open_cursor_count(), 0);
    }

    #[test]
    fn test_chunk_cursor_template_filter() {
        let (_dir, store) = store();
        store.put_rule(&record("r", "plain")).unwrap();
        store.put_rule(&record("r", "tmpl").as_template()).unwrap();

        let session = store.open_session(true);
        let keys = vec![RuleKey::new("r", "plain"), RuleKey::new("r", "tmpl")];

        let mut cursor = session.scan_chunk(&keys, true).unwrap();
        let only = cursor.fetch_next().unwrap().unwrap();
        assert_eq!(only.rule, "plain");
        assert!(cursor.fetch_next().unwrap().is_none());
    }

    #[test]
    fn test_full_scan_cursor_filters() {
        let (_dir, store) = store();
        store.put_rule(&record("r", "tagged").with_tags("a,b")).unwrap();
        store.put_rule(&record("r", "untagged")).unwrap();
        store
            .put_rule(&record("r", "tagged-template").with_tags("x").as_template())
            .unwrap();

        let session = store.open_session(true);
        let mut cursor = session.scan_all(true, true).unwrap();
        let only = cursor.fetch_next().unwrap().unwrap();
        assert_eq!(only.rule, "tagged");
        assert!(cursor.fetch_next().unwrap().is_none());
        assert_eq!(store.open_cursor_count(), 0);
    }

    #[test]
    fn test_cursor_accounting_release_exactly_once() {
        let (_dir, store) = store();
        store.put_rule(&record("r", "k")).unwrap();

        let session = store.open_session(true);
        let mut cursor = session.scan_all(false, false).unwrap();
        assert_eq!(store.open_cursor_count(), 1);

        cursor.close();
        cursor.close();
        assert_eq!(store.open_cursor_count(), 0);
        assert!(cursor.fetch_next().unwrap().is_none());

        drop(cursor);
        assert_eq!(store.open_cursor_count(), 0);
        assert_eq!(store.stats().cursors_opened, 1);
    }

    #[test]
    fn test_abandoned_cursor_released_on_drop() {
        let (_dir, store) = store();
        store.put_rule(&record("r", "k")).unwrap();

        let session = store.open_session(true);
        {
            let mut cursor = session.scan_chunk(&[RuleKey::new("r", "k")], false).unwrap();
            assert_eq!(store.open_cursor_count(), 1);
            let _ = cursor.fetch_next().unwrap();
            // Abandoned mid-chunk without close().
        }
        assert_eq!(store.open_cursor_count(), 0);
    }

    #[test]
    fn test_failed_cursor_preparation_releases_slot() {
        let dir = TempDir::new().unwrap();
        let store = RuleStore::open_without_rules_cf(dir.path()).unwrap();
        let session = store.open_session(true);

        let chunk = session.scan_chunk(&[RuleKey::new("r", "k")], false);
        assert!(matches!(chunk, Err(StorageError::ColumnFamilyNotFound(_))));
        assert_eq!(store.open_cursor_count(), 0);

        let scroll = session.scan_all(false, false);
        assert!(matches!(scroll, Err(StorageError::ColumnFamilyNotFound(_))));
        assert_eq!(store.open_cursor_count(), 0);

        // Both attempts acquired a slot before failing
        assert_eq!(store.stats().cursors_opened, 2);
    }

    #[test]
    fn test_rule_count() {
        let (_dir, store) = store();
        assert_eq!(store.rule_count().unwrap(), 0);
        store.put_rule(&record("a", "1")).unwrap();
        store.put_rule(&record("b", "2")).unwrap();
        assert_eq!(store.rule_count().unwrap(), 2);
    }
}
