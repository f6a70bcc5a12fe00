//! Scan contract and shared cursor-driven scan machinery.
//!
//! Every scan in this crate — single chunk, full metadata scroll, or the
//! multi-chunk composition — exposes the same pull-based [`DocScan`]
//! contract, so chunking stays an invisible implementation detail to
//! consumers.

use thiserror::Error;

use rule_storage::{ChunkCursor, FullScanCursor, StorageError};
use rule_types::{RuleDoc, RuleRecord};

/// Errors a scan can surface.
///
/// Nothing here is retried internally; the caller decides whether to
/// rebuild the whole scan (reads are idempotent) or abort the run.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Query could not be prepared against the store. Not retryable on the
    /// same scan instance; any partially opened resource was released.
    #[error("scan setup failed: {source}")]
    Setup {
        #[source]
        source: StorageError,
    },

    /// Row fetch failed mid-scan. The cursor was released before this
    /// propagated.
    #[error("scan read failed: {source}")]
    Read {
        #[source]
        source: StorageError,
    },

    /// `next_doc` was called with no elements remaining. Caller bug.
    #[error("scan iterator is exhausted")]
    Exhausted,

    /// `next_doc` was called after `close`. Caller bug.
    #[error("scan iterator is closed")]
    Closed,
}

/// Pull-based document scan.
///
/// Single-consumer and synchronous; `has_next`/`next_doc` may block on
/// I/O. `close` is idempotent and must be safe from any state, including
/// before the first pull and after exhaustion.
pub trait DocScan {
    /// Whether another document can be pulled. `false` after `close`.
    fn has_next(&mut self) -> Result<bool, ScanError>;

    /// Pull the next document. Fails with [`ScanError::Exhausted`] when no
    /// elements remain and [`ScanError::Closed`] after `close`.
    fn next_doc(&mut self) -> Result<RuleDoc, ScanError>;

    /// Release the scan's resources. Idempotent.
    fn close(&mut self);
}

/// Uniform view over the storage cursor flavors.
pub(crate) trait RecordCursor {
    fn fetch_next(&mut self) -> Result<Option<RuleRecord>, StorageError>;
    fn close(&mut self);
}

impl RecordCursor for ChunkCursor<'_> {
    fn fetch_next(&mut self) -> Result<Option<RuleRecord>, StorageError> {
        ChunkCursor::fetch_next(self)
    }

    fn close(&mut self) {
        ChunkCursor::close(self)
    }
}

impl RecordCursor for FullScanCursor<'_> {
    fn fetch_next(&mut self) -> Result<Option<RuleRecord>, StorageError> {
        FullScanCursor::fetch_next(self)
    }

    fn close(&mut self) {
        FullScanCursor::close(self)
    }
}

/// State machine shared by the cursor-backed scans: owns exactly one
/// cursor, reads one row ahead to answer `has_next`, and releases the
/// cursor exactly once on exhaustion, error, or close.
pub(crate) struct CursorScan<C: RecordCursor> {
    cursor: Option<C>,
    lookahead: Option<RuleDoc>,
    closed: bool,
}

impl<C: RecordCursor> CursorScan<C> {
    pub(crate) fn new(cursor: C) -> Self {
        Self {
            cursor: Some(cursor),
            lookahead: None,
            closed: false,
        }
    }

    pub(crate) fn has_next(&mut self) -> Result<bool, ScanError> {
        if self.closed || self.lookahead.is_some() {
            return Ok(self.lookahead.is_some());
        }
        let Some(cursor) = self.cursor.as_mut() else {
            return Ok(false);
        };
        match cursor.fetch_next() {
            Ok(Some(record)) => {
                self.lookahead = Some(RuleDoc::from_record(&record));
                Ok(true)
            }
            Ok(None) => {
                // Exhaustion released the cursor internally.
                self.cursor = None;
                Ok(false)
            }
            Err(source) => {
                self.close();
                Err(ScanError::Read { source })
            }
        }
    }

    pub(crate) fn next_doc(&mut self) -> Result<RuleDoc, ScanError> {
        if self.closed {
            return Err(ScanError::Closed);
        }
        if !self.has_next()? {
            return Err(ScanError::Exhausted);
        }
        self.lookahead.take().ok_or(ScanError::Exhausted)
    }

    pub(crate) fn close(&mut self) {
        if let Some(mut cursor) = self.cursor.take() {
            cursor.close();
        }
        self.lookahead = None;
        self.closed = true;
    }
}
