//! Multi-chunk scan composition.
//!
//! Presents the scans of many chunks as one continuous sequence. The
//! state machine is explicit rather than generator-based so that
//! close-on-abandon behavior is testable:
//!
//! - Start: no sub-scanner yet, chunk sequence unconsumed
//! - Advance: while the current sub-scanner is absent or exhausted, open
//!   the next chunk's scanner; no chunk left means Exhausted
//! - Producing: the current sub-scanner has an element; delegate
//! - Exhausted: terminal, `has_next` false, `next_doc` fails
//! - Closed: terminal, reachable from anywhere via `close`

use tracing::debug;

use rule_storage::DbSession;
use rule_types::{RuleDoc, RuleKey};

use crate::partition::{partition_keys, DEFAULT_CHUNK_SIZE};
use crate::scan::{DocScan, ScanError};
use crate::single_chunk::SingleChunkScan;

/// Scan over an arbitrarily large key set, one chunk at a time.
///
/// Holds at most one open [`SingleChunkScan`] at any instant. Construction
/// opens nothing; the first pull opens the first chunk's cursor, so an
/// empty key set never touches the store.
pub struct MultiChunkScan<'a> {
    session: DbSession<'a>,
    chunks: std::vec::IntoIter<Vec<RuleKey>>,
    current: Option<SingleChunkScan<'a>>,
    exclude_templates: bool,
    closed: bool,
}

impl<'a> MultiChunkScan<'a> {
    /// Create a scan over `keys` with the default chunk size.
    pub fn new(
        session: DbSession<'a>,
        keys: impl IntoIterator<Item = RuleKey>,
        exclude_templates: bool,
    ) -> Self {
        Self::with_chunk_size(session, keys, exclude_templates, DEFAULT_CHUNK_SIZE)
    }

    /// Create a scan with an explicit chunk size.
    ///
    /// # Panics
    ///
    /// Panics if `max_chunk_size` is zero.
    pub fn with_chunk_size(
        session: DbSession<'a>,
        keys: impl IntoIterator<Item = RuleKey>,
        exclude_templates: bool,
        max_chunk_size: usize,
    ) -> Self {
        let chunks = partition_keys(keys, max_chunk_size);
        debug!(chunks = chunks.len(), "Prepared multi-chunk scan");
        Self {
            session,
            chunks: chunks.into_iter(),
            current: None,
            exclude_templates,
            closed: false,
        }
    }

    /// Drive the Advance state: ensure the current sub-scanner has an
    /// element, opening the next chunk's scanner as needed.
    fn advance(&mut self) -> Result<bool, ScanError> {
        loop {
            if let Some(current) = self.current.as_mut() {
                if current.has_next()? {
                    return Ok(true);
                }
            }
            match self.chunks.next() {
                Some(chunk) => {
                    // The outgoing scanner already released its cursor at
                    // exhaustion; close is the no-op safety net.
                    if let Some(mut exhausted) = self.current.take() {
                        exhausted.close();
                    }
                    debug!(keys = chunk.len(), "Opening next chunk");
                    self.current = Some(SingleChunkScan::new(
                        &self.session,
                        &chunk,
                        self.exclude_templates,
                    )?);
                }
                None => return Ok(false),
            }
        }
    }
}

impl DocScan for MultiChunkScan<'_> {
    fn has_next(&mut self) -> Result<bool, ScanError> {
        if self.closed {
            return Ok(false);
        }
        self.advance()
    }

    fn next_doc(&mut self) -> Result<RuleDoc, ScanError> {
        if self.closed {
            return Err(ScanError::Closed);
        }
        if !self.advance()? {
            return Err(ScanError::Exhausted);
        }
        match self.current.as_mut() {
            Some(current) => current.next_doc(),
            None => Err(ScanError::Exhausted),
        }
    }

    fn close(&mut self) {
        if let Some(mut current) = self.current.take() {
            current.close();
        }
        self.closed = true;
    }
}
