//! Indexer for adding rule documents to the Tantivy index.
//!
//! The indexer wraps IndexWriter with shared access via Arc<Mutex>.
//! Documents are not visible until commit() is called.

use std::sync::{Arc, Mutex};

use tantivy::{IndexWriter, Term};
use tracing::{debug, info, warn};

use rule_types::RuleDoc;

use crate::document::rule_doc_to_tantivy;
use crate::error::SearchError;
use crate::index::RuleIndex;
use crate::schema::RuleSearchSchema;

/// Manages rule document indexing operations.
///
/// Upserts by doc_id: re-indexing a document first deletes any previous
/// version, so both the keyed pass and the metadata pass can write the
/// same document without duplicating it.
pub struct RuleIndexer {
    writer: Arc<Mutex<IndexWriter>>,
    schema: RuleSearchSchema,
}

impl RuleIndexer {
    /// Create a new indexer from a RuleIndex.
    pub fn new(index: &RuleIndex) -> Result<Self, SearchError> {
        let writer = index.writer()?;
        let schema = index.schema().clone();

        Ok(Self {
            writer: Arc::new(Mutex::new(writer)),
            schema,
        })
    }

    /// Index one rule document, replacing any previous version.
    pub fn index_doc(&self, rule: &RuleDoc) -> Result<(), SearchError> {
        let writer = self
            .writer
            .lock()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))?;

        let doc_id = rule.doc_id();
        let term = Term::from_field_text(self.schema.doc_id, &doc_id);
        writer.delete_term(term);
        writer.add_document(rule_doc_to_tantivy(&self.schema, rule))?;

        debug!(doc_id = %doc_id, "Indexed rule document");
        Ok(())
    }

    /// Index a batch of rule documents, replacing previous versions.
    pub fn index_docs(&self, rules: &[RuleDoc]) -> Result<usize, SearchError> {
        let writer = self
            .writer
            .lock()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))?;

        let mut count = 0;
        for rule in rules {
            let term = Term::from_field_text(self.schema.doc_id, &rule.doc_id());
            writer.delete_term(term);
            writer.add_document(rule_doc_to_tantivy(&self.schema, rule))?;
            count += 1;
        }

        debug!(count, "Indexed rule document batch");
        Ok(count)
    }

    /// Delete a document by its doc_id.
    pub fn delete_doc(&self, doc_id: &str) -> Result<(), SearchError> {
        let writer = self
            .writer
            .lock()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))?;

        let term = Term::from_field_text(self.schema.doc_id, doc_id);
        writer.delete_term(term);

        debug!(doc_id, "Deleted rule document");
        Ok(())
    }

    /// Commit pending changes to make them searchable.
    ///
    /// This is expensive - batch document adds and commit periodically.
    pub fn commit(&self) -> Result<u64, SearchError> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))?;

        let opstamp = writer.commit()?;
        info!(opstamp, "Committed rule index changes");
        Ok(opstamp)
    }

    /// Rollback uncommitted changes.
    pub fn rollback(&self) -> Result<u64, SearchError> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))?;

        let opstamp = writer.rollback()?;
        warn!(opstamp, "Rolled back rule index changes");
        Ok(opstamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::RuleIndexConfig;
    use crate::searcher::RuleSearcher;
    use chrono::Utc;
    use rule_types::RuleRecord;
    use tempfile::TempDir;

    fn sample_doc(rule: &str, tags: &str) -> RuleDoc {
        let record =
            RuleRecord::new("squid", rule, format!("Rule {}", rule), Utc::now()).with_tags(tags);
        RuleDoc::from_record(&record)
    }

    #[test]
    fn test_index_commit_search() {
        let dir = TempDir::new().unwrap();
        let index = RuleIndex::open_or_create(RuleIndexConfig::new(dir.path())).unwrap();
        let indexer = RuleIndexer::new(&index).unwrap();

        let count = indexer
            .index_docs(&[sample_doc("S100", "naming"), sample_doc("S101", "style")])
            .unwrap();
        assert_eq!(count, 2);
        indexer.commit().unwrap();

        let searcher = RuleSearcher::new(&index).unwrap();
        assert_eq!(searcher.num_docs(), 2);
    }

    #[test]
    fn test_reindex_replaces_by_doc_id() {
        let dir = TempDir::new().unwrap();
        let index = RuleIndex::open_or_create(RuleIndexConfig::new(dir.path())).unwrap();
        let indexer = RuleIndexer::new(&index).unwrap();

        indexer.index_doc(&sample_doc("S100", "old")).unwrap();
        indexer.commit().unwrap();
        indexer.index_doc(&sample_doc("S100", "new")).unwrap();
        indexer.commit().unwrap();

        let searcher = RuleSearcher::new(&index).unwrap();
        assert_eq!(searcher.num_docs(), 1);
    }

    #[test]
    fn test_delete_doc() {
        let dir = TempDir::new().unwrap();
        let index = RuleIndex::open_or_create(RuleIndexConfig::new(dir.path())).unwrap();
        let indexer = RuleIndexer::new(&index).unwrap();

        let doc = sample_doc("S100", "t");
        indexer.index_doc(&doc).unwrap();
        indexer.commit().unwrap();
        indexer.delete_doc(&doc.doc_id()).unwrap();
        indexer.commit().unwrap();

        let searcher = RuleSearcher::new(&index).unwrap();
        assert_eq!(searcher.num_docs(), 0);
    }
}
