//! Tantivy index lifecycle.
//!
//! One mmap-backed index per directory. Opening is idempotent: a fresh
//! directory gets a new index carrying the rule schema, an existing one
//! is reopened and its persisted schema checked against the fields this
//! crate expects.

use std::fs;
use std::path::{Path, PathBuf};

use tantivy::directory::MmapDirectory;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyError};
use tracing::{debug, info};

use crate::error::SearchError;
use crate::schema::{build_rule_schema, RuleSearchSchema};

/// Default memory budget for IndexWriter (50MB)
const DEFAULT_WRITER_MEMORY_MB: usize = 50;

/// Rule index configuration
#[derive(Debug, Clone)]
pub struct RuleIndexConfig {
    /// Path to index directory
    pub index_path: PathBuf,
    /// Memory budget for writer in MB
    pub writer_memory_mb: usize,
}

impl Default for RuleIndexConfig {
    fn default() -> Self {
        Self::new("./rule-index")
    }
}

impl RuleIndexConfig {
    pub fn new(index_path: impl Into<PathBuf>) -> Self {
        Self {
            index_path: index_path.into(),
            writer_memory_mb: DEFAULT_WRITER_MEMORY_MB,
        }
    }

    pub fn with_memory_mb(mut self, mb: usize) -> Self {
        self.writer_memory_mb = mb;
        self
    }

    fn writer_memory_bytes(&self) -> usize {
        self.writer_memory_mb * 1024 * 1024
    }
}

/// Handle on one on-disk rule index.
pub struct RuleIndex {
    index: Index,
    schema: RuleSearchSchema,
    config: RuleIndexConfig,
}

impl RuleIndex {
    /// Open the index at the configured path, creating it when the
    /// directory holds none.
    ///
    /// A directory that already carries an index with different fields
    /// is rejected rather than overwritten.
    pub fn open_or_create(config: RuleIndexConfig) -> Result<Self, SearchError> {
        fs::create_dir_all(&config.index_path)?;
        let dir = MmapDirectory::open(&config.index_path).map_err(TantivyError::from)?;
        let existed = Index::exists(&dir).map_err(TantivyError::from)?;

        let index = Index::open_or_create(dir, build_rule_schema().schema().clone())?;
        let schema = RuleSearchSchema::from_schema(index.schema())?;
        info!(path = ?config.index_path, existed, "Opened rule index");

        Ok(Self {
            index,
            schema,
            config,
        })
    }

    /// Get the search schema
    pub fn schema(&self) -> &RuleSearchSchema {
        &self.schema
    }

    /// Get the underlying Tantivy index
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Create an IndexWriter with the configured memory budget
    pub fn writer(&self) -> Result<IndexWriter, SearchError> {
        let writer = self.index.writer(self.config.writer_memory_bytes())?;
        debug!(
            memory_mb = self.config.writer_memory_mb,
            "Created index writer"
        );
        Ok(writer)
    }

    /// Create an IndexReader that reloads after each commit
    pub fn reader(&self) -> Result<IndexReader, SearchError> {
        let reader = self
            .index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()?;
        Ok(reader)
    }

    /// Get the index path
    pub fn path(&self) -> &Path {
        &self.config.index_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tantivy::schema::{Schema, TEXT};
    use tempfile::TempDir;

    #[test]
    fn test_create_then_reopen() {
        let dir = TempDir::new().unwrap();
        let config = RuleIndexConfig::new(dir.path());

        {
            let index = RuleIndex::open_or_create(config.clone()).unwrap();
            assert_eq!(index.path(), dir.path());
        }

        let reopened = RuleIndex::open_or_create(config).unwrap();
        assert!(reopened.reader().is_ok());
    }

    #[test]
    fn test_foreign_index_in_directory_rejected() {
        let dir = TempDir::new().unwrap();
        let mut builder = Schema::builder();
        builder.add_text_field("body", TEXT);
        Index::create_in_dir(dir.path(), builder.build()).unwrap();

        let result = RuleIndex::open_or_create(RuleIndexConfig::new(dir.path()));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = RuleIndexConfig::new("/tmp/idx").with_memory_mb(16);
        assert_eq!(config.writer_memory_mb, 16);
    }
}
