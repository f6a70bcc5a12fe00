//! Error types for the indexing pipeline.

use rule_search::SearchError;
use rule_storage::StorageError;
use thiserror::Error;

use crate::scan::ScanError;

/// Errors that can occur in the indexing pipeline
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Storage operation failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Search index operation failed
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// Scan failed or was misused
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IndexingError::Scan(ScanError::Exhausted);
        assert_eq!(err.to_string(), "Scan error: scan iterator is exhausted");

        let err = IndexingError::Storage(StorageError::NotFound("squid:S100".to_string()));
        assert_eq!(err.to_string(), "Storage error: Rule not found: squid:S100");
    }
}
