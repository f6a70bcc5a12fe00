//! Search implementation using BM25 scoring.
//!
//! Provides keyword search over rule names and tags.

use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, QueryParser, TermQuery};
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::{IndexReader, Term};
use tracing::{debug, info};

use crate::error::SearchError;
use crate::index::RuleIndex;
use crate::schema::RuleSearchSchema;

/// A search result with relevance score.
#[derive(Debug, Clone)]
pub struct RuleHit {
    /// Scope-qualified document id
    pub doc_id: String,
    /// Full rule key `repository:rule`
    pub key: String,
    /// Scope key: "system" or organization uuid
    pub scope: String,
    /// Rule name (if stored)
    pub name: Option<String>,
    /// BM25 relevance score
    pub score: f32,
}

/// Search options for filtering and limiting results.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Filter by repository (None = all repositories)
    pub repository: Option<String>,
    /// Maximum results to return
    pub limit: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            repository: None,
            limit: 10,
        }
    }
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }
}

/// Searcher for rule queries using BM25 ranking.
pub struct RuleSearcher {
    reader: IndexReader,
    schema: RuleSearchSchema,
    query_parser: QueryParser,
}

impl RuleSearcher {
    /// Create a new searcher from a RuleIndex.
    pub fn new(index: &RuleIndex) -> Result<Self, SearchError> {
        let reader = index.reader()?;
        let schema = index.schema().clone();

        // Query parser targeting name and tags fields
        let query_parser = QueryParser::for_index(index.index(), vec![schema.name, schema.tags]);

        Ok(Self {
            reader,
            schema,
            query_parser,
        })
    }

    /// Reload the reader to see recent commits.
    pub fn reload(&self) -> Result<(), SearchError> {
        self.reader.reload()?;
        debug!("Reloaded rule search reader");
        Ok(())
    }

    /// Search with a query string.
    ///
    /// Uses BM25 scoring over name and tags fields.
    pub fn search(
        &self,
        query_str: &str,
        options: SearchOptions,
    ) -> Result<Vec<RuleHit>, SearchError> {
        if query_str.trim().is_empty() {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();

        let text_query = self.query_parser.parse_query(query_str)?;

        // Apply repository filter if specified
        let final_query = if let Some(repository) = &options.repository {
            let repo_term = Term::from_field_text(self.schema.repository, repository);
            let repo_query = TermQuery::new(repo_term, IndexRecordOption::Basic);

            Box::new(BooleanQuery::new(vec![
                (Occur::Must, text_query),
                (Occur::Must, Box::new(repo_query)),
            ]))
        } else {
            text_query
        };

        let top_docs = searcher.search(&final_query, &TopDocs::with_limit(options.limit))?;

        let mut results = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let doc: tantivy::TantivyDocument = searcher.doc(doc_address)?;

            let doc_id = doc
                .get_first(self.schema.doc_id)
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();

            let key = doc
                .get_first(self.schema.key)
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();

            let scope = doc
                .get_first(self.schema.scope)
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();

            let name = doc
                .get_first(self.schema.name)
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
                .filter(|s| !s.is_empty());

            results.push(RuleHit {
                doc_id,
                key,
                scope,
                name,
                score,
            });
        }

        info!(
            query = query_str,
            results = results.len(),
            "Rule search complete"
        );

        Ok(results)
    }

    /// Get the number of indexed documents.
    pub fn num_docs(&self) -> u64 {
        let searcher = self.reader.searcher();
        searcher
            .segment_readers()
            .iter()
            .map(|r| r.num_docs() as u64)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{RuleIndex, RuleIndexConfig};
    use crate::indexer::RuleIndexer;
    use chrono::Utc;
    use rule_types::{RuleDoc, RuleRecord};
    use tempfile::TempDir;

    fn seeded_index(dir: &TempDir) -> RuleIndex {
        let index = RuleIndex::open_or_create(RuleIndexConfig::new(dir.path())).unwrap();
        let indexer = RuleIndexer::new(&index).unwrap();

        let docs: Vec<RuleDoc> = [
            ("squid", "S100", "Method naming convention", "convention,naming"),
            ("squid", "S200", "Unused import", "unused"),
            ("clippy", "todo", "TODO marker left in code", "convention"),
        ]
        .iter()
        .map(|(repo, rule, name, tags)| {
            RuleDoc::from_record(
                &RuleRecord::new(*repo, *rule, *name, Utc::now()).with_tags(*tags),
            )
        })
        .collect();

        indexer.index_docs(&docs).unwrap();
        indexer.commit().unwrap();
        index
    }

    #[test]
    fn test_search_by_tag() {
        let dir = TempDir::new().unwrap();
        let index = seeded_index(&dir);
        let searcher = RuleSearcher::new(&index).unwrap();

        let hits = searcher.search("convention", SearchOptions::new()).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_search_with_repository_filter() {
        let dir = TempDir::new().unwrap();
        let index = seeded_index(&dir);
        let searcher = RuleSearcher::new(&index).unwrap();

        let hits = searcher
            .search("convention", SearchOptions::new().with_repository("clippy"))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key, "clippy:todo");
        assert_eq!(hits[0].scope, "system");
    }

    #[test]
    fn test_empty_query_returns_nothing() {
        let dir = TempDir::new().unwrap();
        let index = seeded_index(&dir);
        let searcher = RuleSearcher::new(&index).unwrap();

        assert!(searcher.search("  ", SearchOptions::new()).unwrap().is_empty());
    }
}
