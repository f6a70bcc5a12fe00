//! # rule-search
//!
//! Full-text rule index using Tantivy.
//!
//! This crate is the consumer side of the scan engine: scans produce a
//! sequence of [`rule_types::RuleDoc`]s, and the indexer here batches them
//! into bulk index writes.
//!
//! ## Features
//! - Embedded Tantivy index with MmapDirectory for persistence
//! - Schema keyed by scope-qualified rule document id
//! - Upsert semantics: re-indexing a document replaces the previous version
//! - BM25 search over rule names and tags with repository filtering

pub mod document;
pub mod error;
pub mod index;
pub mod indexer;
pub mod schema;
pub mod searcher;

pub use document::rule_doc_to_tantivy;
pub use error::SearchError;
pub use index::{RuleIndex, RuleIndexConfig};
pub use indexer::RuleIndexer;
pub use schema::{build_rule_schema, RuleSearchSchema};
pub use searcher::{RuleHit, RuleSearcher, SearchOptions};
