//! Indexing pipeline for the rule-index system.
//!
//! This crate turns an arbitrarily large set of rule keys into a stream of
//! search documents without materializing the result set and without
//! leaking cursors when consumers stop early.
//!
//! ## Key Components
//!
//! - [`partition_keys`]: deduplicates, orders, and chunks a key set
//! - [`DocScan`]: the pull-based scan contract (`has_next`/`next_doc`/`close`)
//! - [`SingleChunkScan`]: lazy scan over the records of one key chunk
//! - [`MetadataScan`]: full-table scroll over tagged rules
//! - [`MultiChunkScan`]: flattens one scan per chunk into one sequence
//! - [`index_rules_by_keys`] / [`index_rule_metadata`]: drivers that feed
//!   the search indexer in bulk batches
//!
//! ## Architecture
//!
//! 1. The caller supplies a key set and a borrowed read session
//! 2. [`partition_keys`] produces bounded, deterministic chunks
//! 3. [`MultiChunkScan`] drives one [`SingleChunkScan`] per chunk, holding
//!    at most one open cursor at any instant
//! 4. The driver pulls documents one at a time and bulk-loads them into
//!    the Tantivy index
//!
//! ## Example
//!
//! ```ignore
//! use rule_indexing::{index_rules_by_keys, IndexRulesConfig};
//!
//! let session = store.open_session(true);
//! let progress = index_rules_by_keys(&session, &indexer, keys, &IndexRulesConfig::default())?;
//! ```

pub mod error;
pub mod metadata;
pub mod multi_chunk;
pub mod partition;
pub mod rebuild;
pub mod scan;
pub mod single_chunk;

pub use error::IndexingError;
pub use metadata::MetadataScan;
pub use multi_chunk::MultiChunkScan;
pub use partition::{partition_keys, DEFAULT_CHUNK_SIZE};
pub use rebuild::{index_rule_metadata, index_rules_by_keys, IndexProgress, IndexRulesConfig};
pub use scan::{DocScan, ScanError};
pub use single_chunk::SingleChunkScan;
