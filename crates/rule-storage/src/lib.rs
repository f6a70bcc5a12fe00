//! Storage layer for the rule-index system.
//!
//! Provides RocksDB-backed rule storage with:
//! - Column family isolation for rule records
//! - Lexicographically encoded keys matching `RuleKey` order
//! - Read sessions that scanners borrow but never own
//! - Accounted server-side cursors (chunk point-read and full scroll)
//! - Offset/limit paged listing with selectable response fields

pub mod column_families;
pub mod db;
pub mod error;
pub mod keys;
pub mod listing;

pub use db::{ChunkCursor, DbSession, FullScanCursor, RuleStore, StoreStats};
pub use error::StorageError;
pub use keys::RuleRecordKey;
pub use listing::{list_rules, ListField, ListedRule, RulePage};
