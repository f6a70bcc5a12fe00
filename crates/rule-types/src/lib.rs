//! # rule-types
//!
//! Shared domain types for the rule-index system.
//!
//! This crate defines the core data structures used throughout the system:
//! - [`RuleKey`]: totally ordered identifier of an analysis rule
//! - [`RuleRecord`]: the stored row for one rule
//! - [`RuleScope`]: which context a rule definition belongs to
//! - [`RuleDoc`]: the normalized record produced for the search index
//! - [`parse_tags`]: comma-separated tag column parsing

pub mod doc;
pub mod key;
pub mod rule;
pub mod tags;

pub use doc::RuleDoc;
pub use key::{RuleKey, RuleKeyParseError};
pub use rule::{RuleRecord, RuleScope};
pub use tags::parse_tags;
