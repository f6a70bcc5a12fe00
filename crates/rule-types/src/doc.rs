//! Search-document type produced by scans.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::key::RuleKey;
use crate::rule::{RuleRecord, RuleScope};
use crate::tags::parse_tags;

/// Normalized record produced from one stored rule row, destined for the
/// search index. Immutable after construction; ownership moves to the
/// consumer as soon as a scan yields it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDoc {
    /// Originating rule key
    pub key: RuleKey,
    /// Scope the definition belongs to
    pub scope: RuleScope,
    /// Human-readable rule name
    pub name: String,
    /// Parsed tag set (trimmed, empties dropped)
    pub tags: BTreeSet<String>,
}

impl RuleDoc {
    /// Build a document from a stored record.
    pub fn from_record(record: &RuleRecord) -> Self {
        Self {
            key: record.key(),
            scope: record.scope(),
            name: record.name.clone(),
            tags: parse_tags(&record.tags),
        }
    }

    /// Identity of the document in the search index.
    ///
    /// A rule can be indexed once per scope, so both parts participate.
    pub fn doc_id(&self) -> String {
        format!("{}|{}", self.scope.scope_key(), self.key)
    }
}
