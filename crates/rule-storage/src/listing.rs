//! Paged rule listing with selectable response fields.
//!
//! Administrative listings read the same store as the scan engine but
//! through a simpler offset/limit bounded select. Callers name which
//! response fields they want from a fixed enumerated set; unrequested
//! fields stay unset rather than being serialized as empty values.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use rule_types::RuleKey;

use crate::db::DbSession;
use crate::error::StorageError;

/// Response fields a listing caller may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListField {
    Key,
    Name,
    CreationDate,
}

impl ListField {
    /// Wire name of the field.
    pub fn name(&self) -> &'static str {
        match self {
            ListField::Key => "key",
            ListField::Name => "name",
            ListField::CreationDate => "creationDate",
        }
    }

    /// All field names, in response order.
    pub fn names() -> Vec<&'static str> {
        ALL_FIELDS.iter().map(ListField::name).collect()
    }

    /// Whether this field was requested. An empty request means all fields.
    pub fn is_requested(&self, desired: &[ListField]) -> bool {
        desired.is_empty() || desired.contains(self)
    }
}

const ALL_FIELDS: &[ListField] = &[ListField::Key, ListField::Name, ListField::CreationDate];

/// One listed rule, with only the requested fields populated.
#[derive(Debug, Clone, Serialize)]
pub struct ListedRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<DateTime<Utc>>,
}

/// One page of listed rules.
#[derive(Debug, Clone, Serialize)]
pub struct RulePage {
    pub rules: Vec<ListedRule>,
    /// Total matches across all pages
    pub total: u64,
    /// 1-based page number
    pub page: usize,
    pub page_size: usize,
}

/// List rules page by page, optionally filtered by a substring query over
/// key and name. `page` is 1-based.
pub fn list_rules(
    session: &DbSession<'_>,
    query: Option<&str>,
    desired_fields: &[ListField],
    page: usize,
    page_size: usize,
) -> Result<RulePage, StorageError> {
    assert!(page >= 1, "page is 1-based");
    assert!(page_size >= 1, "page_size must be positive");

    let offset = (page - 1) * page_size;
    let query_lower = query.map(str::to_lowercase);

    let mut cursor = session.scan_all(false, false)?;
    let mut total = 0u64;
    let mut rules = Vec::new();

    loop {
        let record = match cursor.fetch_next() {
            Ok(Some(record)) => record,
            Ok(None) => break,
            Err(e) => {
                cursor.close();
                return Err(e);
            }
        };
        if let Some(q) = &query_lower {
            let key = RuleKey::new(record.repository.clone(), record.rule.clone());
            if !key.to_string().to_lowercase().contains(q)
                && !record.name.to_lowercase().contains(q)
            {
                continue;
            }
        }
        let index = total as usize;
        total += 1;
        if index < offset || rules.len() >= page_size {
            continue;
        }
        rules.push(ListedRule {
            key: ListField::Key
                .is_requested(desired_fields)
                .then(|| record.key().to_string()),
            name: ListField::Name
                .is_requested(desired_fields)
                .then(|| record.name.clone()),
            creation_date: ListField::CreationDate
                .is_requested(desired_fields)
                .then_some(record.created_at),
        });
    }
    cursor.close();

    debug!(total, page, page_size, "Listed rules");
    Ok(RulePage {
        rules,
        total,
        page,
        page_size,
    })
}
