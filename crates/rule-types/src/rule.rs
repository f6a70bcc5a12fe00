//! Stored rule record and scope types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::key::RuleKey;

/// Context a rule definition belongs to: the platform itself, or one
/// organization's customization of it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RuleScope {
    /// Built-in definition shared by everyone
    System,
    /// Organization-specific definition, identified by organization uuid
    Organization(String),
}

impl RuleScope {
    /// Stable string form used in search-document identity.
    pub fn scope_key(&self) -> String {
        match self {
            RuleScope::System => "system".to_string(),
            RuleScope::Organization(uuid) => uuid.clone(),
        }
    }

    /// Scope derived from the nullable organization column.
    pub fn from_organization(organization_uuid: Option<&str>) -> Self {
        match organization_uuid {
            Some(uuid) if !uuid.is_empty() => RuleScope::Organization(uuid.to_string()),
            _ => RuleScope::System,
        }
    }
}

/// One stored rule row.
///
/// `tags` keeps the raw comma-separated column value; parsing into a set
/// happens at document-production time so the stored form stays byte-exact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleRecord {
    /// Repository (plugin) declaring the rule
    pub repository: String,

    /// Rule name local to the repository
    pub rule: String,

    /// Human-readable rule name
    pub name: String,

    /// Whether this rule is a template other rules are instantiated from
    #[serde(default)]
    pub is_template: bool,

    /// Owning organization, absent for system rules
    #[serde(default)]
    pub organization_uuid: Option<String>,

    /// Comma-separated tags, possibly empty
    #[serde(default)]
    pub tags: String,

    /// Creation timestamp
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl RuleRecord {
    /// Create a record with the mandatory fields; optional fields default.
    pub fn new(
        repository: impl Into<String>,
        rule: impl Into<String>,
        name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            repository: repository.into(),
            rule: rule.into(),
            name: name.into(),
            is_template: false,
            organization_uuid: None,
            tags: String::new(),
            created_at,
        }
    }

    /// Mark the record as a template.
    pub fn as_template(mut self) -> Self {
        self.is_template = true;
        self
    }

    /// Attach an owning organization.
    pub fn with_organization(mut self, uuid: impl Into<String>) -> Self {
        self.organization_uuid = Some(uuid.into());
        self
    }

    /// Set the raw comma-separated tags column.
    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = tags.into();
        self
    }

    /// The record's rule key.
    pub fn key(&self) -> RuleKey {
        RuleKey::new(self.repository.clone(), self.rule.clone())
    }

    /// The record's scope.
    pub fn scope(&self) -> RuleScope {
        RuleScope::from_organization(self.organization_uuid.as_deref())
    }

    /// Whether the tags column carries anything indexable.
    pub fn has_tags(&self) -> bool {
        !self.tags.trim().is_empty()
    }

    /// Serialize to JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
