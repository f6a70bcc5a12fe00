//! Rule key type.
//!
//! A rule is identified by the repository that declares it plus its local
//! name within that repository. The ordering is lexicographic on
//! (repository, rule) and is stable across runs, which chunked scans rely
//! on for deterministic partitioning.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of an analysis rule: `repository:rule`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RuleKey {
    /// Repository (plugin) that declares the rule
    pub repository: String,
    /// Rule name local to the repository
    pub rule: String,
}

/// Error parsing a rule key from its `repository:rule` form.
#[derive(Debug, Error)]
#[error("Invalid rule key: {0}")]
pub struct RuleKeyParseError(pub String);

impl RuleKey {
    /// Create a key from its two components.
    pub fn new(repository: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            rule: rule.into(),
        }
    }
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.rule)
    }
}

impl FromStr for RuleKey {
    type Err = RuleKeyParseError;

    /// Parse from `repository:rule`. The rule part may itself contain ':'
    /// so only the first separator splits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((repository, rule)) if !repository.is_empty() && !rule.is_empty() => {
                Ok(Self::new(repository, rule))
            }
            _ => Err(RuleKeyParseError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_parse_roundtrip() {
        let key = RuleKey::new("clippy", "needless_collect");
        let parsed: RuleKey = key.to_string().parse().unwrap();
        assert_eq!(key, parsed);
    }

    #[test]
    fn test_parse_keeps_extra_separators_in_rule() {
        let key: RuleKey = "squid:S100:extra".parse().unwrap();
        assert_eq!(key.repository, "squid");
        assert_eq!(key.rule, "S100:extra");
    }

    #[test]
    fn test_parse_rejects_missing_parts() {
        assert!("norepo".parse::<RuleKey>().is_err());
        assert!(":rule".parse::<RuleKey>().is_err());
        assert!("repo:".parse::<RuleKey>().is_err());
    }

    #[test]
    fn test_order_is_lexicographic_on_repository_then_rule() {
        let a = RuleKey::new("repoA", "rule2");
        let b = RuleKey::new("repoB", "rule1");
        let c = RuleKey::new("repoA", "rule1");
        assert!(c < a);
        assert!(a < b);
    }
}
