//! Key encoding and decoding for the storage layer.
//!
//! Key format: `rule:{repository}:{rule}`
//! - prefix: identifies the key type
//! - repository, rule: the two `RuleKey` components
//!
//! Repositories never contain ':' so the encoding round-trips; rule names
//! may, and the decoder only splits the first two separators. Encoded keys
//! order the same way `RuleKey` orders, which keeps RocksDB scan order
//! aligned with the partitioner's sort order.

use rule_types::RuleKey;

use crate::error::StorageError;

/// Storage key for one rule record
/// Format: rule:{repository}:{rule}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRecordKey {
    /// The domain key this storage key encodes
    pub key: RuleKey,
}

impl RuleRecordKey {
    /// Wrap a domain key.
    pub fn new(key: RuleKey) -> Self {
        Self { key }
    }

    /// Encode key to bytes for storage
    pub fn to_bytes(&self) -> Vec<u8> {
        format!("rule:{}:{}", self.key.repository, self.key.rule).into_bytes()
    }

    /// Decode key from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        let s = std::str::from_utf8(bytes)
            .map_err(|e| StorageError::Key(format!("Invalid UTF-8: {}", e)))?;

        let rest = s
            .strip_prefix("rule:")
            .ok_or_else(|| StorageError::Key(format!("Invalid rule key format: {}", s)))?;
        let (repository, rule) = rest
            .split_once(':')
            .ok_or_else(|| StorageError::Key(format!("Invalid rule key format: {}", s)))?;
        if repository.is_empty() || rule.is_empty() {
            return Err(StorageError::Key(format!("Invalid rule key format: {}", s)));
        }

        Ok(Self::new(RuleKey::new(repository, rule)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_record_key_roundtrip() {
        let key = RuleRecordKey::new(RuleKey::new("squid", "S100"));
        let bytes = key.to_bytes();
        let decoded = RuleRecordKey::from_bytes(&bytes).unwrap();
        assert_eq!(key, decoded);
    }

    #[test]
    fn test_rule_record_key_keeps_separators_in_rule_name() {
        let key = RuleRecordKey::new(RuleKey::new("repo", "a:b:c"));
        let decoded = RuleRecordKey::from_bytes(&key.to_bytes()).unwrap();
        assert_eq!(decoded.key.rule, "a:b:c");
    }

    #[test]
    fn test_encoded_order_matches_key_order() {
        let a = RuleRecordKey::new(RuleKey::new("repoA", "rule2"));
        let b = RuleRecordKey::new(RuleKey::new("repoB", "rule1"));
        assert!(a.to_bytes() < b.to_bytes());
    }

    #[test]
    fn test_invalid_formats_rejected() {
        assert!(RuleRecordKey::from_bytes(b"evt:foo:bar").is_err());
        assert!(RuleRecordKey::from_bytes(b"rule:only").is_err());
        assert!(RuleRecordKey::from_bytes(b"rule::name").is_err());
    }
}
