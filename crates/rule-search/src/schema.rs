//! Tantivy schema definition for the rule index.
//!
//! One document per (scope, rule key) pair. Name and tags are the
//! searchable text; the remaining fields identify and filter.

use tantivy::schema::{Field, Schema, STORED, STRING, TEXT};

use crate::error::SearchError;

/// Schema field handles for efficient access
#[derive(Debug, Clone)]
pub struct RuleSearchSchema {
    schema: Schema,
    /// Document identity: `{scope_key}|{repository}:{rule}` (STRING | STORED)
    pub doc_id: Field,
    /// Full rule key `repository:rule` (STRING | STORED)
    pub key: Field,
    /// Repository component, for filtering (STRING | STORED)
    pub repository: Field,
    /// Scope key: "system" or organization uuid (STRING | STORED)
    pub scope: Field,
    /// Human-readable rule name (TEXT | STORED)
    pub name: Field,
    /// Space-joined tags (TEXT | STORED)
    pub tags: Field,
}

impl RuleSearchSchema {
    /// Get the underlying Tantivy schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Create a RuleSearchSchema from an existing Tantivy Schema
    pub fn from_schema(schema: Schema) -> Result<Self, SearchError> {
        let doc_id = schema
            .get_field("doc_id")
            .map_err(|_| SearchError::SchemaMismatch("missing doc_id field".into()))?;
        let key = schema
            .get_field("key")
            .map_err(|_| SearchError::SchemaMismatch("missing key field".into()))?;
        let repository = schema
            .get_field("repository")
            .map_err(|_| SearchError::SchemaMismatch("missing repository field".into()))?;
        let scope = schema
            .get_field("scope")
            .map_err(|_| SearchError::SchemaMismatch("missing scope field".into()))?;
        let name = schema
            .get_field("name")
            .map_err(|_| SearchError::SchemaMismatch("missing name field".into()))?;
        let tags = schema
            .get_field("tags")
            .map_err(|_| SearchError::SchemaMismatch("missing tags field".into()))?;

        Ok(Self {
            schema,
            doc_id,
            key,
            repository,
            scope,
            name,
            tags,
        })
    }
}

/// Build the rule index schema.
///
/// Schema fields:
/// - doc_id: STRING | STORED - upsert identity
/// - key: STRING | STORED - full rule key
/// - repository: STRING | STORED - filterable repository
/// - scope: STRING | STORED - "system" or organization uuid
/// - name: TEXT | STORED - searchable rule name
/// - tags: TEXT | STORED - searchable space-joined tags
pub fn build_rule_schema() -> RuleSearchSchema {
    let mut schema_builder = Schema::builder();

    let doc_id = schema_builder.add_text_field("doc_id", STRING | STORED);
    let key = schema_builder.add_text_field("key", STRING | STORED);
    let repository = schema_builder.add_text_field("repository", STRING | STORED);
    let scope = schema_builder.add_text_field("scope", STRING | STORED);
    let name = schema_builder.add_text_field("name", TEXT | STORED);
    let tags = schema_builder.add_text_field("tags", TEXT | STORED);

    let schema = schema_builder.build();

    RuleSearchSchema {
        schema,
        doc_id,
        key,
        repository,
        scope,
        name,
        tags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_and_validate_roundtrip() {
        let built = build_rule_schema();
        let validated = RuleSearchSchema::from_schema(built.schema().clone()).unwrap();
        assert_eq!(built.doc_id, validated.doc_id);
        assert_eq!(built.tags, validated.tags);
    }

    #[test]
    fn test_from_schema_rejects_foreign_schema() {
        let mut builder = Schema::builder();
        builder.add_text_field("unrelated", STORED);
        let result = RuleSearchSchema::from_schema(builder.build());
        assert!(matches!(result, Err(SearchError::SchemaMismatch(_))));
    }
}
