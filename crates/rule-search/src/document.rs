//! Document mapping from scan output to Tantivy documents.

use tantivy::doc;
use tantivy::TantivyDocument;

use rule_types::RuleDoc;

use crate::schema::RuleSearchSchema;

/// Convert a scan-produced rule document to a Tantivy document.
///
/// Tags are space-joined for full-text matching; the parsed set order is
/// deterministic so the joined form is too.
pub fn rule_doc_to_tantivy(schema: &RuleSearchSchema, rule: &RuleDoc) -> TantivyDocument {
    let tags = rule
        .tags
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");

    doc!(
        schema.doc_id => rule.doc_id(),
        schema.key => rule.key.to_string(),
        schema.repository => rule.key.repository.clone(),
        schema.scope => rule.scope.scope_key(),
        schema.name => rule.name.clone(),
        schema.tags => tags
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::build_rule_schema;
    use chrono::Utc;
    use rule_types::RuleRecord;
    use tantivy::schema::Value;

    #[test]
    fn test_rule_doc_mapping() {
        let schema = build_rule_schema();
        let record = RuleRecord::new("squid", "S100", "Method names", Utc::now())
            .with_tags("convention, style");
        let rule = RuleDoc::from_record(&record);

        let doc = rule_doc_to_tantivy(&schema, &rule);

        let get = |field| {
            doc.get_first(field)
                .and_then(|v| v.as_str())
                .unwrap()
                .to_string()
        };
        assert_eq!(get(schema.doc_id), "system|squid:S100");
        assert_eq!(get(schema.key), "squid:S100");
        assert_eq!(get(schema.repository), "squid");
        assert_eq!(get(schema.scope), "system");
        assert_eq!(get(schema.tags), "convention style");
    }
}
