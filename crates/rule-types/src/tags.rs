//! Tag column parsing.

use std::collections::BTreeSet;

/// Parse a comma-separated tags column into a set.
///
/// Tokens are trimmed, empty tokens are dropped, duplicates collapse.
pub fn parse_tags(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
