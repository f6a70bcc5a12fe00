//! Column family definitions for RocksDB.
//!
//! Rule records live in a single column family; the encoded record keys
//! sort lexicographically in `RuleKey` order, so full scrolls visit rules
//! repository by repository.

use rocksdb::{ColumnFamilyDescriptor, Options};

/// Column family name for rule records
pub const CF_RULES: &str = "rules";

/// All column family names
pub const ALL_CF_NAMES: &[&str] = &[CF_RULES];

/// Create column family options for rule records (read-mostly, compressed)
fn rules_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
    opts
}

/// Build all column family descriptors
pub fn build_cf_descriptors() -> Vec<ColumnFamilyDescriptor> {
    vec![ColumnFamilyDescriptor::new(CF_RULES, rules_options())]
}
