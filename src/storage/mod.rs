mod store;

pub use store::*;

/// SQL migration for the key-value table
pub const MIGRATION_001_KV: &str = include_str!("migrations/001_kv.sql");
