mod kv;
mod repository;

pub use kv::*;
pub use repository::*;

/// SQL migration for the key-value table
pub const MIGRATION_001_KV: &str = include_str!("migrations/001_kv_entries.sql");
