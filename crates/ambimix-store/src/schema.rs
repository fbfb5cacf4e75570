//! Database schema definition.

/// Key-value documents, one JSON document per key.
pub const SCHEMA_V1: &str = r"
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
";
