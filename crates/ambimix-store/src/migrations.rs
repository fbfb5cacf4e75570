//! Schema setup, versioned through `PRAGMA user_version`.

use rusqlite::Connection;
use tracing::info;

use crate::error::{StoreError, StoreResult};
use crate::schema::SCHEMA_V1;

/// Schema version this build writes.
const SCHEMA_VERSION: i32 = 1;

/// Create the key-value table on a fresh database.
///
/// A database stamped with a newer version is refused rather than touched.
pub fn run(conn: &Connection) -> StoreResult<()> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    match version {
        0 => {
            conn.execute_batch(&format!("BEGIN;{SCHEMA_V1}PRAGMA user_version = {SCHEMA_VERSION};COMMIT;"))?;
            info!(version = SCHEMA_VERSION, "Created preset schema");
            Ok(())
        }
        SCHEMA_VERSION => Ok(()),
        newer => Err(StoreError::MigrationFailed(format!("Unsupported schema version: {newer}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_version(conn: &Connection) -> i32 {
        conn.query_row("PRAGMA user_version", [], |row| row.get(0)).unwrap()
    }

    #[test]
    fn test_fresh_database_gets_schema() {
        let conn = Connection::open_in_memory().unwrap();

        run(&conn).expect("Schema setup failed");

        assert_eq!(user_version(&conn), SCHEMA_VERSION);
        let count: i32 =
            conn.query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0)).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_rerun_keeps_documents() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        conn.execute("INSERT INTO kv_store (key, value) VALUES ('k', 'v')", []).unwrap();

        run(&conn).expect("Second run failed");

        let value: String =
            conn.query_row("SELECT value FROM kv_store WHERE key = 'k'", [], |row| row.get(0)).unwrap();
        assert_eq!(value, "v");
    }

    #[test]
    fn test_newer_schema_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA user_version = 7;").unwrap();

        assert!(matches!(run(&conn), Err(StoreError::MigrationFailed(_))));
    }
}
