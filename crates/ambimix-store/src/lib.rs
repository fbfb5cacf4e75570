//! Ambimix Store - Preset persistence over a key-value backend.
//!
//! Custom presets are kept as a single JSON document under one key. The
//! backend is anything implementing [`KeyValueStore`]: a SQLite file for the
//! daemon, or an in-memory map for tests and throwaway sessions.

pub mod error;
pub mod memory;
pub mod migrations;
pub mod presets;
pub mod queries;
pub mod schema;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use presets::{PRESETS_KEY, PresetStore};

use directories::ProjectDirs;
use rusqlite::Connection;
use std::path::PathBuf;
use tracing::{debug, info};

/// Abstract persistent key-value storage.
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be written.
    fn set(&mut self, key: &str, value: &str) -> StoreResult<()>;
}

/// SQLite-backed key-value store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create the database at the default location.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or initialized.
    pub fn open() -> StoreResult<Self> {
        let path = Self::default_path()?;
        Self::open_at(path)
    }

    /// Open or create the database at a specific path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or initialized.
    pub fn open_at(path: PathBuf) -> StoreResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!(?path, "Opening database");
        let conn = Connection::open(&path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        migrations::run(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn open_in_memory() -> StoreResult<Self> {
        debug!("Opening in-memory database");
        let conn = Connection::open_in_memory()?;

        migrations::run(&conn)?;
        Ok(Self { conn })
    }

    /// Get the default database path.
    ///
    /// # Errors
    /// Returns an error if no data directory exists for the current user.
    pub fn default_path() -> StoreResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "ambimix", "Ambimix").ok_or(StoreError::NoDataDir)?;
        Ok(dirs.data_dir().join("ambimix.db"))
    }
}
