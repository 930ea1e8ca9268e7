use rusqlite::{params, Connection, OptionalExtension, Result};
use std::path::Path;
use tracing::debug;

/// Durable key-value store using SQLite
///
/// Each key holds one whole value. Writes replace the value in a single
/// statement, so a reader never sees half of an update.
pub struct StateCache {
    conn: Connection,
}

impl StateCache {
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref())?;
        debug!("Opened state cache at {}", db_path.as_ref().display());

        // Initialize schema on first run
        Self::init_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Throwaway store, gone when dropped
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS local_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM local_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
    }

    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO local_state (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, chrono::Utc::now().timestamp()],
        )?;
        Ok(())
    }

    /// Returns true if the key existed
    pub fn remove(&self, key: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM local_state WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }

    /// When a key was last written, as a Unix timestamp
    pub fn updated_at(&self, key: &str) -> Result<Option<i64>> {
        self.conn
            .query_row(
                "SELECT updated_at FROM local_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
    }
}
