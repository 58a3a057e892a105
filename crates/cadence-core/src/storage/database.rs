//! SQLite-backed entity store.
//!
//! Provides persistent storage for:
//! - Habits (with their completion history and derived streak/XP)
//! - Reminders
//! - Per-owner profiles carrying the cumulative XP total

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::{data_dir, migrations, EntityStore};
use crate::error::StorageError;

/// SQLite database holding every entity as a JSON body.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open the database at `~/.config/cadence/cadence.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        let path = data_dir()?.join("cadence.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self { conn };
        migrations::migrate(&store.conn)?;
        Ok(store)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        migrations::migrate(&store.conn)?;
        Ok(store)
    }
}

impl EntityStore for SqliteStore {
    fn get_raw(&self, kind: &str, id: &str) -> Result<Option<String>, StorageError> {
        let body = self
            .conn
            .query_row(
                "SELECT body FROM entities WHERE kind = ?1 AND id = ?2",
                params![kind, id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(body)
    }

    fn list_raw(&self, kind: &str, owner_id: &str) -> Result<Vec<(String, String)>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, body FROM entities
             WHERE kind = ?1 AND owner_id = ?2
             ORDER BY id",
        )?;
        let rows = stmt.query_map(params![kind, owner_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn put_raw(&self, kind: &str, id: &str, owner_id: &str, body: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO entities (kind, id, owner_id, body, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![kind, id, owner_id, body, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn delete_raw(&self, kind: &str, id: &str) -> Result<bool, StorageError> {
        let n = self.conn.execute(
            "DELETE FROM entities WHERE kind = ?1 AND id = ?2",
            params![kind, id],
        )?;
        Ok(n > 0)
    }
}
