//! SQLite-backed vault store.
//!
//! Entries live in a single key/value table. Blobs are base64 encoded so
//! the TEXT column round-trips arbitrary bytes exactly.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

use crate::provider::VaultStore;
use lockbox_common::{EncryptedBlob, EntryMap, EntryName, Error, Result};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

fn sqlite_error(e: rusqlite::Error) -> Error {
    Error::Storage(format!("SQLite: {}", e))
}

/// Vault store backed by a SQLite database file.
pub struct SqliteVaultStore {
    conn: Mutex<Connection>,
}

impl SqliteVaultStore {
    /// Create or open a vault database.
    ///
    /// # Errors
    /// - Database creation or schema initialization failure
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref()).map_err(sqlite_error)?;
        conn.execute_batch(SCHEMA).map_err(sqlite_error)?;

        info!(path = %db_path.as_ref().display(), "Vault database opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(sqlite_error)?;
        conn.execute_batch(SCHEMA).map_err(sqlite_error)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Storage("Database lock poisoned".to_string()))
    }
}

impl VaultStore for SqliteVaultStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn load(&self) -> Result<EntryMap> {
        let conn = self.connection()?;
        let mut stmt = conn
            .prepare("SELECT key, value FROM kv")
            .map_err(sqlite_error)?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(sqlite_error)?;

        let mut entries = EntryMap::new();
        for row in rows {
            let (key, value) = row.map_err(sqlite_error)?;
            let name = EntryName::new(key)
                .map_err(|_| Error::Format("Stored entry has an empty name".to_string()))?;
            let blob = STANDARD
                .decode(value.as_bytes())
                .map_err(|e| Error::Format(format!("Entry '{}' is not valid base64: {}", name, e)))?;
            entries.insert(name, EncryptedBlob::from_bytes(blob));
        }

        debug!(count = entries.len(), "Loaded vault entries");
        Ok(entries)
    }

    fn save(&self, entries: &EntryMap) -> Result<()> {
        let mut conn = self.connection()?;
        let tx = conn.transaction().map_err(sqlite_error)?;

        tx.execute("DELETE FROM kv", []).map_err(sqlite_error)?;
        {
            let mut stmt = tx
                .prepare("INSERT INTO kv (key, value) VALUES (?1, ?2)")
                .map_err(sqlite_error)?;
            for (name, blob) in entries {
                stmt.execute(params![name.as_str(), STANDARD.encode(blob.as_bytes())])
                    .map_err(sqlite_error)?;
            }
        }
        tx.commit().map_err(sqlite_error)?;

        debug!(count = entries.len(), "Saved vault entries");
        Ok(())
    }
}
