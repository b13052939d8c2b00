use anyhow::Result;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::rusqlite::{params, OpenFlags, OptionalExtension};
use r2d2_sqlite::SqliteConnectionManager;
use serde_json::Value;

use crate::storage::area::KeyValueStore;

/// SQLite-based key-value store. Blobs are saved as JSON text, one row per key.
pub struct SqliteKeyValueStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteKeyValueStore {
    /// Creates a new SQLite key-value store with the specified database file path.
    pub fn new(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path)
            .with_flags(
                OpenFlags::SQLITE_OPEN_READ_WRITE |
                    OpenFlags::SQLITE_OPEN_CREATE |
                    OpenFlags::SQLITE_OPEN_URI
            )
            .with_init(|c| {
                c.busy_timeout(std::time::Duration::from_millis(500))?;
                c.pragma_update(None, "journal_mode", "WAL")?;
                c.execute_batch(
                    "CREATE TABLE IF NOT EXISTS kv_storage (
                        key TEXT PRIMARY KEY NOT NULL,
                        value TEXT NOT NULL,
                        updated_at INTEGER NOT NULL DEFAULT (strftime('%s','now'))
                    );"
                )?;
                Ok(())
            });

        let pool = Pool::builder()
            .max_size(4)
            .connection_timeout(std::time::Duration::from_secs(5))
            .build(manager)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get_sync(&self, key: &str) -> Result<Option<Value>> {
        let conn = self.conn()?;
        let raw = conn
            .query_row(
                "SELECT value FROM kv_storage WHERE key=?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, blob: Value) -> Result<()> {
        let text = serde_json::to_string(&blob)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO kv_storage(key,value) VALUES (?1,?2)
             ON CONFLICT(key) DO UPDATE
             SET value=excluded.value, updated_at=strftime('%s','now')",
            params![key, text],
        )?;
        Ok(())
    }
}
