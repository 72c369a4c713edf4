//! SQLite-backed key-value store.
//!
//! # Invariants
//! - One row per key in `kv_entries`; `set` is an upsert.
//! - Reads never mask corrupt rows; invalid JSON surfaces as `InvalidData`.

use super::{KvStore, StoreError, StoreResult};
use crate::model::RecordId;
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

/// Key-value store over the `kv_entries` table.
///
/// Owns its connection so a controller can hold it for the whole process.
pub struct SqliteKvStore {
    conn: Connection,
}

impl SqliteKvStore {
    /// Wraps a connection returned by `db::open_db`/`db::open_db_in_memory`.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Returns every key currently present, sorted.
    pub fn keys(&self) -> StoreResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv_entries ORDER BY key ASC;")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut keys = Vec::new();
        for key in rows {
            keys.push(key?);
        }
        Ok(keys)
    }
}

impl KvStore for SqliteKvStore {
    fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            None => Ok(None),
            Some(text) => serde_json::from_str(&text)
                .map(Some)
                .map_err(|source| StoreError::InvalidData {
                    key: key.to_string(),
                    source,
                }),
        }
    }

    fn set(&self, key: &str, value: &Value) -> StoreResult<()> {
        let text = serde_json::to_string(value).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, text],
        )?;
        debug!(
            "event=kv_set module=store status=ok key={} bytes={}",
            key,
            text.len()
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        let removed = self
            .conn
            .execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
        debug!(
            "event=kv_delete module=store status=ok key={} removed={}",
            key, removed
        );
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        let removed = self.conn.execute("DELETE FROM kv_entries;", [])?;
        info!("event=kv_clear module=store status=ok removed={}", removed);
        Ok(())
    }

    fn next_id(&self) -> StoreResult<RecordId> {
        let next: Option<i64> = self
            .conn
            .query_row(
                "UPDATE record_ids SET last_id = last_id + 1 WHERE slot = 1 RETURNING last_id;",
                [],
                |row| row.get(0),
            )
            .optional()?;
        let next = next.ok_or_else(|| StoreError::IdSequence("allocator row missing".to_string()))?;
        RecordId::try_from(next)
            .map_err(|_| StoreError::IdSequence(format!("allocated id `{next}` is negative")))
    }
}
