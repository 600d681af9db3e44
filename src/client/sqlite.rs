use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::StoreClient;
use crate::errors::StoreError;
use crate::record::{SESSIONS_TABLE, SessionRecord};

/// SQLite-backed store client.
///
/// Timestamps are stored as unix microseconds so `expires_on` compares
/// numerically in the sweep query. Queries run on the blocking pool.
pub struct SqliteStoreClient {
    conn: Arc<Mutex<Connection>>,
    db_path: String,
}

impl SqliteStoreClient {
    pub fn open(db_path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!(
                    "Failed to create database parent directory: {}",
                    parent.display()
                )
            })?;
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database at: {}", db_path.display()))?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA busy_timeout=3000;",
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: db_path.to_string_lossy().to_string(),
        })
    }

    /// Private in-memory database, mostly for tests.
    pub fn in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: ":memory:".to_string(),
        })
    }

    pub fn path(&self) -> &str {
        &self.db_path
    }

    async fn run<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|e| StoreError::Lock(format!("DB lock poisoned: {}", e)))?;
            f(&guard)
        })
        .await
        .map_err(|e| StoreError::Backend(format!("store task failed: {}", e)))?
    }
}

impl std::fmt::Debug for SqliteStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStoreClient")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

fn from_micros(micros: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| StoreError::Serialization(format!("timestamp out of range: {}", micros)))
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<(String, String, i64, i64, i64)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn into_record(raw: (String, String, i64, i64, i64)) -> Result<SessionRecord, StoreError> {
    let (id, data, created_on, modified_on, expires_on) = raw;
    Ok(SessionRecord {
        id,
        data,
        created_on: from_micros(created_on)?,
        modified_on: from_micros(modified_on)?,
        expires_on: from_micros(expires_on)?,
    })
}

#[async_trait]
impl StoreClient for SqliteStoreClient {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        self.run(|conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    id TEXT PRIMARY KEY,
                    data TEXT NOT NULL,
                    created_on INTEGER NOT NULL,
                    modified_on INTEGER NOT NULL,
                    expires_on INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_{table}_expires_on ON {table}(expires_on);",
                table = SESSIONS_TABLE
            ))?;
            Ok(())
        })
        .await
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Option<SessionRecord>, StoreError> {
        let id = id.to_string();
        self.run(move |conn| {
            let raw = conn
                .query_row(
                    &format!(
                        "SELECT id, data, created_on, modified_on, expires_on
                         FROM {} WHERE id = ?1",
                        SESSIONS_TABLE
                    ),
                    params![id],
                    read_row,
                )
                .optional()?;
            raw.map(into_record).transpose()
        })
        .await
    }

    async fn upsert(&self, id: &str, record: SessionRecord) -> Result<SessionRecord, StoreError> {
        let id = id.to_string();
        self.run(move |conn| {
            let raw = conn.query_row(
                &format!(
                    "INSERT INTO {} (id, data, created_on, modified_on, expires_on)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT(id) DO UPDATE SET
                        data = excluded.data,
                        modified_on = excluded.modified_on,
                        expires_on = MAX(expires_on, excluded.expires_on)
                     RETURNING id, data, created_on, modified_on, expires_on",
                    SESSIONS_TABLE
                ),
                params![
                    id,
                    record.data,
                    record.created_on.timestamp_micros(),
                    record.modified_on.timestamp_micros(),
                    record.expires_on.timestamp_micros(),
                ],
                read_row,
            )?;
            into_record(raw)
        })
        .await
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), StoreError> {
        let id = id.to_string();
        self.run(move |conn| {
            conn.execute(
                &format!("DELETE FROM {} WHERE id = ?1", SESSIONS_TABLE),
                params![id],
            )?;
            Ok(())
        })
        .await
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let deleted = self
            .run(move |conn| {
                Ok(conn.execute(
                    &format!("DELETE FROM {} WHERE expires_on < ?1", SESSIONS_TABLE),
                    params![now.timestamp_micros()],
                )?)
            })
            .await?;
        debug!(deleted, db = %self.db_path, "deleted expired session records");
        Ok(deleted)
    }
}
