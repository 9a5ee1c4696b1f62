//! SQLite checkpoint backend.
//!
//! Keeps every record in a single database file. Each write is one
//! upsert statement, so readers never see a half-written record.

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::backend::{CheckpointBackend, validate_name};
use crate::error::StoreError;
use crate::persistence::ensure_dir;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS checkpoint_records (
        name TEXT PRIMARY KEY,
        body BLOB NOT NULL,
        updated_at INTEGER NOT NULL
    );
";

/// Checkpoint backend on a SQLite database.
#[derive(Clone)]
pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend").finish_non_exhaustive()
    }
}

impl SqliteBackend {
    /// Opens (or creates) the database at `path`.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                ensure_dir(parent).await?;
            }
        }

        let path = path.to_path_buf();
        let conn = tokio::task::spawn_blocking(move || -> Result<Connection, StoreError> {
            let conn = Connection::open(&path)?;
            conn.execute_batch(SCHEMA)?;
            debug!(path = %path.display(), "Opened checkpoint database");
            Ok(conn)
        })
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs a closure against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| StoreError::Backend("database lock poisoned".to_string()))?;
            f(&guard)
        })
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?
    }
}

#[async_trait]
impl CheckpointBackend for SqliteBackend {
    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        validate_name(name)?;
        let name = name.to_string();
        self.with_conn(move |conn| {
            let body = conn
                .query_row(
                    "SELECT body FROM checkpoint_records WHERE name = ?1",
                    params![name],
                    |row| row.get::<_, Vec<u8>>(0),
                )
                .optional()?;
            Ok(body)
        })
        .await
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        validate_name(name)?;
        let name = name.to_string();
        let body = bytes.to_vec();
        let updated_at = chrono::Utc::now().timestamp_millis();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO checkpoint_records (name, body, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(name) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
                params![name, body, updated_at],
            )?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        validate_name(name)?;
        let name = name.to_string();
        self.with_conn(move |conn| {
            conn.execute(
                "DELETE FROM checkpoint_records WHERE name = ?1",
                params![name],
            )?;
            Ok(())
        })
        .await
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM checkpoint_records", [])?;
            debug!(removed, "Cleared checkpoint database");
            Ok(())
        })
        .await
    }
}
