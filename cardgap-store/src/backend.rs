//! Checkpoint storage backends.
//!
//! A backend is a flat namespace of named byte records. The checkpoint
//! layer decides what goes into each record; backends only move bytes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::persistence::{ensure_dir, write_atomic};

// ============================================================================
// Backend Trait
// ============================================================================

/// Key-value storage for checkpoint records.
#[async_trait]
pub trait CheckpointBackend: Send + Sync {
    /// Read a record.
    ///
    /// # Returns
    /// * `Ok(Some(bytes))` - Record found
    /// * `Ok(None)` - Record not found
    /// * `Err(e)` - Error accessing storage
    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Write a record, replacing any previous content.
    ///
    /// Readers never observe a partially written record.
    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError>;

    /// Delete a record. Deleting a missing record succeeds.
    async fn delete(&self, name: &str) -> Result<(), StoreError>;

    /// Delete every record this backend owns.
    async fn delete_all(&self) -> Result<(), StoreError>;

    /// Check if a record exists.
    async fn exists(&self, name: &str) -> bool {
        matches!(self.read(name).await, Ok(Some(_)))
    }
}

/// Rejects names that could escape a backend's namespace.
pub(crate) fn validate_name(name: &str) -> Result<(), StoreError> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(StoreError::InvalidRecordName(name.to_string()));
    }
    Ok(())
}

// ============================================================================
// File Backend
// ============================================================================

/// Stores each record as a file in one directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Creates a backend rooted at `dir`. The directory is created lazily.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the backing directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, StoreError> {
        validate_name(name)?;
        Ok(self.dir.join(name))
    }
}

#[async_trait]
impl CheckpointBackend for FileBackend {
    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(name)?;
        ensure_dir(&self.dir).await?;
        write_atomic(&path, bytes).await?;
        debug!(path = %path.display(), bytes = bytes.len(), "Record written");
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        let path = self.path_for(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Record deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0usize;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_record = path
                .extension()
                .is_some_and(|ext| ext == "json" || ext == "tmp");
            if !is_record || !entry.file_type().await?.is_file() {
                continue;
            }
            if let Err(e) = tokio::fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %e, "Failed to remove record");
            } else {
                removed += 1;
            }
        }

        debug!(dir = %self.dir.display(), removed, "Cleared records");
        Ok(())
    }
}

// ============================================================================
// Memory Backend
// ============================================================================

/// Volatile backend for tests and `--no-cache` style runs.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl CheckpointBackend for MemoryBackend {
    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        validate_name(name)?;
        Ok(self.records.read().await.get(name).cloned())
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        validate_name(name)?;
        self.records
            .write()
            .await
            .insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        validate_name(name)?;
        self.records.write().await.remove(name);
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        self.records.write().await.clear();
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
