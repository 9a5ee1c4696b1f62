//! Fetch checkpoints.
//!
//! A checkpoint records how far a paginated fetch of one resource got:
//! the items accumulated so far plus page counters. Two records are kept
//! per resource, `<key>_data.json` and `<key>_metadata.json`.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::backend::{CheckpointBackend, MemoryBackend};
use crate::error::StoreError;

/// Hours before a checkpoint is considered stale.
pub const DEFAULT_CHECKPOINT_TTL_HOURS: i64 = 24;

// ============================================================================
// Resource Key
// ============================================================================

/// Identifies one fetchable resource in one locale.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey(String);

impl ResourceKey {
    /// Derives the key for `endpoint` in `locale`.
    ///
    /// `("/cards", "fr-fr")` becomes `_cards_fr-fr`.
    pub fn new(endpoint: &str, locale: &str) -> Self {
        Self(format!("{}_{locale}", endpoint.replace('/', "_")))
    }

    /// Returns the key as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn data_record(&self) -> String {
        format!("{}_data.json", self.0)
    }

    fn metadata_record(&self) -> String {
        format!("{}_metadata.json", self.0)
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Checkpoint Types
// ============================================================================

/// Progress counters stored next to the items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointMetadata {
    /// Milliseconds since the Unix epoch when the checkpoint was written.
    pub timestamp: i64,
    /// Total pages, as far as currently known.
    pub total_pages: u32,
    /// Pages already fetched and appended.
    pub completed_pages: u32,
    /// Endpoint the items came from.
    pub endpoint: String,
    /// Locale the items were fetched in.
    pub locale: String,
    /// Number of items the data record should hold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_count: Option<usize>,
    /// Items per page the pages were requested with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl CheckpointMetadata {
    /// Creates metadata stamped with the current time.
    pub fn new(
        endpoint: impl Into<String>,
        locale: impl Into<String>,
        completed_pages: u32,
        total_pages: u32,
    ) -> Self {
        Self {
            timestamp: Utc::now().timestamp_millis(),
            total_pages,
            completed_pages,
            endpoint: endpoint.into(),
            locale: locale.into(),
            item_count: None,
            page_size: None,
        }
    }

    /// Records the page size the pages were requested with.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Returns true once every known page has been fetched.
    pub fn is_complete(&self) -> bool {
        self.completed_pages >= self.total_pages
    }

    /// Returns the age of the checkpoint relative to now.
    pub fn age(&self) -> Duration {
        Duration::milliseconds(Utc::now().timestamp_millis().saturating_sub(self.timestamp))
    }
}

/// A loaded checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    /// Items accumulated so far, in page order.
    pub items: Vec<Value>,
    /// Progress counters.
    pub metadata: CheckpointMetadata,
}

impl Checkpoint {
    /// Returns true once every known page has been fetched.
    pub fn is_complete(&self) -> bool {
        self.metadata.is_complete()
    }
}

// ============================================================================
// Checkpoint Store
// ============================================================================

/// Reads and writes checkpoints through a [`CheckpointBackend`].
#[derive(Clone)]
pub struct CheckpointStore {
    backend: Arc<dyn CheckpointBackend>,
    ttl: Duration,
}

impl fmt::Debug for CheckpointStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckpointStore")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl CheckpointStore {
    /// Creates a store with the default TTL.
    pub fn new(backend: Arc<dyn CheckpointBackend>) -> Self {
        Self {
            backend,
            ttl: Duration::hours(DEFAULT_CHECKPOINT_TTL_HOURS),
        }
    }

    /// Creates a store backed by memory only.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Sets how long a checkpoint stays valid.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Returns the TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Overwrites the checkpoint for `key`.
    ///
    /// Items are written before metadata. The metadata's `item_count` is
    /// set from `items`, so a crash between the two writes leaves a data
    /// record that [`load`](Self::load) can truncate back.
    pub async fn save(
        &self,
        key: &ResourceKey,
        items: &[Value],
        mut metadata: CheckpointMetadata,
    ) -> Result<(), StoreError> {
        metadata.item_count = Some(items.len());

        let data = serde_json::to_vec(items)?;
        let meta = serde_json::to_vec_pretty(&metadata)?;

        self.backend.write(&key.data_record(), &data).await?;
        self.backend.write(&key.metadata_record(), &meta).await?;

        info!(
            key = %key,
            completed = metadata.completed_pages,
            total = metadata.total_pages,
            items = items.len(),
            "Checkpoint saved"
        );
        Ok(())
    }

    /// Loads the checkpoint for `key`.
    ///
    /// Returns `None` when nothing usable is stored. Expired checkpoints
    /// are deleted. Read and decode failures are logged and count as a
    /// miss.
    pub async fn load(&self, key: &ResourceKey) -> Option<Checkpoint> {
        let metadata = match self.read_metadata(key).await {
            Ok(Some(metadata)) => metadata,
            Ok(None) => {
                debug!(key = %key, "No checkpoint");
                return None;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Unreadable checkpoint metadata");
                return None;
            }
        };

        if metadata.age() > self.ttl {
            info!(key = %key, "Checkpoint expired, clearing");
            if let Err(e) = self.clear(key).await {
                warn!(key = %key, error = %e, "Failed to clear expired checkpoint");
            }
            return None;
        }

        let mut items = match self.read_items(key).await {
            Ok(Some(items)) => items,
            Ok(None) => {
                warn!(key = %key, "Checkpoint metadata without data");
                return None;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Unreadable checkpoint data");
                return None;
            }
        };

        if let Some(expected) = metadata.item_count {
            if items.len() > expected {
                warn!(
                    key = %key,
                    stored = items.len(),
                    expected,
                    "Checkpoint data ahead of metadata, truncating"
                );
                items.truncate(expected);
            } else if items.len() < expected {
                warn!(
                    key = %key,
                    stored = items.len(),
                    expected,
                    "Checkpoint data shorter than metadata, ignoring"
                );
                return None;
            }
        }

        debug!(
            key = %key,
            completed = metadata.completed_pages,
            total = metadata.total_pages,
            items = items.len(),
            "Checkpoint loaded"
        );
        Some(Checkpoint { items, metadata })
    }

    /// Returns true if a valid checkpoint exists and every page is fetched.
    pub async fn is_complete(&self, key: &ResourceKey) -> bool {
        self.load(key).await.is_some_and(|c| c.is_complete())
    }

    /// Deletes the checkpoint for `key`.
    pub async fn clear(&self, key: &ResourceKey) -> Result<(), StoreError> {
        self.backend.delete(&key.metadata_record()).await?;
        self.backend.delete(&key.data_record()).await?;
        info!(key = %key, "Checkpoint cleared");
        Ok(())
    }

    /// Deletes every checkpoint.
    pub async fn clear_all(&self) -> Result<(), StoreError> {
        self.backend.delete_all().await?;
        info!("All checkpoints cleared");
        Ok(())
    }

    async fn read_metadata(
        &self,
        key: &ResourceKey,
    ) -> Result<Option<CheckpointMetadata>, StoreError> {
        match self.backend.read(&key.metadata_record()).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn read_items(&self, key: &ResourceKey) -> Result<Option<Vec<Value>>, StoreError> {
        match self.backend.read(&key.data_record()).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
