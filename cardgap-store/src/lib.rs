// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # cardgap Store
//!
//! Durable state for the cardgap workspace.
//!
//! This crate provides:
//!
//! - **CheckpointStore**: per-resource fetch progress with TTL expiry
//! - **CheckpointBackend**: the byte-level key-value seam, with file,
//!   SQLite, and in-memory implementations
//! - **AppConfig**: user configuration with persistence
//! - **Persistence**: file I/O helpers for JSON data
//!
//! ## Usage
//!
//! ```ignore
//! use cardgap_store::{CheckpointStore, FileBackend, ResourceKey};
//! use std::sync::Arc;
//!
//! let store = CheckpointStore::new(Arc::new(FileBackend::new("./cache")));
//! let key = ResourceKey::new("/cards", "fr-fr");
//!
//! if let Some(checkpoint) = store.load(&key).await {
//!     println!("{} of {} pages done", checkpoint.metadata.completed_pages,
//!         checkpoint.metadata.total_pages);
//! }
//! ```

pub mod backend;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod persistence;
pub mod sqlite;

pub use backend::{CheckpointBackend, FileBackend, MemoryBackend};
pub use checkpoint::{
    Checkpoint, CheckpointMetadata, CheckpointStore, DEFAULT_CHECKPOINT_TTL_HOURS, ResourceKey,
};
pub use config::{AppConfig, BackendKind};
pub use error::StoreError;
pub use persistence::{
    default_cache_dir, default_config_dir, default_config_path, ensure_dir, load_json,
    save_json, write_atomic,
};
pub use sqlite::SqliteBackend;
