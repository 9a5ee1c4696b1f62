// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `cardgap` Core
//!
//! Card models and the derived-data pipeline for the `cardgap` workspace.
//!
//! This crate has no I/O. It turns the raw records produced by the fetch
//! crate into enriched cards, and enriched cards into a missing-card
//! analysis:
//!
//! - [`enrich`] - merges card details with per-card collection stats
//! - [`analysis`] - deficit against a target count, cost, aggregates
//!
//! ## Key Types
//!
//! ### Remote Records
//! - [`Card`] - A card as returned by the API, plus enrichment fields
//! - [`CardTag`] - Rarity / type / faction reference
//! - [`CardStat`] - Per-card collection count and lowest price
//! - [`Ownership`] - Finite owned count or the unbounded sentinel
//!
//! ### Derived Views
//! - [`MissingCard`] - One card the collection is short of
//! - [`AggregateStatistics`] - Totals and per-category breakdowns
//! - [`CategoryBreakdown`] - One rarity or faction bucket

pub mod analysis;
pub mod enrich;
pub mod error;
pub mod models;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{
    // Remote records
    Card,
    CardStat,
    CardTag,
    FilterData,
    Ownership,
    UserInfo,
    UNBOUNDED_MARKER,
    // Derived views
    AggregateStatistics,
    CategoryBreakdown,
    MissingCard,
};

pub use analysis::{DEFAULT_TARGET_COUNT, MissingAnalyzer};
pub use enrich::{decode_records, enrich_cards};
