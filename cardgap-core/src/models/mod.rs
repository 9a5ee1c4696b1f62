//! Domain models for cardgap.
//!
//! ## Submodules
//!
//! - [`card`] - Remote card records (Card, CardTag, CardStat, Ownership)
//! - [`missing`] - Derived analysis views (MissingCard, AggregateStatistics)
//! - [`account`] - One-shot API payloads (UserInfo, FilterData)

mod account;
mod card;
mod missing;

// Re-export everything at the models level
pub use account::{FilterData, UserInfo};
pub use card::{Card, CardStat, CardTag, Ownership, UNBOUNDED_MARKER};
pub use missing::{AggregateStatistics, CategoryBreakdown, MissingCard};
#[cfg(test)]
mod serde_tests;
