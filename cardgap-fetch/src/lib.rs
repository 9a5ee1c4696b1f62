// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # cardgap Fetch
//!
//! Resumable retrieval of the card collection from the API.
//!
//! ## Layers
//!
//! - [`retry::RetryPolicy`] - bounded retry with exponential backoff
//! - [`http::ApiTransport`] - the network seam, implemented by
//!   [`http::HttpClient`]
//! - [`response::PageResponse`] - bare or enveloped page bodies
//! - [`paginate::PaginatedFetcher`] - page-by-page fetch with checkpoints
//! - [`collection::CollectionService`] - cards and stats fetched together
//!   and merged, plus the one-shot endpoints
//!
//! ## Example
//!
//! ```ignore
//! use cardgap_fetch::{CollectionService, FetchContext, FetchSettings};
//! use cardgap_store::CheckpointStore;
//!
//! let ctx = FetchContext::new(FetchSettings::default(), CheckpointStore::in_memory())?;
//! let service = CollectionService::new(ctx);
//!
//! let cards = service.cards(None).await?;
//! ```

pub mod collection;
pub mod context;
pub mod error;
pub mod http;
pub mod paginate;
pub mod response;
pub mod retry;

// Errors
pub use error::FetchError;

// Transport
pub use http::{ApiTransport, HttpClient, ResponseExt};
pub use response::PageResponse;
pub use retry::{AttemptOutcome, DEFAULT_MAX_ATTEMPTS, RetryPolicy};

// Fetching
pub use collection::{
    CARDS_ENDPOINT, CollectionService, DEFAULT_RAW_PAGE_SIZE, FILTER_DATA_ENDPOINT, ME_ENDPOINT,
    STATS_ENDPOINT,
};
pub use context::{DEFAULT_BASE_URL, DEFAULT_LOCALE, FetchContext, FetchSettings};
pub use paginate::{PageQuery, PaginatedFetcher, page_count};
