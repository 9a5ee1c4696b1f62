//! Resumable paginated fetching.
//!
//! [`PaginatedFetcher::fetch_all`] walks the pages of one resource in
//! order, saving a checkpoint after each page. A later call for the same
//! resource resumes after the last saved page, or returns the stored items
//! directly once every page is in.

use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use cardgap_store::{CheckpointMetadata, CheckpointStore, ResourceKey};

use crate::context::FetchContext;
use crate::error::FetchError;
use crate::http::ApiTransport;
use crate::response::PageResponse;
use crate::retry::RetryPolicy;

// ============================================================================
// Query
// ============================================================================

/// Per-resource query options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    /// Locale sent with every page; also part of the checkpoint key.
    pub locale: String,
    /// Optional `collection` flag.
    pub collection: Option<bool>,
}

impl PageQuery {
    /// Creates a query for `locale` without the collection flag.
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            collection: None,
        }
    }

    /// Sets the collection flag.
    #[must_use]
    pub fn with_collection(mut self, collection: bool) -> Self {
        self.collection = Some(collection);
        self
    }

    /// Builds the query parameters for one page.
    pub fn params(&self, page: u32, items_per_page: u32) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", page.to_string()),
            ("itemsPerPage", items_per_page.to_string()),
            ("locale", self.locale.clone()),
        ];
        if let Some(collection) = self.collection {
            params.push(("collection", collection.to_string()));
        }
        params
    }
}

/// Pages needed for `total` items at `page_size` per page.
pub fn page_count(total: u64, page_size: u32) -> u32 {
    let pages = total.div_ceil(u64::from(page_size.max(1)));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Page to continue from for an incomplete checkpoint.
///
/// A checkpoint written with another page size can only continue when its
/// items fill a whole number of pages at the current size.
fn resume_page(metadata: &CheckpointMetadata, items: usize, page_size: u32) -> Option<u32> {
    if metadata.page_size.is_none_or(|stored| stored == page_size) {
        return Some(metadata.completed_pages + 1);
    }
    let items = u64::try_from(items).ok()?;
    let size = u64::from(page_size.max(1));
    if items % size != 0 {
        return None;
    }
    u32::try_from(items / size).ok().map(|pages| pages + 1)
}

// ============================================================================
// In-flight Guard
// ============================================================================

type InFlight = Arc<Mutex<HashSet<String>>>;

/// Marks a resource key busy until dropped.
struct InFlightGuard {
    in_flight: InFlight,
    key: String,
}

impl InFlightGuard {
    fn acquire(in_flight: &InFlight, key: &ResourceKey) -> Result<Self, FetchError> {
        let mut set = in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !set.insert(key.as_str().to_string()) {
            return Err(FetchError::AlreadyInFlight(key.to_string()));
        }
        Ok(Self {
            in_flight: Arc::clone(in_flight),
            key: key.as_str().to_string(),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

// ============================================================================
// Paginated Fetcher
// ============================================================================

/// Fetches every page of a resource with checkpointing and retry.
#[derive(Clone)]
pub struct PaginatedFetcher {
    transport: Arc<dyn ApiTransport>,
    store: CheckpointStore,
    retry: RetryPolicy,
    page_size: u32,
    page_delay: Duration,
    in_flight: InFlight,
}

impl std::fmt::Debug for PaginatedFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginatedFetcher")
            .field("retry", &self.retry)
            .field("page_size", &self.page_size)
            .field("page_delay", &self.page_delay)
            .finish_non_exhaustive()
    }
}

impl PaginatedFetcher {
    /// Creates a fetcher from a context.
    pub fn new(ctx: &FetchContext) -> Self {
        Self {
            transport: Arc::clone(&ctx.transport),
            store: ctx.store.clone(),
            retry: ctx.settings.retry_policy(),
            page_size: ctx.settings.page_size.max(1),
            page_delay: ctx.settings.page_delay,
            in_flight: Arc::default(),
        }
    }

    /// Fetches a single page through the retry policy.
    pub async fn fetch_page(
        &self,
        endpoint: &str,
        query: &PageQuery,
        page: u32,
        items_per_page: u32,
    ) -> Result<PageResponse, FetchError> {
        let params = query.params(page, items_per_page);
        let body = self
            .retry
            .execute(|| self.transport.get_json(endpoint, &params))
            .await?;
        PageResponse::from_value(body)
    }

    /// Fetches every item of `endpoint`.
    ///
    /// Resumes from a stored checkpoint when there is one. On error the
    /// checkpoint of the last completed page stays in the store.
    #[instrument(skip(self, query), fields(endpoint = %endpoint, locale = %query.locale))]
    pub async fn fetch_all(
        &self,
        endpoint: &str,
        query: &PageQuery,
    ) -> Result<Vec<Value>, FetchError> {
        let key = ResourceKey::new(endpoint, &query.locale);
        let _guard = InFlightGuard::acquire(&self.in_flight, &key)?;

        let (mut items, mut page, mut total_pages) = match self.store.load(&key).await {
            Some(checkpoint) if checkpoint.is_complete() => {
                info!(key = %key, items = checkpoint.items.len(), "Using complete checkpoint");
                return Ok(checkpoint.items);
            }
            Some(checkpoint) => {
                match resume_page(&checkpoint.metadata, checkpoint.items.len(), self.page_size) {
                    Some(next) => {
                        info!(
                            key = %key,
                            page = next,
                            total_pages = checkpoint.metadata.total_pages,
                            "Resuming from checkpoint"
                        );
                        (checkpoint.items, next, checkpoint.metadata.total_pages)
                    }
                    None => {
                        warn!(
                            key = %key,
                            stored = ?checkpoint.metadata.page_size,
                            current = self.page_size,
                            "Checkpoint page size does not line up, starting over"
                        );
                        (Vec::new(), 1, 0)
                    }
                }
            }
            None => {
                info!(key = %key, "Starting fresh fetch");
                (Vec::new(), 1, 0)
            }
        };

        loop {
            debug!(page, "Fetching page");
            let response = self.fetch_page(endpoint, query, page, self.page_size).await?;
            let (page_items, total) = response.into_parts();
            let page_len = page_items.len();
            items.extend(page_items);

            let mut done = page_len == 0;
            match total {
                Some(total) => {
                    total_pages = page_count(total, self.page_size);
                    done |= items.len() as u64 >= total;
                }
                // Unknown total: assume one more page until an empty one.
                None => total_pages = page + 1,
            }
            if done {
                total_pages = total_pages.min(page);
            }

            debug!(page, items = page_len, accumulated = items.len(), total_pages, "Page fetched");

            let metadata =
                CheckpointMetadata::new(endpoint, query.locale.as_str(), page, total_pages)
                    .with_page_size(self.page_size);
            if let Err(e) = self.store.save(&key, &items, metadata).await {
                warn!(key = %key, error = %e, "Failed to save checkpoint, continuing");
            }

            if done {
                break;
            }

            page += 1;
            if !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }
        }

        info!(key = %key, items = items.len(), pages = page, "Fetch finished");
        Ok(items)
    }
}
