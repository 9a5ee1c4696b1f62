//! Collection service.
//!
//! High-level operations over the card API: the enriched card list (cards
//! and stats fetched concurrently, then merged), account and filter
//! metadata, single raw pages, and checkpoint maintenance.

use serde_json::Value;
use tracing::{info, instrument, warn};

use cardgap_core::{decode_records, enrich_cards, Card, CardStat, FilterData, UserInfo};
use cardgap_store::ResourceKey;

use crate::context::FetchContext;
use crate::error::FetchError;
use crate::http::ApiTransport;
use crate::paginate::{PageQuery, PaginatedFetcher};
use crate::retry::RetryPolicy;

/// Card list endpoint.
pub const CARDS_ENDPOINT: &str = "/cards";
/// Per-card collection statistics endpoint.
pub const STATS_ENDPOINT: &str = "/cards/stats";
/// Current user endpoint.
pub const ME_ENDPOINT: &str = "/me";
/// Filter metadata endpoint.
pub const FILTER_DATA_ENDPOINT: &str = "/cards/filter-data";

/// Items per page for [`CollectionService::page`] unless overridden.
pub const DEFAULT_RAW_PAGE_SIZE: u32 = 5;

/// Entry point for everything the CLI asks of the API.
#[derive(Debug, Clone)]
pub struct CollectionService {
    ctx: FetchContext,
    fetcher: PaginatedFetcher,
    retry: RetryPolicy,
}

impl CollectionService {
    /// Creates a service from a context.
    pub fn new(ctx: FetchContext) -> Self {
        let fetcher = PaginatedFetcher::new(&ctx);
        let retry = ctx.settings.retry_policy();
        Self { ctx, fetcher, retry }
    }

    fn locale_or_default<'a>(&'a self, locale: Option<&'a str>) -> &'a str {
        locale.unwrap_or(self.ctx.settings.locale.as_str())
    }

    /// Fetches every card and every stat record, then merges them.
    ///
    /// The two resources are fetched concurrently; each keeps its own
    /// checkpoint.
    #[instrument(skip(self))]
    pub async fn cards(&self, locale: Option<&str>) -> Result<Vec<Card>, FetchError> {
        let query = PageQuery::new(self.locale_or_default(locale));

        let (raw_cards, raw_stats) = tokio::try_join!(
            self.fetcher.fetch_all(CARDS_ENDPOINT, &query),
            self.fetcher.fetch_all(STATS_ENDPOINT, &query),
        )?;

        info!(cards = raw_cards.len(), stats = raw_stats.len(), "Fetched collection");
        Ok(merge(raw_cards, raw_stats))
    }

    /// Builds the enriched card list from stored checkpoints only.
    ///
    /// The cards checkpoint is required. Without stats every card counts
    /// as unowned and unpriced.
    pub async fn cards_offline(&self, locale: Option<&str>) -> Result<Vec<Card>, FetchError> {
        let locale = self.locale_or_default(locale);
        let cards_key = ResourceKey::new(CARDS_ENDPOINT, locale);
        let stats_key = ResourceKey::new(STATS_ENDPOINT, locale);

        let cards = self
            .ctx
            .store
            .load(&cards_key)
            .await
            .ok_or_else(|| FetchError::NotCached(cards_key.to_string()))?;
        if !cards.is_complete() {
            warn!(
                key = %cards_key,
                completed = cards.metadata.completed_pages,
                total = cards.metadata.total_pages,
                "Card checkpoint is partial"
            );
        }

        let stats = match self.ctx.store.load(&stats_key).await {
            Some(stats) => stats.items,
            None => {
                warn!(key = %stats_key, "No stats checkpoint, ownership and prices unknown");
                Vec::new()
            }
        };

        info!(cards = cards.items.len(), stats = stats.len(), "Loaded collection from cache");
        Ok(merge(cards.items, stats))
    }

    /// Fetches the current user.
    pub async fn user_info(&self) -> Result<UserInfo, FetchError> {
        let body = self.get(ME_ENDPOINT, &[]).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Fetches filter metadata.
    pub async fn filter_data(&self, locale: Option<&str>) -> Result<FilterData, FetchError> {
        let params = [("locale", self.locale_or_default(locale).to_string())];
        let body = self.get(FILTER_DATA_ENDPOINT, &params).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Fetches one page of cards exactly as the API returns it.
    pub async fn page(
        &self,
        page: u32,
        items_per_page: Option<u32>,
        locale: Option<&str>,
    ) -> Result<Value, FetchError> {
        let query = PageQuery::new(self.locale_or_default(locale)).with_collection(true);
        let params = query.params(page.max(1), items_per_page.unwrap_or(DEFAULT_RAW_PAGE_SIZE));
        self.get(CARDS_ENDPOINT, &params).await
    }

    /// Deletes checkpoints.
    ///
    /// With both `endpoint` and `locale` only that resource is cleared;
    /// otherwise every checkpoint is.
    pub async fn clear_cache(
        &self,
        endpoint: Option<&str>,
        locale: Option<&str>,
    ) -> Result<(), FetchError> {
        match (endpoint, locale) {
            (Some(endpoint), Some(locale)) => {
                self.ctx.store.clear(&ResourceKey::new(endpoint, locale)).await?;
            }
            _ => self.ctx.store.clear_all().await?,
        }
        Ok(())
    }

    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Value, FetchError> {
        let transport: &dyn ApiTransport = self.ctx.transport.as_ref();
        self.retry.execute(|| transport.get_json(path, params)).await
    }
}

fn merge(raw_cards: Vec<Value>, raw_stats: Vec<Value>) -> Vec<Card> {
    let cards: Vec<Card> = decode_records(raw_cards, "card");
    let stats: Vec<CardStat> = decode_records(raw_stats, "card stat");
    enrich_cards(cards, &stats)
}
