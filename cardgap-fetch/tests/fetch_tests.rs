//! End-to-end fetch tests against a scripted transport.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cardgap_core::{MissingAnalyzer, Ownership};
use cardgap_fetch::{
    ApiTransport, CollectionService, FetchContext, FetchError, FetchSettings, PageQuery,
    PaginatedFetcher, CARDS_ENDPOINT, STATS_ENDPOINT,
};
use cardgap_store::{
    CheckpointBackend, CheckpointMetadata, CheckpointStore, FileBackend, ResourceKey, StoreError,
};

// ============================================================================
// Scripted Transport
// ============================================================================

type Responder = dyn Fn(&str, &HashMap<String, String>) -> Result<Value, FetchError> + Send + Sync;

/// Answers requests with a closure and records every call.
struct ScriptedTransport {
    responder: Box<Responder>,
    calls: Mutex<Vec<(String, HashMap<String, String>)>>,
}

impl ScriptedTransport {
    fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&str, &HashMap<String, String>) -> Result<Value, FetchError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(String, HashMap<String, String>)> {
        self.calls.lock().unwrap().clone()
    }

    fn pages_requested(&self, path: &str) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter(|(p, _)| p == path)
            .map(|(_, q)| q["page"].parse().unwrap())
            .collect()
    }
}

#[async_trait]
impl ApiTransport for ScriptedTransport {
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, FetchError> {
        let query: HashMap<String, String> = query
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect();
        self.calls.lock().unwrap().push((path.to_string(), query.clone()));
        (self.responder)(path, &query)
    }
}

/// Serves `total` synthetic records as Hydra pages.
fn hydra_pages(prefix: &'static str, total: usize) -> impl Fn(&HashMap<String, String>) -> Value {
    move |query| {
        let page: usize = query["page"].parse().unwrap();
        let per_page: usize = query["itemsPerPage"].parse().unwrap();
        let start = ((page - 1) * per_page).min(total);
        let end = (start + per_page).min(total);
        let members: Vec<Value> = (start..end)
            .map(|i| json!({"@id": format!("/cards/{prefix}{i}"), "reference": format!("{prefix}{i}"), "name": format!("Card {i}")}))
            .collect();
        json!({"hydra:member": members, "hydra:totalItems": total})
    }
}

fn context(transport: Arc<ScriptedTransport>, store: CheckpointStore) -> FetchContext {
    FetchContext::with_transport(FetchSettings::default(), transport, store)
}

fn ids(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .map(|v| v["@id"].as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// Paginated Fetcher
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_fetches_all_pages_and_checkpoints() {
    let pages = hydra_pages("C", 250);
    let transport = ScriptedTransport::new(move |_, q| Ok(pages(q)));
    let store = CheckpointStore::in_memory();
    let fetcher = PaginatedFetcher::new(&context(transport.clone(), store.clone()));

    let items = fetcher
        .fetch_all(CARDS_ENDPOINT, &PageQuery::new("fr-fr"))
        .await
        .unwrap();

    assert_eq!(items.len(), 250);
    assert_eq!(transport.pages_requested(CARDS_ENDPOINT), vec![1, 2, 3]);

    let checkpoint = store.load(&ResourceKey::new("/cards", "fr-fr")).await.unwrap();
    assert_eq!(checkpoint.metadata.total_pages, 3);
    assert_eq!(checkpoint.metadata.completed_pages, 3);
    assert!(checkpoint.is_complete());

    let (_, first) = &transport.calls()[0];
    assert_eq!(first["itemsPerPage"], "100");
    assert_eq!(first["locale"], "fr-fr");
    assert!(!first.contains_key("collection"));
}

#[tokio::test(start_paused = true)]
async fn test_pages_are_spaced_by_delay() {
    let pages = hydra_pages("C", 250);
    let transport = ScriptedTransport::new(move |_, q| Ok(pages(q)));
    let fetcher = PaginatedFetcher::new(&context(transport, CheckpointStore::in_memory()));

    let start = tokio::time::Instant::now();
    fetcher
        .fetch_all(CARDS_ENDPOINT, &PageQuery::new("fr-fr"))
        .await
        .unwrap();

    // Two gaps between three pages.
    assert_eq!(start.elapsed(), Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn test_complete_checkpoint_makes_no_requests() {
    let transport = ScriptedTransport::new(|_, _| panic!("no request expected"));
    let store = CheckpointStore::in_memory();
    let key = ResourceKey::new("/cards", "fr-fr");
    let cached = vec![json!({"@id": "/cards/1"}), json!({"@id": "/cards/2"})];
    store
        .save(&key, &cached, CheckpointMetadata::new("/cards", "fr-fr", 1, 1))
        .await
        .unwrap();

    let fetcher = PaginatedFetcher::new(&context(transport.clone(), store));
    let items = fetcher
        .fetch_all(CARDS_ENDPOINT, &PageQuery::new("fr-fr"))
        .await
        .unwrap();

    assert_eq!(items, cached);
    assert!(transport.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_resume_fetches_only_remaining_pages() {
    let pages = hydra_pages("C", 250);

    // Fresh fetch for reference.
    let reference = {
        let pages = hydra_pages("C", 250);
        let transport = ScriptedTransport::new(move |_, q| Ok(pages(q)));
        PaginatedFetcher::new(&context(transport, CheckpointStore::in_memory()))
            .fetch_all(CARDS_ENDPOINT, &PageQuery::new("fr-fr"))
            .await
            .unwrap()
    };

    let store = CheckpointStore::in_memory();
    let key = ResourceKey::new("/cards", "fr-fr");
    store
        .save(
            &key,
            &reference[..200],
            CheckpointMetadata::new("/cards", "fr-fr", 2, 3),
        )
        .await
        .unwrap();

    let transport = ScriptedTransport::new(move |_, q| Ok(pages(q)));
    let fetcher = PaginatedFetcher::new(&context(transport.clone(), store.clone()));
    let items = fetcher
        .fetch_all(CARDS_ENDPOINT, &PageQuery::new("fr-fr"))
        .await
        .unwrap();

    assert_eq!(transport.pages_requested(CARDS_ENDPOINT), vec![3]);
    assert_eq!(ids(&items), ids(&reference));
    assert!(store.is_complete(&key).await);
}

#[tokio::test(start_paused = true)]
async fn test_resume_after_page_size_change_on_whole_pages() {
    let pages = hydra_pages("C", 250);
    let reference = {
        let pages = hydra_pages("C", 250);
        let transport = ScriptedTransport::new(move |_, q| Ok(pages(q)));
        PaginatedFetcher::new(&context(transport, CheckpointStore::in_memory()))
            .fetch_all(CARDS_ENDPOINT, &PageQuery::new("fr-fr"))
            .await
            .unwrap()
    };

    // Two pages of 50 stored; the fetcher now asks for 100 per page.
    let store = CheckpointStore::in_memory();
    let key = ResourceKey::new("/cards", "fr-fr");
    store
        .save(
            &key,
            &reference[..100],
            CheckpointMetadata::new("/cards", "fr-fr", 2, 5).with_page_size(50),
        )
        .await
        .unwrap();

    let transport = ScriptedTransport::new(move |_, q| Ok(pages(q)));
    let fetcher = PaginatedFetcher::new(&context(transport.clone(), store.clone()));
    let items = fetcher
        .fetch_all(CARDS_ENDPOINT, &PageQuery::new("fr-fr"))
        .await
        .unwrap();

    assert_eq!(transport.pages_requested(CARDS_ENDPOINT), vec![2, 3]);
    assert_eq!(ids(&items), ids(&reference));

    let checkpoint = store.load(&key).await.unwrap();
    assert!(checkpoint.is_complete());
    assert_eq!(checkpoint.metadata.page_size, Some(100));
}

#[tokio::test(start_paused = true)]
async fn test_misaligned_page_size_change_starts_over() {
    let pages = hydra_pages("C", 250);
    let store = CheckpointStore::in_memory();
    let key = ResourceKey::new("/cards", "fr-fr");
    let stored: Vec<Value> = (0..80).map(|i| json!({"@id": format!("/cards/C{i}")})).collect();
    store
        .save(
            &key,
            &stored,
            CheckpointMetadata::new("/cards", "fr-fr", 2, 7).with_page_size(40),
        )
        .await
        .unwrap();

    let transport = ScriptedTransport::new(move |_, q| Ok(pages(q)));
    let fetcher = PaginatedFetcher::new(&context(transport.clone(), store));
    let items = fetcher
        .fetch_all(CARDS_ENDPOINT, &PageQuery::new("fr-fr"))
        .await
        .unwrap();

    assert_eq!(transport.pages_requested(CARDS_ENDPOINT), vec![1, 2, 3]);
    assert_eq!(items.len(), 250);
    let expected: Vec<String> = (0..250).map(|i| format!("/cards/C{i}")).collect();
    assert_eq!(ids(&items), expected);
}

/// Backend whose every operation fails.
struct BrokenBackend;

#[async_trait]
impl CheckpointBackend for BrokenBackend {
    async fn read(&self, _name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Err(StoreError::Backend("disk unavailable".to_string()))
    }

    async fn write(&self, _name: &str, _bytes: &[u8]) -> Result<(), StoreError> {
        Err(StoreError::Backend("disk full".to_string()))
    }

    async fn delete(&self, _name: &str) -> Result<(), StoreError> {
        Err(StoreError::Backend("disk unavailable".to_string()))
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        Err(StoreError::Backend("disk unavailable".to_string()))
    }
}

#[tokio::test(start_paused = true)]
async fn test_broken_store_does_not_fail_the_fetch() {
    let pages = hydra_pages("C", 250);
    let transport = ScriptedTransport::new(move |_, q| Ok(pages(q)));
    let store = CheckpointStore::new(Arc::new(BrokenBackend));
    let fetcher = PaginatedFetcher::new(&context(transport.clone(), store));

    let items = fetcher
        .fetch_all(CARDS_ENDPOINT, &PageQuery::new("fr-fr"))
        .await
        .unwrap();

    assert_eq!(items.len(), 250);
    assert_eq!(transport.pages_requested(CARDS_ENDPOINT), vec![1, 2, 3]);

    // Nothing was persisted, so a second run fetches everything again.
    let again = fetcher
        .fetch_all(CARDS_ENDPOINT, &PageQuery::new("fr-fr"))
        .await
        .unwrap();
    assert_eq!(ids(&again), ids(&items));
    assert_eq!(
        transport.pages_requested(CARDS_ENDPOINT),
        vec![1, 2, 3, 1, 2, 3]
    );
}

#[tokio::test(start_paused = true)]
async fn test_failure_keeps_last_completed_page() {
    let pages = hydra_pages("C", 250);
    let transport = ScriptedTransport::new(move |_, q| {
        if q["page"] == "3" {
            Err(FetchError::from_status(503, "Service Unavailable"))
        } else {
            Ok(pages(q))
        }
    });
    let store = CheckpointStore::in_memory();
    let fetcher = PaginatedFetcher::new(&context(transport.clone(), store.clone()));

    let result = fetcher
        .fetch_all(CARDS_ENDPOINT, &PageQuery::new("fr-fr"))
        .await;

    assert!(matches!(result, Err(FetchError::Server { status: 503, .. })));
    // Page 3 tried three times.
    assert_eq!(transport.pages_requested(CARDS_ENDPOINT), vec![1, 2, 3, 3, 3]);

    let checkpoint = store.load(&ResourceKey::new("/cards", "fr-fr")).await.unwrap();
    assert_eq!(checkpoint.metadata.completed_pages, 2);
    assert_eq!(checkpoint.items.len(), 200);
}

#[tokio::test(start_paused = true)]
async fn test_client_error_is_fatal() {
    let transport = ScriptedTransport::new(|_, _| Err(FetchError::from_status(404, "Not Found")));
    let store = CheckpointStore::in_memory();
    let fetcher = PaginatedFetcher::new(&context(transport.clone(), store.clone()));

    let result = fetcher
        .fetch_all(CARDS_ENDPOINT, &PageQuery::new("fr-fr"))
        .await;

    assert!(matches!(result, Err(FetchError::Client { status: 404, .. })));
    assert_eq!(transport.calls().len(), 1);
    assert!(store.load(&ResourceKey::new("/cards", "fr-fr")).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_malformed_page_is_fatal() {
    let transport = ScriptedTransport::new(|_, _| Ok(json!({"error": "unexpected"})));
    let fetcher = PaginatedFetcher::new(&context(transport.clone(), CheckpointStore::in_memory()));

    let result = fetcher
        .fetch_all(CARDS_ENDPOINT, &PageQuery::new("fr-fr"))
        .await;

    assert!(matches!(result, Err(FetchError::MalformedResponse(_))));
    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_bare_arrays_stop_on_empty_page() {
    let transport = ScriptedTransport::new(|_, q| {
        let page: u32 = q["page"].parse().unwrap();
        if page <= 2 {
            Ok(json!([{"@id": format!("/cards/{page}")}]))
        } else {
            Ok(json!([]))
        }
    });
    let store = CheckpointStore::in_memory();
    let fetcher = PaginatedFetcher::new(&context(transport.clone(), store.clone()));

    let items = fetcher
        .fetch_all(CARDS_ENDPOINT, &PageQuery::new("fr-fr"))
        .await
        .unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(transport.pages_requested(CARDS_ENDPOINT), vec![1, 2, 3]);
    assert!(store.is_complete(&ResourceKey::new("/cards", "fr-fr")).await);
}

#[tokio::test(start_paused = true)]
async fn test_empty_collection() {
    let transport =
        ScriptedTransport::new(|_, _| Ok(json!({"hydra:member": [], "hydra:totalItems": 0})));
    let store = CheckpointStore::in_memory();
    let fetcher = PaginatedFetcher::new(&context(transport.clone(), store.clone()));

    let items = fetcher
        .fetch_all(CARDS_ENDPOINT, &PageQuery::new("fr-fr"))
        .await
        .unwrap();

    assert!(items.is_empty());
    assert_eq!(transport.calls().len(), 1);
    assert!(store.is_complete(&ResourceKey::new("/cards", "fr-fr")).await);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_fetch_of_same_key_is_rejected() {
    let pages = hydra_pages("C", 250);
    let transport = ScriptedTransport::new(move |_, q| Ok(pages(q)));
    let fetcher = PaginatedFetcher::new(&context(transport, CheckpointStore::in_memory()));
    let query = PageQuery::new("fr-fr");

    let (first, second) = tokio::join!(
        fetcher.fetch_all(CARDS_ENDPOINT, &query),
        fetcher.fetch_all(CARDS_ENDPOINT, &query),
    );

    assert_eq!(first.unwrap().len(), 250);
    assert!(matches!(second, Err(FetchError::AlreadyInFlight(key)) if key == "_cards_fr-fr"));

    // The guard is released once the first fetch returns.
    assert!(fetcher.fetch_all(CARDS_ENDPOINT, &query).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_file_backed_resume_across_fetchers() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::new(Arc::new(FileBackend::new(dir.path())));

    let pages = hydra_pages("C", 250);
    let failing = ScriptedTransport::new(move |_, q| {
        if q["page"] == "2" {
            Err(FetchError::Timeout(30))
        } else {
            Ok(pages(q))
        }
    });
    let first = PaginatedFetcher::new(&context(failing, store.clone()));
    assert!(first
        .fetch_all(CARDS_ENDPOINT, &PageQuery::new("fr-fr"))
        .await
        .is_err());

    let pages = hydra_pages("C", 250);
    let healthy = ScriptedTransport::new(move |_, q| Ok(pages(q)));
    let second = PaginatedFetcher::new(&context(healthy.clone(), store));
    let items = second
        .fetch_all(CARDS_ENDPOINT, &PageQuery::new("fr-fr"))
        .await
        .unwrap();

    assert_eq!(items.len(), 250);
    assert_eq!(healthy.pages_requested(CARDS_ENDPOINT), vec![2, 3]);
}

// ============================================================================
// Collection Service
// ============================================================================

fn collection_transport() -> Arc<ScriptedTransport> {
    ScriptedTransport::new(|path, q| {
        let page: u32 = q.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
        match (path, page) {
            ("/cards", 1) => Ok(json!({
                "hydra:member": [
                    {"@id": "/cards/A", "reference": "A", "name": "Alpha",
                     "rarity": {"reference": "COMMON", "name": "Common"},
                     "mainFaction": {"reference": "AX", "name": "Axiom"}},
                    {"@id": "/cards/B", "reference": "B", "name": "Beta",
                     "rarity": {"reference": "RARE", "name": "Rare"},
                     "mainFaction": {"reference": "BR", "name": "Bravos"}},
                    {"@id": "/cards/C", "reference": "C", "name": "Gamma"}
                ],
                "hydra:totalItems": 3
            })),
            ("/cards/stats", 1) => Ok(json!({
                "hydra:member": [
                    {"@id": "/cards/A", "inMyCollection": 1, "lowerPrice": 0.5},
                    {"@id": "/cards/B", "inMyCollection": "∞"}
                ],
                "hydra:totalItems": 2
            })),
            ("/me", _) => Ok(json!({"id": "u1", "email": "a@b.test", "username": "alice"})),
            ("/cards/filter-data", _) => Ok(json!({"rarities": ["COMMON"], "factions": [], "types": []})),
            _ => Err(FetchError::from_status(404, "Not Found")),
        }
    })
}

#[tokio::test(start_paused = true)]
async fn test_cards_are_enriched() {
    let transport = collection_transport();
    let service = CollectionService::new(context(transport.clone(), CheckpointStore::in_memory()));

    let cards = service.cards(None).await.unwrap();

    assert_eq!(cards.len(), 3);
    assert_eq!(cards[0].collection_count, Some(Ownership::Count(1)));
    assert_eq!(cards[0].lower_price, Some(0.5));
    assert_eq!(cards[1].collection_count, Some(Ownership::Unbounded));
    assert_eq!(cards[2].collection_count, Some(Ownership::Count(0)));
    assert_eq!(cards[2].lower_price, None);

    assert_eq!(transport.pages_requested(CARDS_ENDPOINT), vec![1]);
    assert_eq!(transport.pages_requested(STATS_ENDPOINT), vec![1]);

    let missing = MissingAnalyzer::default().analyze(&cards);
    let refs: Vec<_> = missing.iter().map(|m| m.reference.as_str()).collect();
    assert_eq!(refs, vec!["A", "C"]);
}

#[tokio::test(start_paused = true)]
async fn test_offline_uses_checkpoints_only() {
    let store = CheckpointStore::in_memory();
    let online = CollectionService::new(context(collection_transport(), store.clone()));
    online.cards(Some("fr-fr")).await.unwrap();

    let silent = ScriptedTransport::new(|_, _| panic!("offline mode must not hit the network"));
    let offline = CollectionService::new(context(silent, store));
    let cards = offline.cards_offline(Some("fr-fr")).await.unwrap();

    assert_eq!(cards.len(), 3);
    assert_eq!(cards[1].collection_count, Some(Ownership::Unbounded));
}

#[tokio::test(start_paused = true)]
async fn test_offline_without_cards_checkpoint() {
    let silent = ScriptedTransport::new(|_, _| panic!("offline mode must not hit the network"));
    let service = CollectionService::new(context(silent, CheckpointStore::in_memory()));

    let result = service.cards_offline(None).await;
    assert!(matches!(result, Err(FetchError::NotCached(key)) if key == "_cards_fr-fr"));
}

#[tokio::test(start_paused = true)]
async fn test_offline_without_stats_defaults_to_unowned() {
    let store = CheckpointStore::in_memory();
    store
        .save(
            &ResourceKey::new("/cards", "fr-fr"),
            &[json!({"@id": "/cards/A", "reference": "A", "name": "Alpha"})],
            CheckpointMetadata::new("/cards", "fr-fr", 1, 1),
        )
        .await
        .unwrap();

    let silent = ScriptedTransport::new(|_, _| panic!("offline mode must not hit the network"));
    let service = CollectionService::new(context(silent, store));
    let cards = service.cards_offline(None).await.unwrap();

    assert_eq!(cards[0].collection_count, Some(Ownership::Count(0)));
}

#[tokio::test(start_paused = true)]
async fn test_one_shot_endpoints() {
    let transport = collection_transport();
    let service = CollectionService::new(context(transport.clone(), CheckpointStore::in_memory()));

    let user = service.user_info().await.unwrap();
    assert_eq!(user.username, "alice");

    let filters = service.filter_data(Some("en-us")).await.unwrap();
    assert_eq!(filters.rarities.len(), 1);

    let calls = transport.calls();
    assert_eq!(calls[0].0, "/me");
    assert!(calls[0].1.is_empty());
    assert_eq!(calls[1].1["locale"], "en-us");
}

#[tokio::test(start_paused = true)]
async fn test_raw_page_sends_collection_flag() {
    let transport = collection_transport();
    let service = CollectionService::new(context(transport.clone(), CheckpointStore::in_memory()));

    let body = service.page(1, None, None).await.unwrap();
    assert_eq!(body["hydra:totalItems"], json!(3));

    let (path, query) = &transport.calls()[0];
    assert_eq!(path, "/cards");
    assert_eq!(query["itemsPerPage"], "5");
    assert_eq!(query["collection"], "true");
}

#[tokio::test(start_paused = true)]
async fn test_clear_cache_scopes() {
    let store = CheckpointStore::in_memory();
    let service = CollectionService::new(context(collection_transport(), store.clone()));
    service.cards(None).await.unwrap();

    let cards_key = ResourceKey::new("/cards", "fr-fr");
    let stats_key = ResourceKey::new("/cards/stats", "fr-fr");

    service.clear_cache(Some("/cards"), Some("fr-fr")).await.unwrap();
    assert!(store.load(&cards_key).await.is_none());
    assert!(store.load(&stats_key).await.is_some());

    // Endpoint without locale clears everything.
    service.clear_cache(Some("/cards"), None).await.unwrap();
    assert!(store.load(&stats_key).await.is_none());
}
