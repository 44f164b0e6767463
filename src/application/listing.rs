//! Cache-aside protocol for the paginated article listing.
//!
//! Two cached artifacts per listing namespace: the max-page scalar derived
//! from the non-deleted article count, and the serialized content of each
//! page. Both are filled on miss with independent 300-second TTL clocks and
//! never invalidated by writes; staleness is bounded by TTL alone.
//!
//! Requests for pages beyond the cached max-page are answered from the
//! scalar without touching the store and without creating a page entry, so
//! probing past the end of the dataset stays a pure cache hit.
//!
//! Concurrent misses on the same key each recompute and rewrite it. The
//! duplicate work is accepted; every write is an idempotent recomputation,
//! so last-writer-wins cannot corrupt the key.

use std::{num::NonZeroU32, sync::Arc, time::Duration};

use metrics::counter;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    application::repos::{ArticleStore, StoreError},
    cache::{CacheError, KeyValueCache, ListingKeys},
    domain::articles::ArticleCard,
};

pub const METRIC_PAGE_HIT: &str = "edicola_listing_page_hit_total";
pub const METRIC_PAGE_MISS: &str = "edicola_listing_page_miss_total";
pub const METRIC_OUT_OF_RANGE: &str = "edicola_listing_out_of_range_total";
pub const METRIC_MAX_PAGE_REFRESH: &str = "edicola_listing_max_page_refresh_total";

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("article store unavailable")]
    Store(#[from] StoreError),
    #[error("cache backend unavailable")]
    Cache(#[from] CacheError),
}

/// Where a listing response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageSource {
    /// Content was already cached.
    CacheHit,
    /// Content was computed from the store and written back.
    FreshlyComputed,
    /// The page lies beyond the cached max-page bound; no content exists.
    OutOfRange,
}

/// One resolved listing page.
#[derive(Debug, Clone)]
pub struct ListingPage {
    pub articles: Vec<ArticleCard>,
    pub source: PageSource,
}

/// Page size and entry lifetime for one listing namespace.
#[derive(Debug, Clone, Copy)]
pub struct ListingConfig {
    pub page_size: NonZeroU32,
    pub ttl: Duration,
}

pub struct ListingService {
    store: Arc<dyn ArticleStore>,
    cache: Arc<dyn KeyValueCache>,
    keys: ListingKeys,
    page_size: NonZeroU32,
    ttl: Duration,
}

impl ListingService {
    pub fn new(
        store: Arc<dyn ArticleStore>,
        cache: Arc<dyn KeyValueCache>,
        config: ListingConfig,
    ) -> Self {
        Self {
            store,
            cache,
            keys: ListingKeys::new(config.page_size),
            page_size: config.page_size,
            ttl: config.ttl,
        }
    }

    /// Resolve listing page `page`.
    ///
    /// Sequencing within a call is strict: max-page resolution, then the
    /// range check, then page-content resolution. Failures at either I/O
    /// boundary propagate immediately; there is no stale fallback.
    pub async fn get_page(&self, page: NonZeroU32) -> Result<ListingPage, ListingError> {
        let max_page = self.resolve_max_page().await?;

        if u64::from(page.get()) > max_page {
            counter!(METRIC_OUT_OF_RANGE).increment(1);
            debug!(page = page.get(), max_page, "listing page out of range");
            return Ok(ListingPage {
                articles: Vec::new(),
                source: PageSource::OutOfRange,
            });
        }

        let key = self.keys.page(page.get());
        if let Some(raw) = self.cache.get(&key).await? {
            match serde_json::from_str::<Vec<ArticleCard>>(&raw) {
                Ok(articles) => {
                    counter!(METRIC_PAGE_HIT).increment(1);
                    return Ok(ListingPage {
                        articles,
                        source: PageSource::CacheHit,
                    });
                }
                Err(error) => {
                    // Unreadable entry: fall through to a recompute, which
                    // rewrites the key and heals it.
                    warn!(%key, %error, "discarding unreadable cached page");
                }
            }
        }

        counter!(METRIC_PAGE_MISS).increment(1);
        let articles = self.store.page(page).await?;
        let serialized = serde_json::to_string(&articles)
            .map_err(|err| CacheError::backend(format!("serialize page entry: {err}")))?;
        self.cache.set(&key, &serialized, self.ttl).await?;
        debug!(
            page = page.get(),
            items = articles.len(),
            ttl_secs = self.ttl.as_secs(),
            "filled listing page entry"
        );

        Ok(ListingPage {
            articles,
            source: PageSource::FreshlyComputed,
        })
    }

    /// Read the cached max-page bound, recomputing it from the store when
    /// the entry is missing, expired, or unreadable.
    async fn resolve_max_page(&self) -> Result<u64, ListingError> {
        let key = self.keys.max_page();

        if let Some(raw) = self.cache.get(&key).await? {
            match raw.trim().parse::<u64>() {
                Ok(value) => return Ok(value),
                Err(error) => {
                    warn!(%key, %error, "discarding unreadable cached max-page");
                }
            }
        }

        let total = self.store.count().await?;
        let max_page = total.div_ceil(u64::from(self.page_size.get()));
        self.cache.set(&key, &max_page.to_string(), self.ttl).await?;
        counter!(METRIC_MAX_PAGE_REFRESH).increment(1);
        debug!(
            total,
            max_page,
            ttl_secs = self.ttl.as_secs(),
            "recomputed listing max-page"
        );

        Ok(max_page)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use uuid::Uuid;

    use super::*;
    use crate::cache::MemoryCache;

    const TTL: Duration = Duration::from_secs(300);

    fn card(title: &str) -> ArticleCard {
        ArticleCard {
            id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            author_name: "ada".to_string(),
            author_avatar: String::new(),
            title: title.to_string(),
            description: String::new(),
            cover_url: String::new(),
            resources: Vec::new(),
            views: 0,
            favorites: 0,
        }
    }

    /// Store double that serves fixed projections and counts its calls.
    struct CountingStore {
        cards: Vec<ArticleCard>,
        page_size: u32,
        count_calls: AtomicUsize,
        page_calls: AtomicUsize,
    }

    impl CountingStore {
        fn new(cards: Vec<ArticleCard>, page_size: u32) -> Self {
            Self {
                cards,
                page_size,
                count_calls: AtomicUsize::new(0),
                page_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ArticleStore for CountingStore {
        async fn count(&self) -> Result<u64, StoreError> {
            self.count_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.cards.len() as u64)
        }

        async fn page(&self, n: NonZeroU32) -> Result<Vec<ArticleCard>, StoreError> {
            self.page_calls.fetch_add(1, Ordering::SeqCst);
            let skip = (n.get() - 1) as usize * self.page_size as usize;
            Ok(self
                .cards
                .iter()
                .skip(skip)
                .take(self.page_size as usize)
                .cloned()
                .collect())
        }
    }

    /// Store double that fails every call.
    struct FailingStore;

    #[async_trait]
    impl ArticleStore for FailingStore {
        async fn count(&self) -> Result<u64, StoreError> {
            Err(StoreError::Persistence("connection refused".to_string()))
        }

        async fn page(&self, _n: NonZeroU32) -> Result<Vec<ArticleCard>, StoreError> {
            Err(StoreError::Persistence("connection refused".to_string()))
        }
    }

    fn page_number(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).expect("positive page number")
    }

    fn service(
        store: Arc<CountingStore>,
        cache: MemoryCache,
        page_size: u32,
    ) -> (ListingService, ListingKeys) {
        let page_size = NonZeroU32::new(page_size).expect("nonzero page size");
        let service = ListingService::new(
            store,
            Arc::new(cache),
            ListingConfig {
                page_size,
                ttl: TTL,
            },
        );
        (service, ListingKeys::new(page_size))
    }

    #[tokio::test]
    async fn cold_cache_queries_store_once_for_count_and_once_for_page() {
        let store = Arc::new(CountingStore::new(
            vec![card("a1"), card("a2"), card("a3")],
            2,
        ));
        let (service, _) = service(store.clone(), MemoryCache::new(), 2);

        let result = service.get_page(page_number(1)).await.expect("get page");
        assert_eq!(result.source, PageSource::FreshlyComputed);
        assert_eq!(result.articles.len(), 2);
        assert_eq!(store.count_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.page_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn warm_cache_serves_identical_content_with_zero_store_calls() {
        let store = Arc::new(CountingStore::new(vec![card("a1"), card("a2")], 2));
        let (service, _) = service(store.clone(), MemoryCache::new(), 2);

        let first = service.get_page(page_number(1)).await.expect("first call");
        let second = service.get_page(page_number(1)).await.expect("second call");

        assert_eq!(second.source, PageSource::CacheHit);
        assert_eq!(second.articles, first.articles);
        assert_eq!(store.count_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.page_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn out_of_range_is_idempotent_and_never_reaches_the_page_path() {
        let cards = vec![card("a1"), card("a2"), card("a3"), card("a4"), card("a5")];
        let store = Arc::new(CountingStore::new(cards, 2));
        let cache = MemoryCache::new();
        let (service, keys) = service(store.clone(), cache.clone(), 2);

        for _ in 0..3 {
            let result = service.get_page(page_number(4)).await.expect("get page");
            assert_eq!(result.source, PageSource::OutOfRange);
            assert!(result.articles.is_empty());
        }

        assert_eq!(store.count_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.page_calls.load(Ordering::SeqCst), 0);
        // no page entry was created for the out-of-range number
        assert_eq!(cache.get(&keys.page(4)).await.expect("cache get"), None);
    }

    #[tokio::test]
    async fn max_page_arithmetic_rounds_up() {
        let cards = vec![card("a1"), card("a2"), card("a3"), card("a4"), card("a5")];
        let store = Arc::new(CountingStore::new(cards, 2));
        let cache = MemoryCache::new();
        let (service, keys) = service(store, cache.clone(), 2);

        let third = service.get_page(page_number(3)).await.expect("page 3");
        assert_eq!(third.source, PageSource::FreshlyComputed);
        assert_eq!(third.articles.len(), 1);
        assert_eq!(
            cache.get(&keys.max_page()).await.expect("cache get"),
            Some("3".to_string())
        );

        let fourth = service.get_page(page_number(4)).await.expect("page 4");
        assert_eq!(fourth.source, PageSource::OutOfRange);
    }

    #[tokio::test]
    async fn empty_store_puts_every_page_out_of_range() {
        let store = Arc::new(CountingStore::new(Vec::new(), 2));
        let (service, _) = service(store.clone(), MemoryCache::new(), 2);

        for n in [1, 2, 50] {
            let result = service.get_page(page_number(n)).await.expect("get page");
            assert_eq!(result.source, PageSource::OutOfRange);
            assert!(result.articles.is_empty());
        }

        assert_eq!(store.count_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.page_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_max_page_is_recomputed_while_page_entry_stays_warm() {
        let store = Arc::new(CountingStore::new(vec![card("a1"), card("a2")], 2));
        let cache = MemoryCache::new();
        let (service, keys) = service(store.clone(), cache.clone(), 2);

        service.get_page(page_number(1)).await.expect("warm fill");
        assert_eq!(store.count_calls.load(Ordering::SeqCst), 1);

        // shorten only the max-page clock, then let it lapse
        cache
            .set(&keys.max_page(), "1", Duration::from_secs(10))
            .await
            .expect("rewrite max-page");
        tokio::time::advance(Duration::from_secs(11)).await;

        let result = service.get_page(page_number(1)).await.expect("get page");
        assert_eq!(result.source, PageSource::CacheHit);
        assert_eq!(store.count_calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.page_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_page_entry_is_refetched_under_a_warm_max_page() {
        let store = Arc::new(CountingStore::new(vec![card("a1"), card("a2")], 2));
        let cache = MemoryCache::new();
        let (service, keys) = service(store.clone(), cache.clone(), 2);

        service.get_page(page_number(1)).await.expect("warm fill");

        cache
            .set(&keys.page(1), "[]", Duration::from_secs(10))
            .await
            .expect("rewrite page entry");
        tokio::time::advance(Duration::from_secs(11)).await;

        let result = service.get_page(page_number(1)).await.expect("get page");
        assert_eq!(result.source, PageSource::FreshlyComputed);
        assert_eq!(store.count_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.page_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unreadable_max_page_entry_is_recomputed() {
        let store = Arc::new(CountingStore::new(vec![card("a1")], 2));
        let cache = MemoryCache::new();
        let (service, keys) = service(store.clone(), cache.clone(), 2);

        cache
            .set(&keys.max_page(), "not-a-number", TTL)
            .await
            .expect("seed corrupt entry");

        let result = service.get_page(page_number(1)).await.expect("get page");
        assert_eq!(result.source, PageSource::FreshlyComputed);
        assert_eq!(store.count_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            cache.get(&keys.max_page()).await.expect("cache get"),
            Some("1".to_string())
        );
    }

    #[tokio::test]
    async fn unreadable_page_entry_is_refetched_and_healed() {
        let store = Arc::new(CountingStore::new(vec![card("a1")], 2));
        let cache = MemoryCache::new();
        let (service, keys) = service(store.clone(), cache.clone(), 2);

        cache
            .set(&keys.max_page(), "1", TTL)
            .await
            .expect("seed max-page");
        cache
            .set(&keys.page(1), "{broken", TTL)
            .await
            .expect("seed corrupt entry");

        let result = service.get_page(page_number(1)).await.expect("get page");
        assert_eq!(result.source, PageSource::FreshlyComputed);
        assert_eq!(store.page_calls.load(Ordering::SeqCst), 1);

        let healed = cache
            .get(&keys.page(1))
            .await
            .expect("cache get")
            .expect("healed entry");
        let parsed: Vec<ArticleCard> = serde_json::from_str(&healed).expect("valid entry");
        assert_eq!(parsed.len(), 1);
    }

    #[tokio::test]
    async fn store_failure_propagates_without_fallback() {
        let service = ListingService::new(
            Arc::new(FailingStore),
            Arc::new(MemoryCache::new()),
            ListingConfig {
                page_size: NonZeroU32::new(2).expect("nonzero page size"),
                ttl: TTL,
            },
        );

        let error = service.get_page(page_number(1)).await.expect_err("failure");
        assert!(matches!(error, ListingError::Store(_)));
    }
}
