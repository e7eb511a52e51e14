use crate::error::{Result, ServiceError};
use crate::resolver::{Resolver, ShortenParams};
use async_trait::async_trait;
use burrow_core::{Repository, ShortCode, StorageError, UrlCache, UrlRecord};
use burrow_generator::Generator;
use jiff::Timestamp;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;
use url::Url;

/// Longest URL accepted by shorten. Matches the `original_url` column width.
pub const MAX_URL_LENGTH: usize = 2048;

/// Tuning knobs for [`ResolverService`].
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct ResolverSettings {
    /// How many generated codes to try before giving up on a shorten call.
    #[builder(default = 5)]
    pub max_attempts: u32,
    /// Upper bound on how long a record may live in the cache. This is also
    /// the longest a cache can serve a record after it was deleted.
    #[builder(default = Duration::from_secs(600))]
    pub cache_ttl_ceiling: Duration,
    /// Deadline for a single cache call.
    #[builder(default = Duration::from_millis(50))]
    pub cache_timeout: Duration,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// The resolution core.
///
/// Writes go to the repository only (write-around). Reads are cache-aside:
/// the cache is consulted first, misses are filled from the repository, and
/// expiration is enforced lazily on every read. The cache is never trusted
/// with correctness; any cache failure degrades to a miss.
pub struct ResolverService<R: ?Sized, C: ?Sized, G> {
    repository: Arc<R>,
    cache: Arc<C>,
    generator: Arc<G>,
    settings: ResolverSettings,
}

impl<R: ?Sized, C: ?Sized, G> Clone for ResolverService<R, C, G> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            cache: Arc::clone(&self.cache),
            generator: Arc::clone(&self.generator),
            settings: self.settings,
        }
    }
}

impl<R: ?Sized, C: ?Sized, G> std::fmt::Debug for ResolverService<R, C, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverService")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<R, C, G> ResolverService<R, C, G>
where
    R: Repository + ?Sized,
    C: UrlCache + ?Sized,
    G: Generator,
{
    pub fn new(
        repository: Arc<R>,
        cache: Arc<C>,
        generator: Arc<G>,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            repository,
            cache,
            generator,
            settings,
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn cache(&self) -> &Arc<C> {
        &self.cache
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Accepts absolute `http`/`https` URLs with a host, up to
    /// [`MAX_URL_LENGTH`] bytes.
    fn validate_url(raw: &str) -> Result<()> {
        if raw.trim().is_empty() {
            return Err(ServiceError::InvalidInput("URL cannot be empty".to_string()));
        }

        if raw.len() > MAX_URL_LENGTH {
            return Err(ServiceError::InvalidInput(format!(
                "URL is {} bytes long, the limit is {MAX_URL_LENGTH}",
                raw.len()
            )));
        }

        let url = Url::parse(raw)
            .map_err(|e| ServiceError::InvalidInput(format!("invalid URL '{raw}': {e}")))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ServiceError::InvalidInput(format!(
                "URL scheme must be http or https: {}",
                url.scheme()
            )));
        }

        if url.host_str().map_or(true, str::is_empty) {
            return Err(ServiceError::InvalidInput(format!(
                "URL must have a host: {raw}"
            )));
        }

        Ok(())
    }

    /// TTL for a record about to be cached: its remaining lifetime, capped
    /// by the ceiling. `None` when nothing is left to cache.
    fn cache_ttl_for(&self, record: &UrlRecord, now: Timestamp) -> Option<Duration> {
        let ceiling = self.settings.cache_ttl_ceiling;
        let ttl = record
            .remaining_at(now)
            .map_or(ceiling, |remaining| remaining.min(ceiling));
        (!ttl.is_zero()).then_some(ttl)
    }

    async fn cache_get(&self, code: &ShortCode) -> Option<UrlRecord> {
        match tokio::time::timeout(self.settings.cache_timeout, self.cache.fetch(code)).await {
            Ok(Ok(hit)) => hit,
            Ok(Err(e)) => {
                warn!(code = %code, error = %e, "Cache lookup failed, treating as miss");
                None
            }
            Err(_) => {
                warn!(code = %code, timeout = ?self.settings.cache_timeout, "Cache lookup timed out, treating as miss");
                None
            }
        }
    }

    async fn cache_set(&self, code: &ShortCode, record: &UrlRecord, ttl: Duration) {
        match tokio::time::timeout(
            self.settings.cache_timeout,
            self.cache.store(code, record, Some(ttl)),
        )
        .await
        {
            Ok(Ok(())) => trace!(code = %code, ?ttl, "Populated cache"),
            Ok(Err(e)) => warn!(code = %code, error = %e, "Failed to populate cache"),
            Err(_) => warn!(code = %code, "Cache population timed out"),
        }
    }

    async fn cache_del(&self, code: &ShortCode) {
        match tokio::time::timeout(self.settings.cache_timeout, self.cache.evict(code)).await {
            Ok(Ok(())) => trace!(code = %code, "Invalidated cache entry"),
            Ok(Err(e)) => warn!(code = %code, error = %e, "Failed to invalidate cache entry"),
            Err(_) => warn!(code = %code, "Cache invalidation timed out"),
        }
    }
}

#[async_trait]
impl<R, C, G> Resolver for ResolverService<R, C, G>
where
    R: Repository + ?Sized,
    C: UrlCache + ?Sized,
    G: Generator,
{
    async fn shorten(&self, params: ShortenParams) -> Result<ShortCode> {
        Self::validate_url(&params.original_url)?;

        let record = UrlRecord::new(params.original_url, params.expire_at);
        let attempts = self.settings.max_attempts.max(1);

        for attempt in 1..=attempts {
            let code: ShortCode = self.generator.generate().into();
            match self.repository.insert(&code, record.clone()).await {
                Ok(()) => {
                    debug!(code = %code, attempt, "Created short URL");
                    return Ok(code);
                }
                Err(StorageError::Conflict(_)) => {
                    debug!(code = %code, attempt, "Short code already taken, regenerating");
                }
                Err(e) => {
                    warn!(code = %code, error = %e, "Failed to store short URL");
                    return Err(e.into());
                }
            }
        }

        warn!(attempts, "Gave up generating a free short code");
        Err(ServiceError::IdSpaceExhausted { attempts })
    }

    async fn resolve(&self, code: &ShortCode) -> Result<UrlRecord> {
        trace!(code = %code, "Resolving short code");

        if let Some(record) = self.cache_get(code).await {
            if !record.is_expired_at(Timestamp::now()) {
                debug!(code = %code, "Resolved from cache");
                return Ok(record);
            }
            debug!(code = %code, "Cached record has expired, invalidating");
            self.cache_del(code).await;
        }

        let Some(record) = self.repository.get(code).await? else {
            trace!(code = %code, "Short code not found");
            return Err(ServiceError::NotFound(code.to_string()));
        };

        let now = Timestamp::now();
        if record.is_expired_at(now) {
            match self.repository.delete_expired(code, now).await {
                Ok(removed) => debug!(code = %code, removed, "Record has expired"),
                Err(e) => warn!(code = %code, error = %e, "Failed to remove expired record"),
            }
            return Err(ServiceError::NotFound(code.to_string()));
        }

        if let Some(ttl) = self.cache_ttl_for(&record, now) {
            self.cache_set(code, &record, ttl).await;
        }

        debug!(code = %code, url = %record.original_url, "Resolved from store");
        Ok(record)
    }

    async fn delete(&self, code: &ShortCode) -> Result<()> {
        if !self.repository.delete(code).await? {
            return Err(ServiceError::NotFound(code.to_string()));
        }

        self.cache_del(code).await;
        debug!(code = %code, "Deleted short URL");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burrow_cache::{MokaUrlCache, NoopCache};
    use burrow_core::CacheError;
    use burrow_generator::RandomGenerator;
    use burrow_storage::InMemoryRepository;
    use jiff::SignedDuration;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails every call.
    struct FailingCache;

    #[async_trait]
    impl UrlCache for FailingCache {
        async fn fetch(&self, _code: &ShortCode) -> burrow_core::cache::Result<Option<UrlRecord>> {
            Err(CacheError::Unavailable("cache is down".to_string()))
        }

        async fn store(
            &self,
            _code: &ShortCode,
            _record: &UrlRecord,
            _ttl: Option<Duration>,
        ) -> burrow_core::cache::Result<()> {
            Err(CacheError::Unavailable("cache is down".to_string()))
        }

        async fn evict(&self, _code: &ShortCode) -> burrow_core::cache::Result<()> {
            Err(CacheError::Unavailable("cache is down".to_string()))
        }
    }

    /// Never answers.
    struct HangingCache;

    #[async_trait]
    impl UrlCache for HangingCache {
        async fn fetch(&self, _code: &ShortCode) -> burrow_core::cache::Result<Option<UrlRecord>> {
            std::future::pending().await
        }

        async fn store(
            &self,
            _code: &ShortCode,
            _record: &UrlRecord,
            _ttl: Option<Duration>,
        ) -> burrow_core::cache::Result<()> {
            std::future::pending().await
        }

        async fn evict(&self, _code: &ShortCode) -> burrow_core::cache::Result<()> {
            std::future::pending().await
        }
    }

    /// Storage that is down for every call.
    struct FailingRepository;

    #[async_trait]
    impl Repository for FailingRepository {
        async fn insert(
            &self,
            _code: &ShortCode,
            _record: UrlRecord,
        ) -> burrow_core::repository::Result<()> {
            Err(StorageError::Unavailable("store is down".to_string()))
        }

        async fn get(
            &self,
            _code: &ShortCode,
        ) -> burrow_core::repository::Result<Option<UrlRecord>> {
            Err(StorageError::Unavailable("store is down".to_string()))
        }

        async fn delete(&self, _code: &ShortCode) -> burrow_core::repository::Result<bool> {
            Err(StorageError::Unavailable("store is down".to_string()))
        }

        async fn delete_expired(
            &self,
            _code: &ShortCode,
            _now: Timestamp,
        ) -> burrow_core::repository::Result<bool> {
            Err(StorageError::Unavailable("store is down".to_string()))
        }

        async fn purge_expired(&self, _now: Timestamp) -> burrow_core::repository::Result<u64> {
            Err(StorageError::Unavailable("store is down".to_string()))
        }
    }

    /// Returns the same code every time and counts the calls.
    struct FixedGenerator {
        code: &'static str,
        calls: AtomicUsize,
    }

    impl FixedGenerator {
        fn new(code: &'static str) -> Self {
            Self {
                code,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Generator for FixedGenerator {
        type Output = ShortCode;

        fn generate(&self) -> ShortCode {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ShortCode::new_unchecked(self.code)
        }
    }

    fn service_with<C: UrlCache>(
        cache: C,
    ) -> ResolverService<InMemoryRepository, C, RandomGenerator> {
        ResolverService::new(
            Arc::new(InMemoryRepository::new()),
            Arc::new(cache),
            Arc::new(RandomGenerator::default()),
            ResolverSettings::default(),
        )
    }

    fn params(url: &str) -> ShortenParams {
        ShortenParams::new(url, None)
    }

    fn in_the_past() -> Timestamp {
        Timestamp::now() - SignedDuration::from_secs(60)
    }

    fn in_the_future() -> Timestamp {
        Timestamp::now() + SignedDuration::from_hours(1)
    }

    #[tokio::test]
    async fn shorten_then_resolve_round_trips() {
        let service = service_with(MokaUrlCache::default());

        let code = service.shorten(params("https://example.com/a")).await.unwrap();
        let record = service.resolve(&code).await.unwrap();

        assert_eq!(record.original_url, "https://example.com/a");
        assert_eq!(record.expire_at, None);
    }

    #[tokio::test]
    async fn shorten_does_not_touch_the_cache() {
        let service = service_with(MokaUrlCache::default());

        let code = service.shorten(params("https://example.com")).await.unwrap();

        assert!(service.cache().fetch(&code).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn resolve_populates_the_cache() {
        let service = service_with(MokaUrlCache::default());
        let code = service.shorten(params("https://example.com")).await.unwrap();

        service.resolve(&code).await.unwrap();

        let cached = service.cache().fetch(&code).await.unwrap();
        assert_eq!(cached.map(|r| r.original_url).as_deref(), Some("https://example.com"));
    }

    #[tokio::test]
    async fn shorten_rejects_invalid_urls() {
        let service = service_with(NoopCache);

        for url in ["", "   ", "not a url", "example.com", "ftp://example.com/file", "mailto:a@b.c"] {
            let err = service.shorten(params(url)).await.unwrap_err();
            assert!(
                matches!(err, ServiceError::InvalidInput(_)),
                "{url:?} gave {err:?}"
            );
        }
        assert!(service.repository().is_empty());
    }

    #[tokio::test]
    async fn shorten_enforces_the_url_length_limit() {
        let service = service_with(NoopCache);
        let prefix = "https://example.com/";
        let at_limit = format!("{prefix}{}", "a".repeat(MAX_URL_LENGTH - prefix.len()));
        let over_limit = format!("{at_limit}a");

        let code = service.shorten(params(&at_limit)).await.unwrap();
        assert_eq!(service.resolve(&code).await.unwrap().original_url, at_limit);

        assert!(matches!(
            service.shorten(params(&over_limit)).await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert_eq!(service.repository().len(), 1);
    }

    #[tokio::test]
    async fn shorten_accepts_http_and_https() {
        let service = service_with(NoopCache);

        assert!(service.shorten(params("http://example.com")).await.is_ok());
        assert!(service
            .shorten(params("https://example.com:8443/path?q=1#frag"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn resolve_unknown_code_is_not_found() {
        let service = service_with(MokaUrlCache::default());

        let err = service
            .resolve(&ShortCode::new("missing").unwrap())
            .await
            .unwrap_err();

        assert_eq!(err, ServiceError::NotFound("missing".to_string()));
    }

    #[tokio::test]
    async fn already_expired_mapping_is_never_observable() {
        let service = service_with(MokaUrlCache::default());

        let code = service
            .shorten(ShortenParams::new("https://example.com", Some(in_the_past())))
            .await
            .unwrap();

        assert!(matches!(
            service.resolve(&code).await,
            Err(ServiceError::NotFound(_))
        ));
        // Lazy expiration removed the record from the store.
        assert!(service.repository().get(&code).await.unwrap().is_none());
        assert!(service.cache().fetch(&code).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn mapping_disappears_once_it_expires() {
        let service = service_with(MokaUrlCache::default());
        let expire_at = Timestamp::now() + SignedDuration::from_millis(300);

        let code = service
            .shorten(ShortenParams::new("https://example.com", Some(expire_at)))
            .await
            .unwrap();
        assert!(service.resolve(&code).await.is_ok());

        tokio::time::sleep(Duration::from_millis(400)).await;

        assert!(matches!(
            service.resolve(&code).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn expired_cache_entry_is_not_served() {
        let service = service_with(MokaUrlCache::default());
        let code = ShortCode::new("stale01").unwrap();
        let expired = UrlRecord::new("https://example.com", Some(in_the_past()));

        // A cache entry that outlived its record.
        service
            .cache()
            .store(&code, &expired, Some(Duration::from_secs(60)))
            .await
            .unwrap();

        assert!(matches!(
            service.resolve(&code).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(service.cache().fetch(&code).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cache_ttl_never_outlives_the_record() {
        let service = service_with(NoopCache);
        let now = Timestamp::now();

        let soon = UrlRecord::new("https://example.com", Some(now + SignedDuration::from_secs(5)));
        let later = UrlRecord::new("https://example.com", Some(in_the_future()));
        let never = UrlRecord::new("https://example.com", None);
        let gone = UrlRecord::new("https://example.com", Some(now));

        assert_eq!(service.cache_ttl_for(&soon, now), Some(Duration::from_secs(5)));
        assert_eq!(service.cache_ttl_for(&later, now), Some(Duration::from_secs(600)));
        assert_eq!(service.cache_ttl_for(&never, now), Some(Duration::from_secs(600)));
        assert_eq!(service.cache_ttl_for(&gone, now), None);
    }

    #[tokio::test]
    async fn deleted_mapping_is_not_resurrected() {
        let service = service_with(MokaUrlCache::default());
        let code = service.shorten(params("https://example.com")).await.unwrap();

        // Warm the cache so delete has something to invalidate.
        service.resolve(&code).await.unwrap();
        service.delete(&code).await.unwrap();

        assert!(matches!(
            service.resolve(&code).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(service.cache().fetch(&code).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_unknown_code_is_not_found() {
        let service = service_with(MokaUrlCache::default());

        let err = service
            .delete(&ShortCode::new("missing").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_of_expired_but_unswept_record_succeeds() {
        let service = service_with(NoopCache);
        let code = service
            .shorten(ShortenParams::new("https://example.com", Some(in_the_past())))
            .await
            .unwrap();

        service.delete(&code).await.unwrap();
        assert!(service.repository().is_empty());
    }

    #[tokio::test]
    async fn parallel_shortens_get_distinct_codes() {
        let service = service_with(MokaUrlCache::default());

        let handles: Vec<_> = (0..64)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .shorten(params(&format!("https://example.com/{i}")))
                        .await
                })
            })
            .collect();

        let mut codes = HashSet::new();
        for handle in handles {
            codes.insert(handle.await.unwrap().unwrap());
        }

        assert_eq!(codes.len(), 64);
        assert_eq!(service.repository().len(), 64);
    }

    #[tokio::test]
    async fn collisions_exhaust_the_retry_budget() {
        let generator = Arc::new(FixedGenerator::new("same01"));
        let service = ResolverService::new(
            Arc::new(InMemoryRepository::new()),
            Arc::new(NoopCache),
            Arc::clone(&generator),
            ResolverSettings::builder().max_attempts(3).build(),
        );

        let first = service.shorten(params("https://one.example")).await.unwrap();
        assert_eq!(first.as_str(), "same01");

        let err = service
            .shorten(params("https://two.example"))
            .await
            .unwrap_err();

        assert_eq!(err, ServiceError::IdSpaceExhausted { attempts: 3 });
        // One call for the first shorten, three for the second.
        assert_eq!(generator.calls.load(Ordering::SeqCst), 4);
        let kept = service.resolve(&first).await.unwrap();
        assert_eq!(kept.original_url, "https://one.example");
    }

    #[tokio::test]
    async fn expired_record_still_blocks_its_code() {
        let service = ResolverService::new(
            Arc::new(InMemoryRepository::new()),
            Arc::new(NoopCache),
            Arc::new(FixedGenerator::new("same01")),
            ResolverSettings::builder().max_attempts(1).build(),
        );

        service
            .shorten(ShortenParams::new("https://one.example", Some(in_the_past())))
            .await
            .unwrap();

        assert!(matches!(
            service.shorten(params("https://two.example")).await,
            Err(ServiceError::IdSpaceExhausted { attempts: 1 })
        ));
    }

    #[tokio::test]
    async fn failing_cache_degrades_to_the_store() {
        let service = service_with(FailingCache);

        let code = service.shorten(params("https://example.com")).await.unwrap();
        assert_eq!(
            service.resolve(&code).await.unwrap().original_url,
            "https://example.com"
        );

        service.delete(&code).await.unwrap();
        assert!(matches!(
            service.resolve(&code).await,
            Err(ServiceError::NotFound(_))
        ));

        let expired = service
            .shorten(ShortenParams::new("https://example.com", Some(in_the_past())))
            .await
            .unwrap();
        assert!(matches!(
            service.resolve(&expired).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn hanging_cache_is_bounded_by_the_cache_timeout() {
        let service = ResolverService::new(
            Arc::new(InMemoryRepository::new()),
            Arc::new(HangingCache),
            Arc::new(RandomGenerator::default()),
            ResolverSettings::builder()
                .cache_timeout(Duration::from_millis(20))
                .build(),
        );
        let code = service.shorten(params("https://example.com")).await.unwrap();

        let started = std::time::Instant::now();
        assert!(service.resolve(&code).await.is_ok());
        service.delete(&code).await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn store_outage_surfaces_as_store_unavailable() {
        let service = ResolverService::new(
            Arc::new(FailingRepository),
            Arc::new(NoopCache),
            Arc::new(RandomGenerator::default()),
            ResolverSettings::default(),
        );
        let code = ShortCode::new("abc123").unwrap();
        let down = ServiceError::StoreUnavailable(StorageError::Unavailable(
            "store is down".to_string(),
        ));

        assert_eq!(
            service.shorten(params("https://example.com")).await.unwrap_err(),
            down
        );
        assert_eq!(service.resolve(&code).await.unwrap_err(), down);
        assert_eq!(service.delete(&code).await.unwrap_err(), down);
    }

    #[tokio::test]
    async fn cached_records_resolve_while_the_store_is_down() {
        let service = ResolverService::new(
            Arc::new(FailingRepository),
            Arc::new(MokaUrlCache::default()),
            Arc::new(RandomGenerator::default()),
            ResolverSettings::default(),
        );
        let code = ShortCode::new("abc123").unwrap();
        service
            .cache()
            .store(
                &code,
                &UrlRecord::new("https://example.com", Some(in_the_future())),
                None,
            )
            .await
            .unwrap();

        let record = service.resolve(&code).await.unwrap();
        assert_eq!(record.original_url, "https://example.com");

        // Delete goes to the store first, so the cached entry stays.
        assert!(matches!(
            service.delete(&code).await,
            Err(ServiceError::StoreUnavailable(_))
        ));
        assert!(service.cache().fetch(&code).await.unwrap().is_some());
    }
}
