use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use burrow_cache::{LayeredCache, MokaUrlCache};
use burrow_core::{CacheError, ShortCode, UrlCache, UrlRecord};
use burrow_generator::{CodeGenerator, Obfuscator, RandomGenerator, SeqGenerator};
use burrow_limiter::{TokenBucket, TokenBucketSettings};
use burrow_resolver::{
    Resolver, ResolverService, ResolverSettings, ServiceError, ShortenParams, Throttled,
};
use burrow_storage::InMemoryRepository;
use jiff::{SignedDuration, Timestamp};

struct DownCache;

#[async_trait]
impl UrlCache for DownCache {
    async fn fetch(&self, _code: &ShortCode) -> burrow_core::cache::Result<Option<UrlRecord>> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn store(
        &self,
        _code: &ShortCode,
        _record: &UrlRecord,
        _ttl: Option<Duration>,
    ) -> burrow_core::cache::Result<()> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn evict(&self, _code: &ShortCode) -> burrow_core::cache::Result<()> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }
}

/// Builds the full stack the gateway runs: limiter -> service -> {cache, store}.
fn stack(cache: Arc<dyn UrlCache>, generator: CodeGenerator) -> Arc<dyn Resolver> {
    let bucket = TokenBucket::new(TokenBucketSettings::builder().rate(1_000.0).burst(100).build())
        .unwrap();
    let service = ResolverService::new(
        Arc::new(InMemoryRepository::new()),
        cache,
        Arc::new(generator),
        ResolverSettings::default(),
    );
    Arc::new(Throttled::new(service, Arc::new(bucket)))
}

fn caches() -> Vec<(&'static str, Arc<dyn UrlCache>)> {
    vec![
        ("moka", Arc::new(MokaUrlCache::default())),
        (
            "layered",
            Arc::new(LayeredCache::new(
                MokaUrlCache::default(),
                MokaUrlCache::default(),
                Duration::from_secs(30),
            )),
        ),
        ("down", Arc::new(DownCache)),
    ]
}

#[tokio::test]
async fn create_resolve_delete_scenario() {
    for (name, cache) in caches() {
        let resolver = stack(cache, RandomGenerator::default().into());
        let expire_at = Timestamp::now() + SignedDuration::from_hours(1);

        let code = resolver
            .shorten(ShortenParams::new("https://example.com", Some(expire_at)))
            .await
            .unwrap();

        let record = resolver.resolve(&code).await.unwrap();
        assert_eq!(record.original_url, "https://example.com", "cache={name}");
        assert_eq!(record.expire_at, Some(expire_at), "cache={name}");

        // Second resolve goes through the cache when there is one.
        assert_eq!(resolver.resolve(&code).await.unwrap(), record, "cache={name}");

        resolver.delete(&code).await.unwrap();

        assert!(
            matches!(resolver.resolve(&code).await, Err(ServiceError::NotFound(_))),
            "cache={name}"
        );
        assert!(
            matches!(resolver.delete(&code).await, Err(ServiceError::NotFound(_))),
            "cache={name}"
        );
    }
}

#[tokio::test]
async fn already_expired_scenario() {
    for (name, cache) in caches() {
        let resolver = stack(cache, RandomGenerator::default().into());
        let expire_at = Timestamp::now() - SignedDuration::from_secs(1);

        let code = resolver
            .shorten(ShortenParams::new("https://example.com", Some(expire_at)))
            .await
            .unwrap();

        assert!(
            matches!(resolver.resolve(&code).await, Err(ServiceError::NotFound(_))),
            "cache={name}"
        );
    }
}

#[tokio::test]
async fn concurrent_shortens_yield_distinct_codes() {
    for generator in [
        CodeGenerator::from(RandomGenerator::new(4).unwrap()),
        CodeGenerator::from(SeqGenerator::new(Obfuscator::default()).unwrap()),
    ] {
        let resolver = stack(Arc::new(DownCache), generator);

        let handles: Vec<_> = (0..50)
            .map(|i| {
                let resolver = Arc::clone(&resolver);
                tokio::spawn(async move {
                    resolver
                        .shorten(ShortenParams::new(format!("https://example.com/{i}"), None))
                        .await
                })
            })
            .collect();

        let mut codes = Vec::new();
        for handle in handles {
            codes.push(handle.await.unwrap().unwrap());
        }

        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());

        for (i, code) in codes.iter().enumerate() {
            let record = resolver.resolve(code).await.unwrap();
            assert_eq!(record.original_url, format!("https://example.com/{i}"));
        }
    }
}

#[tokio::test]
async fn unknown_and_invalid_inputs() {
    let resolver = stack(Arc::new(MokaUrlCache::default()), RandomGenerator::default().into());

    assert!(matches!(
        resolver.resolve(&ShortCode::new("nothere").unwrap()).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        resolver
            .shorten(ShortenParams::new("javascript:alert(1)", None))
            .await,
        Err(ServiceError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn restarted_seq_generator_resumes_from_its_last_position() {
    let repository = Arc::new(InMemoryRepository::new());
    let node = |generator: SeqGenerator| {
        ResolverService::new(
            Arc::clone(&repository),
            Arc::new(DownCache),
            Arc::new(generator),
            ResolverSettings::default(),
        )
    };

    let first = Arc::new(SeqGenerator::new(Obfuscator::default()).unwrap());
    let before = ResolverService::new(
        Arc::clone(&repository),
        Arc::new(DownCache),
        Arc::clone(&first),
        ResolverSettings::default(),
    );
    let mut issued = Vec::new();
    for i in 0..20 {
        let params = ShortenParams::new(format!("https://example.com/{i}"), None);
        issued.push(before.shorten(params).await.unwrap());
    }

    // Counting from zero again runs into codes the store already holds.
    let from_zero = node(SeqGenerator::new(Obfuscator::default()).unwrap());
    assert!(matches!(
        from_zero
            .shorten(ShortenParams::new("https://example.com/late", None))
            .await,
        Err(ServiceError::IdSpaceExhausted { .. })
    ));

    let resumed = node(SeqGenerator::with_offset(Obfuscator::default(), first.position()).unwrap());
    for i in 20..40 {
        let params = ShortenParams::new(format!("https://example.com/{i}"), None);
        let code = resumed.shorten(params).await.unwrap();
        assert!(!issued.contains(&code));
    }
    for (i, code) in issued.iter().enumerate() {
        assert_eq!(
            resumed.resolve(code).await.unwrap().original_url,
            format!("https://example.com/{i}")
        );
    }
}
