use async_trait::async_trait;
use burrow_core::cache::{Result, UrlCache};
use burrow_core::{ShortCode, UrlRecord};
use moka::future::Cache;
use moka::Expiry;
use std::time::{Duration, Instant};
use tracing::trace;
use typed_builder::TypedBuilder;

#[derive(Debug, Clone)]
struct Entry {
    record: UrlRecord,
    ttl: Option<Duration>,
}

/// Gives every entry the TTL it was stored with. Overwriting an entry
/// restarts its clock.
struct EntryTtl;

impl Expiry<ShortCode, Entry> for EntryTtl {
    fn expire_after_create(&self, _: &ShortCode, entry: &Entry, _: Instant) -> Option<Duration> {
        entry.ttl
    }

    fn expire_after_update(
        &self,
        _: &ShortCode,
        entry: &Entry,
        _: Instant,
        _: Option<Duration>,
    ) -> Option<Duration> {
        entry.ttl
    }
}

#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct MokaSettings {
    /// Entries kept before moka starts evicting.
    #[builder(default = 10_000)]
    pub capacity: u64,
    /// Hard cap on any entry's lifetime, including entries stored without a
    /// TTL.
    #[builder(default, setter(strip_option))]
    pub max_ttl: Option<Duration>,
}

impl Default for MokaSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Bounded in-process cache. Works on its own for a single node, or as the
/// L1 of a [`LayeredCache`](crate::LayeredCache).
#[derive(Debug, Clone)]
pub struct MokaUrlCache {
    inner: Cache<ShortCode, Entry>,
}

impl MokaUrlCache {
    pub fn new(settings: MokaSettings) -> Self {
        let mut builder = Cache::builder()
            .max_capacity(settings.capacity)
            .expire_after(EntryTtl);
        if let Some(max_ttl) = settings.max_ttl {
            builder = builder.time_to_live(max_ttl);
        }

        Self {
            inner: builder.build(),
        }
    }

    /// Approximate; pending evictions may still be counted.
    pub fn len(&self) -> u64 {
        self.inner.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MokaUrlCache {
    fn default() -> Self {
        Self::new(MokaSettings::default())
    }
}

#[async_trait]
impl UrlCache for MokaUrlCache {
    async fn fetch(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        let hit = self.inner.get(code).await.map(|entry| entry.record);
        trace!(code = %code, hit = hit.is_some(), "moka fetch");
        Ok(hit)
    }

    async fn store(
        &self,
        code: &ShortCode,
        record: &UrlRecord,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let entry = Entry {
            record: record.clone(),
            ttl,
        };
        self.inner.insert(code.clone(), entry).await;
        trace!(code = %code, ?ttl, "moka store");
        Ok(())
    }

    async fn evict(&self, code: &ShortCode) -> Result<()> {
        self.inner.invalidate(code).await;
        trace!(code = %code, "moka evict");
        Ok(())
    }
}
