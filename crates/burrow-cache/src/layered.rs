use async_trait::async_trait;
use burrow_core::cache::{Result, UrlCache};
use burrow_core::{ShortCode, UrlRecord};
use jiff::Timestamp;
use std::time::Duration;
use tracing::{debug, warn};

/// Two caches stacked as near (`L1`) and far (`L2`), usually moka in front
/// of Redis.
///
/// Reads fall through to the far layer when the near one misses or fails,
/// and a far hit is copied back into the near layer for at most
/// `promote_ttl`. Writes go far first, then near. Evictions always hit both
/// layers and report the first failure.
///
/// ```rust
/// use burrow_cache::{LayeredCache, MokaUrlCache, NoopCache};
/// use std::time::Duration;
///
/// let cache = LayeredCache::new(MokaUrlCache::default(), NoopCache, Duration::from_secs(30));
/// assert_eq!(cache.promote_ttl(), Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct LayeredCache<L1, L2> {
    near: L1,
    far: L2,
    promote_ttl: Duration,
}

impl<L1, L2> LayeredCache<L1, L2> {
    pub fn new(near: L1, far: L2, promote_ttl: Duration) -> Self {
        Self {
            near,
            far,
            promote_ttl,
        }
    }

    pub fn near(&self) -> &L1 {
        &self.near
    }

    pub fn far(&self) -> &L2 {
        &self.far
    }

    pub fn promote_ttl(&self) -> Duration {
        self.promote_ttl
    }

    /// A promoted entry must not outlive the record itself.
    fn promotion_ttl(&self, record: &UrlRecord, now: Timestamp) -> Duration {
        match record.remaining_at(now) {
            Some(remaining) => remaining.min(self.promote_ttl),
            None => self.promote_ttl,
        }
    }
}

#[async_trait]
impl<L1, L2> UrlCache for LayeredCache<L1, L2>
where
    L1: UrlCache,
    L2: UrlCache,
{
    async fn fetch(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        match self.near.fetch(code).await {
            Ok(Some(record)) => return Ok(Some(record)),
            Ok(None) => {}
            Err(e) => warn!(code = %code, error = %e, "near cache failed, reading far layer"),
        }

        let Some(record) = self.far.fetch(code).await? else {
            return Ok(None);
        };

        let ttl = self.promotion_ttl(&record, Timestamp::now());
        match self.near.store(code, &record, Some(ttl)).await {
            Ok(()) => debug!(code = %code, ?ttl, "promoted far hit"),
            Err(e) => warn!(code = %code, error = %e, "could not promote far hit"),
        }
        Ok(Some(record))
    }

    async fn store(
        &self,
        code: &ShortCode,
        record: &UrlRecord,
        ttl: Option<Duration>,
    ) -> Result<()> {
        self.far.store(code, record, ttl).await?;
        self.near.store(code, record, ttl).await
    }

    async fn evict(&self, code: &ShortCode) -> Result<()> {
        let near = self.near.evict(code).await;
        let far = self.far.evict(code).await;
        if near.is_err() || far.is_err() {
            debug!(code = %code, near_ok = near.is_ok(), far_ok = far.is_ok(), "partial evict");
        }
        near.and(far)
    }
}
