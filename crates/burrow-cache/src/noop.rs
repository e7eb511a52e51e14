use async_trait::async_trait;
use burrow_core::cache::{Result, UrlCache};
use burrow_core::{ShortCode, UrlRecord};
use std::time::Duration;

/// Stand-in used when caching is turned off: every fetch misses and every
/// write is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

#[async_trait]
impl UrlCache for NoopCache {
    async fn fetch(&self, _code: &ShortCode) -> Result<Option<UrlRecord>> {
        Ok(None)
    }

    async fn store(
        &self,
        _code: &ShortCode,
        _record: &UrlRecord,
        _ttl: Option<Duration>,
    ) -> Result<()> {
        Ok(())
    }

    async fn evict(&self, _code: &ShortCode) -> Result<()> {
        Ok(())
    }
}
