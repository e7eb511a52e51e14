use crate::error::CacheError;
use crate::repository::UrlRecord;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, CacheError>;

/// Fast, lossy lookup in front of the [`Repository`](crate::Repository).
///
/// A cache may forget anything at any time, and every call may fail. The
/// resolver treats a failure exactly like a miss, so implementations should
/// report errors rather than hide them.
#[async_trait]
pub trait UrlCache: Send + Sync + 'static {
    /// `Ok(None)` on a miss.
    async fn fetch(&self, code: &ShortCode) -> Result<Option<UrlRecord>>;

    /// Inserts or replaces the entry for `code`.
    ///
    /// With `ttl` set the entry must not be served after it elapses. With
    /// `None` the backend's own retention applies.
    async fn store(&self, code: &ShortCode, record: &UrlRecord, ttl: Option<Duration>)
        -> Result<()>;

    /// Drops the entry for `code`. Evicting a missing entry succeeds.
    async fn evict(&self, code: &ShortCode) -> Result<()>;
}
