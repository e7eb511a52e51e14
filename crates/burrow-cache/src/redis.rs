use async_trait::async_trait;
use burrow_core::cache::{Result, UrlCache};
use burrow_core::{CacheError, ShortCode, UrlRecord};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, RedisError};
use std::fmt;
use std::time::Duration;
use tracing::trace;

/// Shared cache for deployments with more than one node.
///
/// Records are stored as JSON under `{namespace}{code}`. Expiry is delegated
/// to Redis via `SET ... EX`.
#[derive(Clone)]
pub struct RedisUrlCache {
    conn: MultiplexedConnection,
    namespace: String,
}

impl RedisUrlCache {
    pub const DEFAULT_NAMESPACE: &'static str = "burrow:url:";

    pub fn new(conn: MultiplexedConnection) -> Self {
        Self::namespaced(conn, Self::DEFAULT_NAMESPACE)
    }

    pub fn namespaced(conn: MultiplexedConnection, namespace: impl Into<String>) -> Self {
        Self {
            conn,
            namespace: namespace.into(),
        }
    }

    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(|e| classify("open client", e))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| classify("connect", e))?;
        Ok(Self::new(conn))
    }

    fn key(&self, code: &ShortCode) -> String {
        let mut key = String::with_capacity(self.namespace.len() + code.as_str().len());
        key.push_str(&self.namespace);
        key.push_str(code.as_str());
        key
    }
}

impl fmt::Debug for RedisUrlCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisUrlCache")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

fn classify(op: &str, err: RedisError) -> CacheError {
    let message = format!("{op}: {err}");
    if err.is_timeout() {
        CacheError::Timeout(message)
    } else if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
        CacheError::Unavailable(message)
    } else {
        CacheError::Operation(message)
    }
}

/// `EX` takes whole seconds. Rounds up, never below one, so a short TTL
/// cannot turn into an immediate drop.
fn expire_seconds(ttl: Duration) -> u64 {
    let whole = ttl.as_secs();
    let seconds = if ttl.subsec_nanos() == 0 { whole } else { whole + 1 };
    seconds.max(1)
}

#[async_trait]
impl UrlCache for RedisUrlCache {
    async fn fetch(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        let key = self.key(code);
        let mut conn = self.conn.clone();

        let raw: Option<String> = conn.get(&key).await.map_err(|e| classify("GET", e))?;
        trace!(code = %code, hit = raw.is_some(), "redis fetch");

        raw.map(|json| {
            serde_json::from_str(&json).map_err(|e| CacheError::InvalidData(format!("{key}: {e}")))
        })
        .transpose()
    }

    async fn store(
        &self,
        code: &ShortCode,
        record: &UrlRecord,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let json =
            serde_json::to_string(record).map_err(|e| CacheError::Serialization(e.to_string()))?;
        let key = self.key(code);
        let mut conn = self.conn.clone();

        match ttl {
            Some(ttl) => conn.set_ex::<_, _, ()>(&key, json, expire_seconds(ttl)).await,
            None => conn.set::<_, _, ()>(&key, json).await,
        }
        .map_err(|e| classify("SET", e))?;

        trace!(code = %code, ?ttl, "redis store");
        Ok(())
    }

    async fn evict(&self, code: &ShortCode) -> Result<()> {
        let mut conn = self.conn.clone();
        let removed: u64 = conn
            .del(self.key(code))
            .await
            .map_err(|e| classify("DEL", e))?;

        trace!(code = %code, removed, "redis evict");
        Ok(())
    }
}
