use crate::error::{Result, ServiceError};
use crate::resolver::{Resolver, ShortenParams};
use async_trait::async_trait;
use burrow_core::{ShortCode, UrlRecord};
use burrow_limiter::TokenBucket;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// One token per admitted operation, taken from a shared bucket.
///
/// Without a timeout a caller waits as long as it takes; with one, a caller
/// that cannot be admitted in time fails with
/// [`ServiceError::AdmissionCancelled`].
#[derive(Debug, Clone)]
pub struct Admission {
    bucket: Arc<TokenBucket>,
    timeout: Option<Duration>,
}

impl Admission {
    pub fn new(bucket: Arc<TokenBucket>) -> Self {
        Self {
            bucket,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn bucket(&self) -> &Arc<TokenBucket> {
        &self.bucket
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub async fn admit(&self) -> Result<()> {
        let admitted = match self.timeout {
            Some(timeout) => self.bucket.acquire(tokio::time::sleep(timeout)).await,
            None => self.bucket.acquire(std::future::pending()).await,
        };

        admitted.map_err(|e| {
            debug!(error = %e, "Request not admitted");
            ServiceError::AdmissionCancelled
        })
    }
}

/// Admission gate in front of a [`Resolver`].
///
/// Every operation is admitted before it reaches the inner resolver, so
/// rejected input still costs a token. Transports that parse requests
/// themselves should admit with a shared [`Admission`] before parsing and
/// call the inner resolver directly.
#[derive(Debug, Clone)]
pub struct Throttled<S> {
    inner: S,
    admission: Admission,
}

impl<S> Throttled<S> {
    pub fn new(inner: S, bucket: Arc<TokenBucket>) -> Self {
        Self::with_admission(inner, Admission::new(bucket))
    }

    pub fn with_admission(inner: S, admission: Admission) -> Self {
        Self { inner, admission }
    }

    pub fn with_admission_timeout(mut self, timeout: Duration) -> Self {
        self.admission = self.admission.with_timeout(timeout);
        self
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn bucket(&self) -> &Arc<TokenBucket> {
        self.admission.bucket()
    }

    async fn admit(&self) -> Result<()> {
        self.admission.admit().await
    }
}

#[async_trait]
impl<S: Resolver> Resolver for Throttled<S> {
    async fn shorten(&self, params: ShortenParams) -> Result<ShortCode> {
        self.admit().await?;
        self.inner.shorten(params).await
    }

    async fn resolve(&self, code: &ShortCode) -> Result<UrlRecord> {
        self.admit().await?;
        self.inner.resolve(code).await
    }

    async fn delete(&self, code: &ShortCode) -> Result<()> {
        self.admit().await?;
        self.inner.delete(code).await
    }
}
