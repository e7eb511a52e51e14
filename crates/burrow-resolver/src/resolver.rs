use crate::error::Result;
use async_trait::async_trait;
use burrow_core::{ShortCode, UrlRecord};
use jiff::Timestamp;

/// Parameters for creating a short URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortenParams {
    /// The URL to shorten. Must be an absolute `http` or `https` URL.
    pub original_url: String,
    /// When the mapping stops resolving. `None` means never.
    pub expire_at: Option<Timestamp>,
}

impl ShortenParams {
    pub fn new(original_url: impl Into<String>, expire_at: Option<Timestamp>) -> Self {
        Self {
            original_url: original_url.into(),
            expire_at,
        }
    }
}

#[async_trait]
pub trait Resolver: Send + Sync + 'static {
    /// Stores a new mapping and returns its freshly generated short code.
    async fn shorten(&self, params: ShortenParams) -> Result<ShortCode>;

    /// Returns the live record for `code`.
    /// Missing and expired mappings are both `NotFound`.
    async fn resolve(&self, code: &ShortCode) -> Result<UrlRecord>;

    /// Removes the mapping for `code`. Unknown codes are `NotFound`.
    async fn delete(&self, code: &ShortCode) -> Result<()>;
}

#[async_trait]
impl<T: Resolver + ?Sized> Resolver for std::sync::Arc<T> {
    async fn shorten(&self, params: ShortenParams) -> Result<ShortCode> {
        (**self).shorten(params).await
    }

    async fn resolve(&self, code: &ShortCode) -> Result<UrlRecord> {
        (**self).resolve(code).await
    }

    async fn delete(&self, code: &ShortCode) -> Result<()> {
        (**self).delete(code).await
    }
}
