use crate::error::StorageError;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub type Result<T> = std::result::Result<T, StorageError>;

/// What a short code points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    pub original_url: String,
    /// `None` keeps the mapping until it is deleted.
    pub expire_at: Option<Timestamp>,
}

impl UrlRecord {
    pub fn new(original_url: impl Into<String>, expire_at: Option<Timestamp>) -> Self {
        Self {
            original_url: original_url.into(),
            expire_at,
        }
    }

    /// An expired record behaves as deleted even while it is still stored.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expire_at.is_some_and(|expire_at| now >= expire_at)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Timestamp::now())
    }

    /// `None` if the record never expires, zero once it has.
    pub fn remaining_at(&self, now: Timestamp) -> Option<Duration> {
        self.expire_at.map(|expire_at| {
            Duration::try_from(expire_at.duration_since(now)).unwrap_or(Duration::ZERO)
        })
    }
}

/// Source of truth for mappings.
///
/// [`insert`](Self::insert) never overwrites: a code that is already stored,
/// expired or not, yields [`StorageError::Conflict`]. Reads hand back expired
/// records untouched; deciding what expiry means is the resolver's job.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    async fn insert(&self, code: &ShortCode, record: UrlRecord) -> Result<()>;

    async fn get(&self, code: &ShortCode) -> Result<Option<UrlRecord>>;

    /// `false` if there was nothing to delete.
    async fn delete(&self, code: &ShortCode) -> Result<bool>;

    /// Removes `code` only while its stored record is expired at `now`.
    async fn delete_expired(&self, code: &ShortCode, now: Timestamp) -> Result<bool>;

    /// Bulk form of [`delete_expired`](Self::delete_expired); returns the
    /// number of rows removed.
    async fn purge_expired(&self, now: Timestamp) -> Result<u64>;
}
