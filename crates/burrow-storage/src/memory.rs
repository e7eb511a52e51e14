use async_trait::async_trait;
use burrow_core::repository::{Repository, Result, UrlRecord};
use burrow_core::{ShortCode, StorageError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jiff::Timestamp;
use tracing::debug;

/// Process-local [`Repository`] on a sharded [`DashMap`].
///
/// Every check-then-act (insert if vacant, delete if expired) runs under the
/// shard lock of the key involved, so concurrent callers see each operation
/// as atomic.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    entries: DashMap<ShortCode, UrlRecord>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts expired records that have not been purged yet.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn insert(&self, code: &ShortCode, record: UrlRecord) -> Result<()> {
        let Entry::Vacant(slot) = self.entries.entry(code.clone()) else {
            return Err(StorageError::Conflict(code.to_string()));
        };
        slot.insert(record);
        Ok(())
    }

    async fn get(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        Ok(self.entries.get(code).map(|found| found.value().clone()))
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool> {
        Ok(self.entries.remove(code).is_some())
    }

    async fn delete_expired(&self, code: &ShortCode, now: Timestamp) -> Result<bool> {
        let removed = self
            .entries
            .remove_if(code, |_, record| record.is_expired_at(now));
        Ok(removed.is_some())
    }

    async fn purge_expired(&self, now: Timestamp) -> Result<u64> {
        let mut purged = 0u64;
        self.entries.retain(|_, record| {
            let expired = record.is_expired_at(now);
            purged += u64::from(expired);
            !expired
        });

        debug!(purged, remaining = self.entries.len(), "memory purge");
        Ok(purged)
    }
}
