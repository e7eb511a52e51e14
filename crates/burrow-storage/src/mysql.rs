use async_trait::async_trait;
use burrow_core::repository::{Repository, Result, UrlRecord};
use burrow_core::{ShortCode, StorageError};
use jiff::Timestamp;
use sqlx::mysql::{MySqlPoolOptions, MySqlQueryResult};
use sqlx::{FromRow, MySqlPool};
use std::time::Duration;
use tracing::{debug, trace};

/// `CREATE TABLE IF NOT EXISTS` for the `short_urls` table.
pub const SCHEMA: &str = include_str!("../ddl/mysql/short_urls.sql");

/// Production [`Repository`] on a single `short_urls` table.
///
/// Timestamps are stored as Unix seconds. Expirations are rounded up to the
/// next whole second, so a record may outlive its `expire_at` by under a
/// second but never expires early. `short_code` is the primary key; uniqueness, including
/// for expired rows that have not been purged, comes from that constraint.
#[derive(Debug, Clone)]
pub struct MySqlRepository {
    pool: MySqlPool,
}

#[derive(Debug, FromRow)]
struct UrlRow {
    original_url: String,
    expire_at: Option<i64>,
}

impl TryFrom<UrlRow> for UrlRecord {
    type Error = StorageError;

    fn try_from(row: UrlRow) -> Result<Self> {
        let expire_at = match row.expire_at {
            Some(secs) => Some(Timestamp::from_second(secs).map_err(|e| {
                StorageError::InvalidData(format!("expire_at {secs} out of range: {e}"))
            })?),
            None => None,
        };
        Ok(UrlRecord::new(row.original_url, expire_at))
    }
}

impl MySqlRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Opens a pool on `database_url`. Queries that wait longer than
    /// `acquire_timeout` for a connection fail with
    /// [`StorageError::Timeout`].
    pub async fn connect(database_url: &str, acquire_timeout: Duration) -> Result<Self> {
        MySqlPoolOptions::new()
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await
            .map(Self::new)
            .map_err(storage_error)
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        self.run(sqlx::query(SCHEMA)).await.map(drop)
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    async fn run<'q>(
        &self,
        query: sqlx::query::Query<'q, sqlx::MySql, sqlx::mysql::MySqlArguments>,
    ) -> Result<MySqlQueryResult> {
        query.execute(&self.pool).await.map_err(storage_error)
    }
}

/// `expire_at` as a column value, rounded up to a whole second.
fn expire_second(expire_at: Timestamp) -> i64 {
    let secs = expire_at.as_second();
    if expire_at.subsec_nanosecond() > 0 {
        secs + 1
    } else {
        secs
    }
}

fn storage_error(err: sqlx::Error) -> StorageError {
    use sqlx::Error as E;

    let message = err.to_string();
    match err {
        E::PoolTimedOut => StorageError::Timeout(message),
        E::PoolClosed | E::WorkerCrashed | E::Io(_) | E::Tls(_) => {
            StorageError::Unavailable(message)
        }
        E::ColumnDecode { .. } | E::ColumnNotFound(_) | E::Decode(_) | E::TypeNotFound { .. } => {
            StorageError::InvalidData(message)
        }
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl Repository for MySqlRepository {
    async fn insert(&self, code: &ShortCode, record: UrlRecord) -> Result<()> {
        let inserted = sqlx::query(
            "INSERT INTO short_urls (short_code, original_url, expire_at, created_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(code.as_str())
        .bind(record.original_url)
        .bind(record.expire_at.map(expire_second))
        .bind(Timestamp::now().as_second())
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                trace!(code = %code, "primary key collision");
                Err(StorageError::Conflict(code.to_string()))
            }
            Err(e) => Err(storage_error(e)),
        }
    }

    async fn get(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        sqlx::query_as::<_, UrlRow>(
            "SELECT original_url, expire_at FROM short_urls WHERE short_code = ?",
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?
        .map(UrlRecord::try_from)
        .transpose()
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool> {
        let done = self
            .run(sqlx::query("DELETE FROM short_urls WHERE short_code = ?").bind(code.as_str()))
            .await?;
        Ok(done.rows_affected() == 1)
    }

    async fn delete_expired(&self, code: &ShortCode, now: Timestamp) -> Result<bool> {
        let done = self
            .run(
                sqlx::query(
                    "DELETE FROM short_urls \
                     WHERE short_code = ? AND expire_at IS NOT NULL AND expire_at <= ?",
                )
                .bind(code.as_str())
                .bind(now.as_second()),
            )
            .await?;
        Ok(done.rows_affected() == 1)
    }

    async fn purge_expired(&self, now: Timestamp) -> Result<u64> {
        let done = self
            .run(
                sqlx::query("DELETE FROM short_urls WHERE expire_at IS NOT NULL AND expire_at <= ?")
                    .bind(now.as_second()),
            )
            .await?;

        let purged = done.rows_affected();
        debug!(purged, "mysql purge");
        Ok(purged)
    }
}
