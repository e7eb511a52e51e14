use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

/// Rejections raised while parsing core value types from untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("short code must be {min}-{max} characters long, got {len}")]
    ShortCodeLength { len: usize, min: usize, max: usize },
    #[error("short code contains {found:?} at position {position}")]
    ShortCodeCharacter { found: char, position: usize },
}

/// What a [`UrlCache`](crate::UrlCache) backend can report. The resolver
/// never surfaces these to callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("cache unreachable: {0}")]
    Unavailable(String),
    #[error("cache call timed out: {0}")]
    Timeout(String),
    #[error("cannot encode cache entry: {0}")]
    Serialization(String),
    #[error("corrupt cache entry: {0}")]
    InvalidData(String),
    #[error("cache call failed: {0}")]
    Operation(String),
}

/// What a [`Repository`](crate::Repository) backend can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Uniqueness of the short code was violated.
    #[error("short code {0} is taken")]
    Conflict(String),
    #[error("store unreachable: {0}")]
    Unavailable(String),
    #[error("store call timed out: {0}")]
    Timeout(String),
    #[error("store query failed: {0}")]
    Query(String),
    #[error("corrupt stored row: {0}")]
    InvalidData(String),
}
