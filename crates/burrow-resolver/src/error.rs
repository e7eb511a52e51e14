use burrow_core::StorageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors surfaced by a [`Resolver`](crate::Resolver).
///
/// Cache failures never show up here; they are logged and treated as misses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("short code not found: {0}")]
    NotFound(String),
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StorageError),
    #[error("no free short code after {attempts} attempts")]
    IdSpaceExhausted { attempts: u32 },
    #[error("admission cancelled")]
    AdmissionCancelled,
}
