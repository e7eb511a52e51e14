use thiserror::Error;

/// Errors returned by the token bucket.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    #[error("invalid limiter settings: rate={rate}, burst={burst}")]
    InvalidSettings { rate: f64, burst: u32 },
    #[error("admission cancelled before a token became available")]
    Cancelled,
}
