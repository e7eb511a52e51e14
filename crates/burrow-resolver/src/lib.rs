//! The URL resolution core: shorten, resolve and delete on top of a durable
//! [`Repository`](burrow_core::Repository) and a best-effort
//! [`UrlCache`](burrow_core::UrlCache).
//!
//! [`ResolverService`] implements the cache-aside read path and lazy
//! expiration, [`Throttled`] puts a token bucket in front of any
//! [`Resolver`], and [`Sweeper`] optionally purges expired records in the
//! background.

pub mod error;
pub mod resolver;
pub mod service;
pub mod sweeper;
pub mod throttled;

pub use error::{Result, ServiceError};
pub use resolver::{Resolver, ShortenParams};
pub use service::{ResolverService, ResolverSettings, MAX_URL_LENGTH};
pub use sweeper::Sweeper;
pub use throttled::{Admission, Throttled};
