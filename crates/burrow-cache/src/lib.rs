//! Cache backends for the resolver.
//!
//! Pick [`NoopCache`] to run against the store alone, [`MokaUrlCache`] for a
//! single node, [`RedisUrlCache`] to share entries between nodes, or stack
//! two of them with [`LayeredCache`].

pub mod layered;
pub mod moka;
pub mod noop;
pub mod redis;

pub use burrow_core::cache::{Result, UrlCache};
pub use burrow_core::CacheError;
pub use self::layered::LayeredCache;
pub use self::moka::{MokaSettings, MokaUrlCache};
pub use self::noop::NoopCache;
pub use self::redis::RedisUrlCache;
