//! Vocabulary shared by every Burrow crate.
//!
//! [`ShortCode`] and [`UrlRecord`] are the data; [`Repository`] (durable,
//! authoritative) and [`UrlCache`] (fast, allowed to fail) are the two
//! storage seams the resolver is written against.

pub mod base58;
pub mod cache;
pub mod error;
pub mod repository;
pub mod shortcode;

pub use base58::Base58Code;
pub use cache::UrlCache;
pub use error::{CacheError, CoreError, StorageError};
pub use repository::{Repository, UrlRecord};
pub use shortcode::ShortCode;
