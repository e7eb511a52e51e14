//! Token-bucket admission control.

mod bucket;
pub mod error;

pub use bucket::{TokenBucket, TokenBucketSettings};
pub use error::Error;
